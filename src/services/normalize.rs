// src/services/normalize.rs
//! Raw API record -> (Security, Auction, BidderDetail) mapping.
//!
//! Pure: no clock, no I/O. Unparsable or missing numbers become `None`, never 0.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::TransformError;
use crate::models::{Auction, BidderDetail, RawAuction, Security};

/// Upper policy bound for a plausible bid-to-cover ratio.
pub const MAX_BID_TO_COVER: f64 = 10.0;
pub const MIN_PRICE_PER_100: f64 = 0.0;
pub const MAX_PRICE_PER_100: f64 = 200.0;

const STANDARD_WEEKS: [u32; 7] = [4, 6, 8, 13, 17, 26, 52];
const STANDARD_YEARS: [u32; 7] = [2, 3, 5, 7, 10, 20, 30];

/// A value written as-is but outside its declared bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationWarning {
    BidToCoverRatio(f64),
    PricePer100(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAuction {
    pub security: Security,
    pub auction: Auction,
    pub bidder_detail: Option<BidderDetail>,
    pub warnings: Vec<ValidationWarning>,
}

impl NormalizedAuction {
    pub fn has_bound_violation(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub fn normalize(raw: &RawAuction) -> Result<NormalizedAuction, TransformError> {
    let cusip = text(&raw.cusip).ok_or(TransformError::MissingCusip)?;

    let auction_date = match text(&raw.auction_date) {
        None => return Err(TransformError::MissingAuctionDate { cusip }),
        Some(value) => parse_date(Some(value.as_str())).ok_or(TransformError::InvalidAuctionDate {
            cusip: cusip.clone(),
            value,
        })?,
    };

    let issue_date = parse_date(raw.issue_date.as_deref());
    let maturity_date = parse_date(raw.maturity_date.as_deref());
    let interest_rate = parse_number(raw.interest_rate.as_deref());
    let security_term = text(&raw.security_term);

    let security = Security {
        cusip: cusip.clone(),
        security_type: text(&raw.security_type),
        standardized_term: security_term.as_deref().and_then(standardize_term),
        security_term,
        series: text(&raw.series),
        tips: parse_flag(raw.tips.as_deref()),
        floating_rate: parse_flag(raw.floating_rate.as_deref()),
        callable: parse_flag(raw.callable.as_deref()),
        issue_date,
        maturity_date,
        interest_rate,
    };

    let total_tendered = parse_number(raw.total_tendered.as_deref());
    let total_accepted = parse_number(raw.total_accepted.as_deref());
    let bid_to_cover_ratio = parse_number(raw.bid_to_cover_ratio.as_deref())
        .or_else(|| derive_bid_to_cover(total_tendered, total_accepted));

    let auction = Auction {
        cusip,
        auction_date,
        announcement_date: parse_date(raw.announcement_date.as_deref()),
        issue_date,
        maturity_date,
        auction_format: text(&raw.auction_format),
        offering_amount: parse_number(raw.offering_amount.as_deref()),
        total_tendered,
        total_accepted,
        bid_to_cover_ratio,
        high_yield: parse_number(raw.high_yield.as_deref()),
        low_yield: parse_number(raw.low_yield.as_deref()),
        average_median_yield: parse_number(raw.average_median_yield.as_deref()),
        high_price: parse_number(raw.high_price.as_deref()),
        low_price: parse_number(raw.low_price.as_deref()),
        price_per_100: parse_number(raw.price_per100.as_deref()),
        interest_rate,
    };

    let bidder_detail = bidder_detail(raw, total_accepted);
    let warnings = bound_warnings(&auction);

    Ok(NormalizedAuction {
        security,
        auction,
        bidder_detail,
        warnings,
    })
}

fn bound_warnings(auction: &Auction) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    if let Some(ratio) = auction.bid_to_cover_ratio {
        if ratio <= 0.0 || ratio > MAX_BID_TO_COVER {
            warnings.push(ValidationWarning::BidToCoverRatio(ratio));
        }
    }
    if let Some(price) = auction.price_per_100 {
        if !(MIN_PRICE_PER_100..=MAX_PRICE_PER_100).contains(&price) {
            warnings.push(ValidationWarning::PricePer100(price));
        }
    }
    warnings
}

fn derive_bid_to_cover(tendered: Option<f64>, accepted: Option<f64>) -> Option<f64> {
    match (tendered, accepted) {
        (Some(tendered), Some(accepted)) if accepted > 0.0 => Some(tendered / accepted),
        _ => None,
    }
}

fn bidder_detail(raw: &RawAuction, total_accepted: Option<f64>) -> Option<BidderDetail> {
    let total = total_accepted.filter(|t| *t > 0.0)?;
    let share = |amount: Option<f64>| amount.map(|a| a / total * 100.0);

    let primary = parse_number(raw.primary_dealer_accepted.as_deref());
    let direct = parse_number(raw.direct_bidder_accepted.as_deref());
    let indirect = parse_number(raw.indirect_bidder_accepted.as_deref());
    let fima = parse_number(raw.fima_noncompetitive_accepted.as_deref());
    let soma = parse_number(raw.soma_accepted.as_deref());

    Some(BidderDetail {
        primary_dealer_accepted: primary,
        primary_dealer_percentage: share(primary),
        direct_bidder_accepted: direct,
        direct_bidder_percentage: share(direct),
        indirect_bidder_accepted: indirect,
        indirect_bidder_percentage: share(indirect),
        fima_accepted: fima,
        fima_percentage: share(fima),
        soma_accepted: soma,
        soma_percentage: share(soma),
    })
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn parse_number(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub(crate) fn parse_flag(value: Option<&str>) -> Option<bool> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    Some(matches!(
        value.to_ascii_lowercase().as_str(),
        "yes" | "true" | "1"
    ))
}

fn term_regex() -> &'static Regex {
    static TERM: OnceLock<Regex> = OnceLock::new();
    TERM.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*-?\s*(day|week|month|year)").expect("term pattern is valid")
    })
}

/// Buckets an issued term ("29-Year 10-Month") into its standard tenor ("30Y").
pub fn standardize_term(term: &str) -> Option<String> {
    let mut days = 0u32;
    let mut weeks = 0u32;
    let mut months = 0u32;
    let mut years = 0u32;
    let mut matched = false;

    for caps in term_regex().captures_iter(term) {
        let amount: u32 = caps[1].parse().ok()?;
        matched = true;
        let slot = match caps[2].to_ascii_lowercase().as_str() {
            "day" => &mut days,
            "week" => &mut weeks,
            "month" => &mut months,
            _ => &mut years,
        };
        *slot = slot.checked_add(amount)?;
    }
    if !matched {
        return None;
    }

    if years == 0 && months == 0 {
        let total_days = weeks.checked_mul(7)?.checked_add(days)?.checked_add(3)?;
        let total_weeks = total_days / 7;
        let bucket = nearest(&STANDARD_WEEKS, total_weeks.max(1));
        return Some(format!("{}W", bucket));
    }

    let total_months = years.checked_mul(12)?.checked_add(months)?;
    let bucket = STANDARD_YEARS
        .iter()
        .copied()
        .min_by_key(|y| (y * 12).abs_diff(total_months))?;
    Some(format!("{}Y", bucket))
}

fn nearest(buckets: &[u32], value: u32) -> u32 {
    buckets
        .iter()
        .copied()
        .min_by_key(|b| b.abs_diff(value))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawAuction {
        RawAuction {
            cusip: Some("91282CKT7".into()),
            security_type: Some("Note".into()),
            security_term: Some("3-Year".into()),
            tips: Some("No".into()),
            callable: Some("No".into()),
            interest_rate: Some("4.625000".into()),
            auction_date: Some("2024-06-10T00:00:00".into()),
            issue_date: Some("2024-06-17T00:00:00".into()),
            maturity_date: Some("2027-06-15T00:00:00".into()),
            auction_format: Some("Single-Price".into()),
            offering_amount: Some("58000000000".into()),
            total_tendered: Some("148305000000".into()),
            total_accepted: Some("58000000000".into()),
            bid_to_cover_ratio: Some("2.560000".into()),
            high_yield: Some("4.659000".into()),
            price_per100: Some("99.903690".into()),
            primary_dealer_accepted: Some("11600000000".into()),
            direct_bidder_accepted: Some("".into()),
            indirect_bidder_accepted: Some("40600000000".into()),
            soma_accepted: Some("5800000000".into()),
            ..Default::default()
        }
    }

    #[test]
    fn maps_all_three_shapes() {
        let n = normalize(&raw()).unwrap();
        assert_eq!(n.security.cusip, "91282CKT7");
        assert_eq!(n.security.standardized_term.as_deref(), Some("3Y"));
        assert_eq!(n.security.tips, Some(false));
        assert_eq!(n.security.interest_rate, Some(4.625));
        assert_eq!(n.auction.auction_date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(n.auction.bid_to_cover_ratio, Some(2.56));
        assert!(n.warnings.is_empty());

        let detail = n.bidder_detail.unwrap();
        assert_eq!(detail.primary_dealer_percentage, Some(20.0));
        assert_eq!(detail.indirect_bidder_percentage, Some(70.0));
        assert_eq!(detail.direct_bidder_accepted, None);
        assert_eq!(detail.direct_bidder_percentage, None);
        assert_eq!(detail.soma_percentage, Some(10.0));
    }

    #[test]
    fn normalization_is_deterministic() {
        let input = raw();
        assert_eq!(normalize(&input).unwrap(), normalize(&input).unwrap());
    }

    #[test]
    fn missing_numbers_stay_absent() {
        let mut input = raw();
        input.high_yield = Some("".into());
        input.offering_amount = Some("n/a".into());
        let n = normalize(&input).unwrap();
        assert_eq!(n.auction.high_yield, None);
        assert_eq!(n.auction.offering_amount, None);
    }

    #[test]
    fn announced_auction_is_pending_without_bidders() {
        let mut input = raw();
        input.bid_to_cover_ratio = None;
        input.total_tendered = None;
        input.total_accepted = Some("".into());
        let n = normalize(&input).unwrap();
        assert_eq!(n.auction.bid_to_cover_ratio, None);
        assert!(n.bidder_detail.is_none());
    }

    #[test]
    fn bid_to_cover_is_derived_from_totals() {
        let mut input = raw();
        input.bid_to_cover_ratio = None;
        input.total_tendered = Some("150".into());
        input.total_accepted = Some("60".into());
        let n = normalize(&input).unwrap();
        assert_eq!(n.auction.bid_to_cover_ratio, Some(2.5));
    }

    #[test]
    fn out_of_bound_values_are_flagged_not_changed() {
        let mut input = raw();
        input.bid_to_cover_ratio = Some("15".into());
        input.price_per100 = Some("250".into());
        let n = normalize(&input).unwrap();
        assert_eq!(n.auction.bid_to_cover_ratio, Some(15.0));
        assert_eq!(n.auction.price_per_100, Some(250.0));
        assert_eq!(
            n.warnings,
            vec![
                ValidationWarning::BidToCoverRatio(15.0),
                ValidationWarning::PricePer100(250.0)
            ]
        );
    }

    #[test]
    fn records_without_identity_are_rejected() {
        let mut no_cusip = raw();
        no_cusip.cusip = Some("  ".into());
        assert_eq!(normalize(&no_cusip), Err(TransformError::MissingCusip));

        let mut no_date = raw();
        no_date.auction_date = None;
        assert!(matches!(
            normalize(&no_date),
            Err(TransformError::MissingAuctionDate { .. })
        ));

        let mut bad_date = raw();
        bad_date.auction_date = Some("06/10/2024".into());
        assert!(matches!(
            normalize(&bad_date),
            Err(TransformError::InvalidAuctionDate { .. })
        ));
    }

    #[test]
    fn terms_round_to_standard_tenors() {
        assert_eq!(standardize_term("4-Week").as_deref(), Some("4W"));
        assert_eq!(standardize_term("13-Week").as_deref(), Some("13W"));
        assert_eq!(standardize_term("42-Day").as_deref(), Some("6W"));
        assert_eq!(standardize_term("9-Year 10-Month").as_deref(), Some("10Y"));
        assert_eq!(standardize_term("29-Year 10-Month").as_deref(), Some("30Y"));
        assert_eq!(standardize_term("2-Year").as_deref(), Some("2Y"));
        assert_eq!(standardize_term("Bill"), None);
    }

    #[test]
    fn oversized_terms_are_not_standardized() {
        assert_eq!(standardize_term("900000000-Week"), None);
        assert_eq!(standardize_term("400000000-Year"), None);
        assert_eq!(standardize_term("4000000000-Day 4000000000-Day"), None);
        assert_eq!(standardize_term("99999999999-Month"), None);
    }
}
