// src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One page of the TreasuryDirect securities search response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SecurityPage {
    #[serde(rename = "totalResultsCount", default)]
    pub total_results_count: Option<u64>,
    #[serde(rename = "securityList", default)]
    pub security_list: Vec<RawAuction>,
}

/// An auction exactly as the API reports it. Every value arrives as a string
/// (numbers and booleans are tolerated and stringified); empty means absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cusip: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub security_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub security_term: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub series: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tips: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub floating_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub callable: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub interest_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub announcement_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub auction_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub issue_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub maturity_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub auction_format: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub offering_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_tendered: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_accepted: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bid_to_cover_ratio: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub high_yield: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub low_yield: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub average_median_yield: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub high_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub low_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price_per100: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub primary_dealer_accepted: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub direct_bidder_accepted: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub indirect_bidder_accepted: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fima_noncompetitive_accepted: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub soma_accepted: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar, got {}",
                other
            )))
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Security {
    pub cusip: String,
    pub security_type: Option<String>,
    pub security_term: Option<String>,
    pub standardized_term: Option<String>,
    pub series: Option<String>,
    pub tips: Option<bool>,
    pub floating_rate: Option<bool>,
    pub callable: Option<bool>,
    pub issue_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub interest_rate: Option<f64>,
}

/// Natural key of an auction: one security is auctioned at most once per day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuctionKey {
    pub cusip: String,
    pub auction_date: NaiveDate,
}

impl fmt::Display for AuctionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.cusip, self.auction_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Auction {
    pub cusip: String,
    pub auction_date: NaiveDate,
    pub announcement_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub auction_format: Option<String>,
    pub offering_amount: Option<f64>,
    pub total_tendered: Option<f64>,
    pub total_accepted: Option<f64>,
    pub bid_to_cover_ratio: Option<f64>,
    pub high_yield: Option<f64>,
    pub low_yield: Option<f64>,
    pub average_median_yield: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub price_per_100: Option<f64>,
    pub interest_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Pending,
    Completed,
}

impl Auction {
    pub fn key(&self) -> AuctionKey {
        AuctionKey {
            cusip: self.cusip.clone(),
            auction_date: self.auction_date,
        }
    }

    pub fn status(&self) -> AuctionStatus {
        if self.bid_to_cover_ratio.is_some() {
            AuctionStatus::Completed
        } else {
            AuctionStatus::Pending
        }
    }

    /// Overlays `incoming` on a stored auction. Absent incoming values keep the
    /// stored ones, so populated results never revert to absent.
    pub fn merged_with(&self, incoming: &Auction) -> Auction {
        fn pick<T: Clone>(stored: &Option<T>, incoming: &Option<T>) -> Option<T> {
            incoming.clone().or_else(|| stored.clone())
        }

        Auction {
            cusip: self.cusip.clone(),
            auction_date: self.auction_date,
            announcement_date: pick(&self.announcement_date, &incoming.announcement_date),
            issue_date: pick(&self.issue_date, &incoming.issue_date),
            maturity_date: pick(&self.maturity_date, &incoming.maturity_date),
            auction_format: pick(&self.auction_format, &incoming.auction_format),
            offering_amount: pick(&self.offering_amount, &incoming.offering_amount),
            total_tendered: pick(&self.total_tendered, &incoming.total_tendered),
            total_accepted: pick(&self.total_accepted, &incoming.total_accepted),
            bid_to_cover_ratio: pick(&self.bid_to_cover_ratio, &incoming.bid_to_cover_ratio),
            high_yield: pick(&self.high_yield, &incoming.high_yield),
            low_yield: pick(&self.low_yield, &incoming.low_yield),
            average_median_yield: pick(&self.average_median_yield, &incoming.average_median_yield),
            high_price: pick(&self.high_price, &incoming.high_price),
            low_price: pick(&self.low_price, &incoming.low_price),
            price_per_100: pick(&self.price_per_100, &incoming.price_per_100),
            interest_rate: pick(&self.interest_rate, &incoming.interest_rate),
        }
    }
}

/// Share of the accepted amount taken by each bidder category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BidderDetail {
    pub primary_dealer_accepted: Option<f64>,
    pub primary_dealer_percentage: Option<f64>,
    pub direct_bidder_accepted: Option<f64>,
    pub direct_bidder_percentage: Option<f64>,
    pub indirect_bidder_accepted: Option<f64>,
    pub indirect_bidder_percentage: Option<f64>,
    pub fima_accepted: Option<f64>,
    pub fima_percentage: Option<f64>,
    pub soma_accepted: Option<f64>,
    pub soma_percentage: Option<f64>,
}

/// Daily fiscal-sentiment scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalIndex {
    pub date: NaiveDate,
    pub total_articles: Option<i32>,
    pub fiscal_articles: Option<i32>,
    pub tariff_fiscal_articles: Option<i32>,
    pub non_tariff_fiscal_articles: Option<i32>,
    pub rate: Option<f64>,
    pub tariff_rate: Option<f64>,
    pub non_tariff_rate: Option<f64>,
    pub fiscal_policy_index: Option<f64>,
    pub tariff_fiscal_index: Option<f64>,
    pub non_tariff_fiscal_index: Option<f64>,
}

/// Classification of one news article feeding the daily scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalArticle {
    pub article_id: String,
    pub date: NaiveDate,
    pub is_fiscal_article: bool,
    pub has_tariff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPhrase {
    pub phrase: String,
    pub count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Running,
    Success,
    Failed,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Running => "running",
            UpdateStatus::Success => "success",
            UpdateStatus::Failed => "failed",
        }
    }
}

impl FromStr for UpdateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Ok(UpdateStatus::Running),
            "success" => Ok(UpdateStatus::Success),
            "failed" => Ok(UpdateStatus::Failed),
            other => Err(format!("unknown update status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Initial,
    Scheduled,
    Manual,
}

impl RunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::Initial => "initial",
            RunType::Scheduled => "scheduled",
            RunType::Manual => "manual",
        }
    }
}

/// Counters for one ingestion run, as written to `data_updates`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub records_fetched: i64,
    pub records_inserted: i64,
    pub records_updated: i64,
    pub records_unchanged: i64,
    pub bound_violations: i64,
    pub records_rejected: i64,
}

/// One row of the `data_updates` audit log.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRecord {
    pub update_id: i64,
    pub update_timestamp: DateTime<Utc>,
    pub run_type: Option<String>,
    #[serde(flatten)]
    pub counts: RunCounts,
    pub last_auction_date: Option<NaiveDate>,
    pub status: UpdateStatus,
    pub error_message: Option<String>,
}
