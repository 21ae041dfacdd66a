// src/services/treasury.rs
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::Client;

use crate::config::Settings;
use crate::error::{IngestError, Result};
use crate::models::{RawAuction, SecurityPage};

/// What to ask the auction API for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page_size: usize,
    pub max_records: usize,
}

impl FetchQuery {
    pub fn from_settings(settings: &Settings) -> Self {
        FetchQuery {
            start_date: settings.start_date,
            end_date: settings.end_date,
            page_size: settings.page_size,
            max_records: settings.max_records,
        }
    }
}

/// Client for the TreasuryDirect securities search endpoint.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    api_base: String,
}

impl FetchClient {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("treasury-auction-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(FetchClient {
            client,
            api_base: api_base.into(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Starts a fresh walk over the result pages. Calling this again restarts
    /// from the first page.
    pub fn pages(&self, query: &FetchQuery) -> AuctionPager<'_> {
        AuctionPager {
            client: self,
            query: query.clone(),
            page_num: 0,
            collected: 0,
            done: query.max_records == 0,
        }
    }

    /// Walks every page and returns the concatenated records.
    pub async fn fetch_all(&self, query: &FetchQuery) -> Result<Vec<RawAuction>> {
        info!("Fetching auction data from {}", self.api_base);
        let mut pager = self.pages(query);
        let mut records = Vec::new();
        while let Some(page) = pager.next_page().await? {
            records.extend(page);
            info!("Fetched page {}: {} total records", pager.page_num, records.len());
        }
        Ok(records)
    }

    async fn fetch_page(&self, query: &FetchQuery, page_num: usize) -> Result<SecurityPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("format", "json".to_string()),
            ("pagesize", query.page_size.to_string()),
            ("pagenum", page_num.to_string()),
            ("recordstartindex", (page_num * query.page_size).to_string()),
            ("recordendindex", ((page_num + 1) * query.page_size).to_string()),
        ];
        if query.start_date.is_some() || query.end_date.is_some() {
            params.push(("dateFieldName", "auctionDate".to_string()));
        }
        if let Some(start) = query.start_date {
            params.push(("startDate", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = query.end_date {
            params.push(("endDate", end.format("%Y-%m-%d").to_string()));
        }

        debug!("Requesting page {} from {}", page_num, self.api_base);
        let body = self
            .client
            .get(&self.api_base)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        serde_json::from_str::<SecurityPage>(&body).map_err(|e| {
            IngestError::Parse(format!("page {} is not a valid securities response: {}", page_num, e))
        })
    }
}

/// Sequential, finite walk over the API's result pages.
///
/// Stops after a short page, after the reported total is reached, or once
/// `max_records` have been yielded (the last page is truncated to the cap).
pub struct AuctionPager<'a> {
    client: &'a FetchClient,
    query: FetchQuery,
    page_num: usize,
    collected: usize,
    done: bool,
}

impl<'a> AuctionPager<'a> {
    pub async fn next_page(&mut self) -> Result<Option<Vec<RawAuction>>> {
        if self.done {
            return Ok(None);
        }

        let page = self.client.fetch_page(&self.query, self.page_num).await?;
        self.page_num += 1;

        let mut records = page.security_list;
        let full_page = records.len() >= self.query.page_size;

        let remaining = self.query.max_records - self.collected;
        if records.len() > remaining {
            records.truncate(remaining);
        }
        self.collected += records.len();

        let total_reached = page
            .total_results_count
            .map_or(false, |total| self.collected as u64 >= total);
        if !full_page || total_reached || self.collected >= self.query.max_records {
            self.done = true;
        }

        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(records))
    }
}
