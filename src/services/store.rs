// src/services/store.rs
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    Auction, AuctionKey, BidderDetail, FiscalArticle, FiscalIndex, RunCounts, RunType, Security,
    TopPhrase, UpdateRecord, UpdateStatus,
};

/// An auction row as persisted, with its surrogate id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAuction {
    pub auction_id: i64,
    pub auction: Auction,
}

/// What an auction upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted(i64),
    Updated(i64),
    Unchanged(i64),
}

impl ApplyOutcome {
    pub fn auction_id(&self) -> i64 {
        match *self {
            ApplyOutcome::Inserted(id) | ApplyOutcome::Updated(id) | ApplyOutcome::Unchanged(id) => id,
        }
    }
}

/// Row counts reported after a fiscal load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiscalTableCounts {
    pub articles: i64,
    pub indices: i64,
    pub phrases: i64,
}

/// Final state of an audit row.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    pub counts: RunCounts,
    pub last_auction_date: Option<NaiveDate>,
    pub error_message: Option<String>,
}

/// Relational operations the ingestion pipeline needs.
///
/// Each call is atomic on its own; batches are applied row by row.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Inserts the security unless its CUSIP already exists. Returns true on insert.
    async fn insert_security_if_absent(&self, security: &Security) -> Result<bool>;

    async fn find_auction(&self, key: &AuctionKey) -> Result<Option<StoredAuction>>;

    /// Inserts the auction, or overlays its present fields onto the row with
    /// the same (cusip, auction_date). Absent incoming fields keep the stored
    /// value. Must stay correct when several writers race on the same key.
    async fn upsert_auction(&self, auction: &Auction) -> Result<ApplyOutcome>;

    /// Inserts or replaces the bidder breakdown of an auction.
    async fn upsert_bidder_detail(&self, auction_id: i64, detail: &BidderDetail) -> Result<()>;

    async fn auction_count(&self) -> Result<i64>;

    /// Greatest stored auction date, if any auction exists.
    async fn latest_auction_date(&self) -> Result<Option<NaiveDate>>;

    /// Appends a `running` audit row and returns its id.
    async fn begin_update(&self, run_type: RunType) -> Result<i64>;

    async fn finish_update(&self, update_id: i64, outcome: &UpdateOutcome) -> Result<()>;

    async fn latest_update(&self) -> Result<Option<UpdateRecord>>;

    /// Inserts or replaces the scores for the index's date.
    async fn upsert_fiscal_index(&self, index: &FiscalIndex) -> Result<()>;

    /// Latest index dated on or before `date`.
    async fn fiscal_index_as_of(&self, date: NaiveDate) -> Result<Option<FiscalIndex>>;

    /// Inserts or replaces an article's classification by `article_id`.
    async fn upsert_fiscal_article(&self, article: &FiscalArticle) -> Result<()>;

    /// Inserts a phrase or replaces its count.
    async fn upsert_top_phrase(&self, phrase: &TopPhrase) -> Result<()>;

    async fn fiscal_table_counts(&self) -> Result<FiscalTableCounts>;
}
