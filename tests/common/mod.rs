//! In-memory `AuctionStore` mirroring the Postgres store's semantics.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use treasury_auction_ingest::error::{IngestError, Result};
use treasury_auction_ingest::models::{
    Auction, AuctionKey, BidderDetail, FiscalArticle, FiscalIndex, RunCounts, RunType, Security,
    TopPhrase, UpdateRecord, UpdateStatus,
};
use treasury_auction_ingest::services::store::{
    ApplyOutcome, AuctionStore, FiscalTableCounts, StoredAuction, UpdateOutcome,
};

#[derive(Default)]
struct Tables {
    securities: BTreeMap<String, Security>,
    auctions: BTreeMap<i64, Auction>,
    auction_ids: HashMap<AuctionKey, i64>,
    bidder_details: HashMap<i64, BidderDetail>,
    updates: Vec<UpdateRecord>,
    fiscal: BTreeMap<NaiveDate, FiscalIndex>,
    articles: BTreeMap<String, FiscalArticle>,
    phrases: BTreeMap<String, i32>,
    next_auction_id: i64,
    /// Fail the nth auction write (1-based) with a storage error.
    fail_on_auction_write: Option<usize>,
    auction_writes: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on_auction_write(&self, nth: usize) {
        self.tables.lock().unwrap().fail_on_auction_write = Some(nth);
    }

    pub fn auctions(&self) -> Vec<Auction> {
        self.tables.lock().unwrap().auctions.values().cloned().collect()
    }

    pub fn security_count(&self) -> usize {
        self.tables.lock().unwrap().securities.len()
    }

    pub fn has_security(&self, cusip: &str) -> bool {
        self.tables.lock().unwrap().securities.contains_key(cusip)
    }

    pub fn bidder_detail_count(&self) -> usize {
        self.tables.lock().unwrap().bidder_details.len()
    }

    pub fn updates(&self) -> Vec<UpdateRecord> {
        self.tables.lock().unwrap().updates.clone()
    }

    fn record_auction_write(tables: &mut Tables) -> Result<()> {
        tables.auction_writes += 1;
        if tables.fail_on_auction_write == Some(tables.auction_writes) {
            return Err(IngestError::Storage("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn insert_security_if_absent(&self, security: &Security) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        if t.securities.contains_key(&security.cusip) {
            return Ok(false);
        }
        t.securities.insert(security.cusip.clone(), security.clone());
        Ok(true)
    }

    async fn find_auction(&self, key: &AuctionKey) -> Result<Option<StoredAuction>> {
        let t = self.tables.lock().unwrap();
        Ok(t.auction_ids.get(key).map(|id| StoredAuction {
            auction_id: *id,
            auction: t.auctions[id].clone(),
        }))
    }

    async fn upsert_auction(&self, auction: &Auction) -> Result<ApplyOutcome> {
        let mut t = self.tables.lock().unwrap();
        Self::record_auction_write(&mut t)?;
        if !t.securities.contains_key(&auction.cusip) {
            return Err(IngestError::Storage(format!(
                "foreign key violation: no security {}",
                auction.cusip
            )));
        }
        let key = auction.key();
        if let Some(&id) = t.auction_ids.get(&key) {
            let stored = &t.auctions[&id];
            let merged = stored.merged_with(auction);
            if &merged == stored {
                return Ok(ApplyOutcome::Unchanged(id));
            }
            t.auctions.insert(id, merged);
            return Ok(ApplyOutcome::Updated(id));
        }
        t.next_auction_id += 1;
        let id = t.next_auction_id;
        t.auctions.insert(id, auction.clone());
        t.auction_ids.insert(key, id);
        Ok(ApplyOutcome::Inserted(id))
    }

    async fn upsert_bidder_detail(&self, auction_id: i64, detail: &BidderDetail) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        if !t.auctions.contains_key(&auction_id) {
            return Err(IngestError::Storage(format!("no auction {}", auction_id)));
        }
        t.bidder_details.insert(auction_id, detail.clone());
        Ok(())
    }

    async fn auction_count(&self) -> Result<i64> {
        Ok(self.tables.lock().unwrap().auctions.len() as i64)
    }

    async fn latest_auction_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .auctions
            .values()
            .map(|a| a.auction_date)
            .max())
    }

    async fn begin_update(&self, run_type: RunType) -> Result<i64> {
        let mut t = self.tables.lock().unwrap();
        let update_id = t.updates.len() as i64 + 1;
        t.updates.push(UpdateRecord {
            update_id,
            update_timestamp: Utc::now(),
            run_type: Some(run_type.as_str().to_string()),
            counts: RunCounts::default(),
            last_auction_date: None,
            status: UpdateStatus::Running,
            error_message: None,
        });
        Ok(update_id)
    }

    async fn finish_update(&self, update_id: i64, outcome: &UpdateOutcome) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let row = t
            .updates
            .iter_mut()
            .find(|u| u.update_id == update_id)
            .ok_or_else(|| IngestError::Storage(format!("no update {}", update_id)))?;
        row.counts = outcome.counts.clone();
        row.status = outcome.status;
        row.last_auction_date = outcome.last_auction_date;
        row.error_message = outcome.error_message.clone();
        Ok(())
    }

    async fn latest_update(&self) -> Result<Option<UpdateRecord>> {
        Ok(self.tables.lock().unwrap().updates.last().cloned())
    }

    async fn upsert_fiscal_index(&self, index: &FiscalIndex) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .fiscal
            .insert(index.date, index.clone());
        Ok(())
    }

    async fn fiscal_index_as_of(&self, date: NaiveDate) -> Result<Option<FiscalIndex>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .fiscal
            .range(..=date)
            .next_back()
            .map(|(_, index)| index.clone()))
    }

    async fn upsert_fiscal_article(&self, article: &FiscalArticle) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .articles
            .insert(article.article_id.clone(), article.clone());
        Ok(())
    }

    async fn upsert_top_phrase(&self, phrase: &TopPhrase) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .phrases
            .insert(phrase.phrase.clone(), phrase.count);
        Ok(())
    }

    async fn fiscal_table_counts(&self) -> Result<FiscalTableCounts> {
        let t = self.tables.lock().unwrap();
        Ok(FiscalTableCounts {
            articles: t.articles.len() as i64,
            indices: t.fiscal.len() as i64,
            phrases: t.phrases.len() as i64,
        })
    }
}
