// src/services/db.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::error::{IngestError, Result};
use crate::models::{
    Auction, AuctionKey, BidderDetail, FiscalArticle, FiscalIndex, RunCounts, RunType, Security,
    TopPhrase, UpdateRecord, UpdateStatus,
};
use crate::services::store::{
    ApplyOutcome, AuctionStore, FiscalTableCounts, StoredAuction, UpdateOutcome,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS securities (
        cusip             TEXT PRIMARY KEY,
        security_type     TEXT,
        security_term     TEXT,
        standardized_term TEXT,
        series            TEXT,
        tips              BOOLEAN,
        floating_rate     BOOLEAN,
        callable          BOOLEAN,
        interest_rate     DOUBLE PRECISION,
        issue_date        DATE,
        maturity_date     DATE,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auctions (
        auction_id           BIGSERIAL PRIMARY KEY,
        cusip                TEXT NOT NULL REFERENCES securities (cusip),
        auction_date         DATE NOT NULL,
        announcement_date    DATE,
        issue_date           DATE,
        maturity_date        DATE,
        auction_format       TEXT,
        offering_amount      DOUBLE PRECISION,
        total_tendered       DOUBLE PRECISION,
        total_accepted       DOUBLE PRECISION,
        bid_to_cover_ratio   DOUBLE PRECISION,
        high_yield           DOUBLE PRECISION,
        low_yield            DOUBLE PRECISION,
        average_median_yield DOUBLE PRECISION,
        high_price           DOUBLE PRECISION,
        low_price            DOUBLE PRECISION,
        price_per_100        DOUBLE PRECISION,
        interest_rate        DOUBLE PRECISION,
        created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT unique_auction UNIQUE (cusip, auction_date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_auction_date ON auctions (auction_date)",
    r#"
    CREATE TABLE IF NOT EXISTS bidder_details (
        detail_id                  BIGSERIAL PRIMARY KEY,
        auction_id                 BIGINT NOT NULL UNIQUE REFERENCES auctions (auction_id),
        primary_dealer_accepted    DOUBLE PRECISION,
        primary_dealer_percentage  DOUBLE PRECISION,
        direct_bidder_accepted     DOUBLE PRECISION,
        direct_bidder_percentage   DOUBLE PRECISION,
        indirect_bidder_accepted   DOUBLE PRECISION,
        indirect_bidder_percentage DOUBLE PRECISION,
        fima_accepted              DOUBLE PRECISION,
        fima_percentage            DOUBLE PRECISION,
        soma_accepted              DOUBLE PRECISION,
        soma_percentage            DOUBLE PRECISION,
        updated_at                 TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS data_updates (
        update_id         BIGSERIAL PRIMARY KEY,
        update_timestamp  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        run_type          TEXT,
        records_fetched   BIGINT NOT NULL DEFAULT 0,
        records_inserted  BIGINT NOT NULL DEFAULT 0,
        records_updated   BIGINT NOT NULL DEFAULT 0,
        records_unchanged BIGINT NOT NULL DEFAULT 0,
        bound_violations  BIGINT NOT NULL DEFAULT 0,
        records_rejected  BIGINT NOT NULL DEFAULT 0,
        last_auction_date DATE,
        status            TEXT NOT NULL,
        error_message     TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fiscal_policy_indices (
        date                       DATE PRIMARY KEY,
        total_articles             INTEGER,
        fiscal_articles            INTEGER,
        tariff_fiscal_articles     INTEGER,
        non_tariff_fiscal_articles INTEGER,
        rate                       DOUBLE PRECISION,
        tariff_rate                DOUBLE PRECISION,
        non_tariff_rate            DOUBLE PRECISION,
        fiscal_policy_index        DOUBLE PRECISION,
        tariff_fiscal_index        DOUBLE PRECISION,
        non_tariff_fiscal_index    DOUBLE PRECISION,
        updated_at                 TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fiscal_articles (
        article_id        TEXT PRIMARY KEY,
        date              DATE NOT NULL,
        is_fiscal_article BOOLEAN NOT NULL DEFAULT FALSE,
        has_tariff        BOOLEAN NOT NULL DEFAULT FALSE,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_article_date ON fiscal_articles (date)",
    r#"
    CREATE TABLE IF NOT EXISTS top_phrases (
        phrase_id  BIGSERIAL PRIMARY KEY,
        phrase     TEXT NOT NULL UNIQUE,
        count      INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

const AUCTION_COLUMNS: &str = "auction_id, cusip, auction_date, announcement_date, issue_date, \
     maturity_date, auction_format, offering_amount, total_tendered, total_accepted, \
     bid_to_cover_ratio, high_yield, low_yield, average_median_yield, high_price, low_price, \
     price_per_100, interest_rate";

#[derive(Debug, FromRow)]
struct AuctionRow {
    auction_id: i64,
    cusip: String,
    auction_date: NaiveDate,
    announcement_date: Option<NaiveDate>,
    issue_date: Option<NaiveDate>,
    maturity_date: Option<NaiveDate>,
    auction_format: Option<String>,
    offering_amount: Option<f64>,
    total_tendered: Option<f64>,
    total_accepted: Option<f64>,
    bid_to_cover_ratio: Option<f64>,
    high_yield: Option<f64>,
    low_yield: Option<f64>,
    average_median_yield: Option<f64>,
    high_price: Option<f64>,
    low_price: Option<f64>,
    price_per_100: Option<f64>,
    interest_rate: Option<f64>,
}

impl From<AuctionRow> for StoredAuction {
    fn from(r: AuctionRow) -> Self {
        StoredAuction {
            auction_id: r.auction_id,
            auction: Auction {
                cusip: r.cusip,
                auction_date: r.auction_date,
                announcement_date: r.announcement_date,
                issue_date: r.issue_date,
                maturity_date: r.maturity_date,
                auction_format: r.auction_format,
                offering_amount: r.offering_amount,
                total_tendered: r.total_tendered,
                total_accepted: r.total_accepted,
                bid_to_cover_ratio: r.bid_to_cover_ratio,
                high_yield: r.high_yield,
                low_yield: r.low_yield,
                average_median_yield: r.average_median_yield,
                high_price: r.high_price,
                low_price: r.low_price,
                price_per_100: r.price_per_100,
                interest_rate: r.interest_rate,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct UpdateRow {
    update_id: i64,
    update_timestamp: DateTime<Utc>,
    run_type: Option<String>,
    records_fetched: i64,
    records_inserted: i64,
    records_updated: i64,
    records_unchanged: i64,
    bound_violations: i64,
    records_rejected: i64,
    last_auction_date: Option<NaiveDate>,
    status: String,
    error_message: Option<String>,
}

impl TryFrom<UpdateRow> for UpdateRecord {
    type Error = IngestError;

    fn try_from(r: UpdateRow) -> Result<Self> {
        let status = r.status.parse::<UpdateStatus>().map_err(IngestError::Storage)?;
        Ok(UpdateRecord {
            update_id: r.update_id,
            update_timestamp: r.update_timestamp,
            run_type: r.run_type,
            counts: RunCounts {
                records_fetched: r.records_fetched,
                records_inserted: r.records_inserted,
                records_updated: r.records_updated,
                records_unchanged: r.records_unchanged,
                bound_violations: r.bound_violations,
                records_rejected: r.records_rejected,
            },
            last_auction_date: r.last_auction_date,
            status,
            error_message: r.error_message,
        })
    }
}

#[derive(Debug, FromRow)]
struct FiscalRow {
    date: NaiveDate,
    total_articles: Option<i32>,
    fiscal_articles: Option<i32>,
    tariff_fiscal_articles: Option<i32>,
    non_tariff_fiscal_articles: Option<i32>,
    rate: Option<f64>,
    tariff_rate: Option<f64>,
    non_tariff_rate: Option<f64>,
    fiscal_policy_index: Option<f64>,
    tariff_fiscal_index: Option<f64>,
    non_tariff_fiscal_index: Option<f64>,
}

impl From<FiscalRow> for FiscalIndex {
    fn from(r: FiscalRow) -> Self {
        FiscalIndex {
            date: r.date,
            total_articles: r.total_articles,
            fiscal_articles: r.fiscal_articles,
            tariff_fiscal_articles: r.tariff_fiscal_articles,
            non_tariff_fiscal_articles: r.non_tariff_fiscal_articles,
            rate: r.rate,
            tariff_rate: r.tariff_rate,
            non_tariff_rate: r.non_tariff_rate,
            fiscal_policy_index: r.fiscal_policy_index,
            tariff_fiscal_index: r.tariff_fiscal_index,
            non_tariff_fiscal_index: r.non_tariff_fiscal_index,
        }
    }
}

/// Postgres-backed store.
pub struct DbStore {
    pub(crate) pool: PgPool,
}

impl DbStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates any missing tables and indexes.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        info!("Database schema is in place");
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for DbStore {
    async fn insert_security_if_absent(&self, security: &Security) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO securities (cusip, security_type, security_term, standardized_term, series,
                                    tips, floating_rate, callable, interest_rate, issue_date, maturity_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (cusip) DO NOTHING
            "#,
        )
        .bind(&security.cusip)
        .bind(&security.security_type)
        .bind(&security.security_term)
        .bind(&security.standardized_term)
        .bind(&security.series)
        .bind(security.tips)
        .bind(security.floating_rate)
        .bind(security.callable)
        .bind(security.interest_rate)
        .bind(security.issue_date)
        .bind(security.maturity_date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_auction(&self, key: &AuctionKey) -> Result<Option<StoredAuction>> {
        let sql = format!(
            "SELECT {} FROM auctions WHERE cusip = $1 AND auction_date = $2",
            AUCTION_COLUMNS
        );
        let row = sqlx::query_as::<_, AuctionRow>(&sql)
            .bind(&key.cusip)
            .bind(key.auction_date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(StoredAuction::from))
    }

    async fn upsert_auction(&self, a: &Auction) -> Result<ApplyOutcome> {
        // The WHERE clause suppresses no-op updates, so an unchanged row
        // returns nothing. xmax = 0 only for a freshly inserted tuple.
        let written: Option<(i64, bool)> = sqlx::query_as(
            r#"
            INSERT INTO auctions (cusip, auction_date, announcement_date, issue_date, maturity_date,
                                  auction_format, offering_amount, total_tendered, total_accepted,
                                  bid_to_cover_ratio, high_yield, low_yield, average_median_yield,
                                  high_price, low_price, price_per_100, interest_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (cusip, auction_date) DO UPDATE SET
                announcement_date = COALESCE(EXCLUDED.announcement_date, auctions.announcement_date),
                issue_date = COALESCE(EXCLUDED.issue_date, auctions.issue_date),
                maturity_date = COALESCE(EXCLUDED.maturity_date, auctions.maturity_date),
                auction_format = COALESCE(EXCLUDED.auction_format, auctions.auction_format),
                offering_amount = COALESCE(EXCLUDED.offering_amount, auctions.offering_amount),
                total_tendered = COALESCE(EXCLUDED.total_tendered, auctions.total_tendered),
                total_accepted = COALESCE(EXCLUDED.total_accepted, auctions.total_accepted),
                bid_to_cover_ratio = COALESCE(EXCLUDED.bid_to_cover_ratio, auctions.bid_to_cover_ratio),
                high_yield = COALESCE(EXCLUDED.high_yield, auctions.high_yield),
                low_yield = COALESCE(EXCLUDED.low_yield, auctions.low_yield),
                average_median_yield = COALESCE(EXCLUDED.average_median_yield, auctions.average_median_yield),
                high_price = COALESCE(EXCLUDED.high_price, auctions.high_price),
                low_price = COALESCE(EXCLUDED.low_price, auctions.low_price),
                price_per_100 = COALESCE(EXCLUDED.price_per_100, auctions.price_per_100),
                interest_rate = COALESCE(EXCLUDED.interest_rate, auctions.interest_rate),
                updated_at = NOW()
            WHERE (auctions.announcement_date,
                   auctions.issue_date,
                   auctions.maturity_date,
                   auctions.auction_format,
                   auctions.offering_amount,
                   auctions.total_tendered,
                   auctions.total_accepted,
                   auctions.bid_to_cover_ratio,
                   auctions.high_yield,
                   auctions.low_yield,
                   auctions.average_median_yield,
                   auctions.high_price,
                   auctions.low_price,
                   auctions.price_per_100,
                   auctions.interest_rate)
            IS DISTINCT FROM (COALESCE(EXCLUDED.announcement_date, auctions.announcement_date),
                   COALESCE(EXCLUDED.issue_date, auctions.issue_date),
                   COALESCE(EXCLUDED.maturity_date, auctions.maturity_date),
                   COALESCE(EXCLUDED.auction_format, auctions.auction_format),
                   COALESCE(EXCLUDED.offering_amount, auctions.offering_amount),
                   COALESCE(EXCLUDED.total_tendered, auctions.total_tendered),
                   COALESCE(EXCLUDED.total_accepted, auctions.total_accepted),
                   COALESCE(EXCLUDED.bid_to_cover_ratio, auctions.bid_to_cover_ratio),
                   COALESCE(EXCLUDED.high_yield, auctions.high_yield),
                   COALESCE(EXCLUDED.low_yield, auctions.low_yield),
                   COALESCE(EXCLUDED.average_median_yield, auctions.average_median_yield),
                   COALESCE(EXCLUDED.high_price, auctions.high_price),
                   COALESCE(EXCLUDED.low_price, auctions.low_price),
                   COALESCE(EXCLUDED.price_per_100, auctions.price_per_100),
                   COALESCE(EXCLUDED.interest_rate, auctions.interest_rate))
            RETURNING auction_id, (xmax = 0) AS inserted
            "#,
        )
        .bind(&a.cusip)
        .bind(a.auction_date)
        .bind(a.announcement_date)
        .bind(a.issue_date)
        .bind(a.maturity_date)
        .bind(&a.auction_format)
        .bind(a.offering_amount)
        .bind(a.total_tendered)
        .bind(a.total_accepted)
        .bind(a.bid_to_cover_ratio)
        .bind(a.high_yield)
        .bind(a.low_yield)
        .bind(a.average_median_yield)
        .bind(a.high_price)
        .bind(a.low_price)
        .bind(a.price_per_100)
        .bind(a.interest_rate)
        .fetch_optional(&self.pool)
        .await?;

        match written {
            Some((auction_id, true)) => Ok(ApplyOutcome::Inserted(auction_id)),
            Some((auction_id, false)) => Ok(ApplyOutcome::Updated(auction_id)),
            None => {
                let auction_id: i64 = sqlx::query_scalar(
                    "SELECT auction_id FROM auctions WHERE cusip = $1 AND auction_date = $2",
                )
                .bind(&a.cusip)
                .bind(a.auction_date)
                .fetch_one(&self.pool)
                .await?;
                Ok(ApplyOutcome::Unchanged(auction_id))
            }
        }
    }

    async fn upsert_bidder_detail(&self, auction_id: i64, d: &BidderDetail) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bidder_details (auction_id, primary_dealer_accepted, primary_dealer_percentage,
                                        direct_bidder_accepted, direct_bidder_percentage,
                                        indirect_bidder_accepted, indirect_bidder_percentage,
                                        fima_accepted, fima_percentage, soma_accepted, soma_percentage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (auction_id) DO UPDATE SET
                primary_dealer_accepted = EXCLUDED.primary_dealer_accepted,
                primary_dealer_percentage = EXCLUDED.primary_dealer_percentage,
                direct_bidder_accepted = EXCLUDED.direct_bidder_accepted,
                direct_bidder_percentage = EXCLUDED.direct_bidder_percentage,
                indirect_bidder_accepted = EXCLUDED.indirect_bidder_accepted,
                indirect_bidder_percentage = EXCLUDED.indirect_bidder_percentage,
                fima_accepted = EXCLUDED.fima_accepted,
                fima_percentage = EXCLUDED.fima_percentage,
                soma_accepted = EXCLUDED.soma_accepted,
                soma_percentage = EXCLUDED.soma_percentage,
                updated_at = NOW()
            "#,
        )
        .bind(auction_id)
        .bind(d.primary_dealer_accepted)
        .bind(d.primary_dealer_percentage)
        .bind(d.direct_bidder_accepted)
        .bind(d.direct_bidder_percentage)
        .bind(d.indirect_bidder_accepted)
        .bind(d.indirect_bidder_percentage)
        .bind(d.fima_accepted)
        .bind(d.fima_percentage)
        .bind(d.soma_accepted)
        .bind(d.soma_percentage)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn auction_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auctions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn latest_auction_date(&self) -> Result<Option<NaiveDate>> {
        let latest: Option<NaiveDate> = sqlx::query_scalar("SELECT MAX(auction_date) FROM auctions")
            .fetch_one(&self.pool)
            .await?;
        Ok(latest)
    }

    async fn begin_update(&self, run_type: RunType) -> Result<i64> {
        let update_id: i64 = sqlx::query_scalar(
            "INSERT INTO data_updates (run_type, status) VALUES ($1, $2) RETURNING update_id",
        )
        .bind(run_type.as_str())
        .bind(UpdateStatus::Running.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(update_id)
    }

    async fn finish_update(&self, update_id: i64, outcome: &UpdateOutcome) -> Result<()> {
        let c = &outcome.counts;
        sqlx::query(
            r#"
            UPDATE data_updates SET
                records_fetched = $2,
                records_inserted = $3,
                records_updated = $4,
                records_unchanged = $5,
                bound_violations = $6,
                records_rejected = $7,
                last_auction_date = $8,
                status = $9,
                error_message = $10
            WHERE update_id = $1
            "#,
        )
        .bind(update_id)
        .bind(c.records_fetched)
        .bind(c.records_inserted)
        .bind(c.records_updated)
        .bind(c.records_unchanged)
        .bind(c.bound_violations)
        .bind(c.records_rejected)
        .bind(outcome.last_auction_date)
        .bind(outcome.status.as_str())
        .bind(&outcome.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_update(&self) -> Result<Option<UpdateRecord>> {
        let row = sqlx::query_as::<_, UpdateRow>(
            r#"
            SELECT update_id, update_timestamp, run_type, records_fetched, records_inserted,
                   records_updated, records_unchanged, bound_violations, records_rejected,
                   last_auction_date, status, error_message
            FROM data_updates
            ORDER BY update_id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(UpdateRecord::try_from).transpose()
    }

    async fn upsert_fiscal_index(&self, f: &FiscalIndex) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fiscal_policy_indices (date, total_articles, fiscal_articles,
                                               tariff_fiscal_articles, non_tariff_fiscal_articles,
                                               rate, tariff_rate, non_tariff_rate,
                                               fiscal_policy_index, tariff_fiscal_index,
                                               non_tariff_fiscal_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (date) DO UPDATE SET
                total_articles = EXCLUDED.total_articles,
                fiscal_articles = EXCLUDED.fiscal_articles,
                tariff_fiscal_articles = EXCLUDED.tariff_fiscal_articles,
                non_tariff_fiscal_articles = EXCLUDED.non_tariff_fiscal_articles,
                rate = EXCLUDED.rate,
                tariff_rate = EXCLUDED.tariff_rate,
                non_tariff_rate = EXCLUDED.non_tariff_rate,
                fiscal_policy_index = EXCLUDED.fiscal_policy_index,
                tariff_fiscal_index = EXCLUDED.tariff_fiscal_index,
                non_tariff_fiscal_index = EXCLUDED.non_tariff_fiscal_index,
                updated_at = NOW()
            "#,
        )
        .bind(f.date)
        .bind(f.total_articles)
        .bind(f.fiscal_articles)
        .bind(f.tariff_fiscal_articles)
        .bind(f.non_tariff_fiscal_articles)
        .bind(f.rate)
        .bind(f.tariff_rate)
        .bind(f.non_tariff_rate)
        .bind(f.fiscal_policy_index)
        .bind(f.tariff_fiscal_index)
        .bind(f.non_tariff_fiscal_index)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fiscal_index_as_of(&self, date: NaiveDate) -> Result<Option<FiscalIndex>> {
        let row = sqlx::query_as::<_, FiscalRow>(
            r#"
            SELECT date, total_articles, fiscal_articles, tariff_fiscal_articles,
                   non_tariff_fiscal_articles, rate, tariff_rate, non_tariff_rate,
                   fiscal_policy_index, tariff_fiscal_index, non_tariff_fiscal_index
            FROM fiscal_policy_indices
            WHERE date <= $1
            ORDER BY date DESC
            LIMIT 1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FiscalIndex::from))
    }

    async fn upsert_fiscal_article(&self, article: &FiscalArticle) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fiscal_articles (article_id, date, is_fiscal_article, has_tariff)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (article_id) DO UPDATE SET
                date = EXCLUDED.date,
                is_fiscal_article = EXCLUDED.is_fiscal_article,
                has_tariff = EXCLUDED.has_tariff,
                updated_at = NOW()
            "#,
        )
        .bind(&article.article_id)
        .bind(article.date)
        .bind(article.is_fiscal_article)
        .bind(article.has_tariff)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_top_phrase(&self, phrase: &TopPhrase) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO top_phrases (phrase, count)
            VALUES ($1, $2)
            ON CONFLICT (phrase) DO UPDATE SET
                count = EXCLUDED.count,
                updated_at = NOW()
            "#,
        )
        .bind(&phrase.phrase)
        .bind(phrase.count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fiscal_table_counts(&self) -> Result<FiscalTableCounts> {
        let (articles, indices, phrases): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM fiscal_articles),
                   (SELECT COUNT(*) FROM fiscal_policy_indices),
                   (SELECT COUNT(*) FROM top_phrases)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(FiscalTableCounts {
            articles,
            indices,
            phrases,
        })
    }
}
