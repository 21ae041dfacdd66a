// src/services/fiscal.rs
use chrono::NaiveDate;
use csv::Reader;
use log::{error, info, warn};
use serde::Deserialize;
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::models::{FiscalArticle, FiscalIndex, TopPhrase};
use crate::services::normalize::{parse_date, parse_flag, parse_number};
use crate::services::store::{AuctionStore, FiscalTableCounts};

pub const ARTICLES_FILE: &str = "wsj_articles.csv";
pub const SCORES_FILE: &str = "wsj_articles_scores.csv";
pub const PHRASES_FILE: &str = "top_phrases.csv";

#[derive(Debug, Deserialize)]
struct ScoreRow {
    date: String,
    #[serde(default)]
    total_articles: Option<String>,
    #[serde(default)]
    fiscal_articles: Option<String>,
    #[serde(default)]
    tariff_fiscal_articles: Option<String>,
    #[serde(default)]
    non_tariff_fiscal_articles: Option<String>,
    #[serde(default)]
    rate: Option<String>,
    #[serde(default)]
    tariff_rate: Option<String>,
    #[serde(default)]
    non_tariff_rate: Option<String>,
    #[serde(default)]
    fiscal_policy_index: Option<String>,
    #[serde(default)]
    tariff_fiscal_index: Option<String>,
    #[serde(default)]
    non_tariff_fiscal_index: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleRow {
    #[serde(default)]
    article_id: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    is_fiscal_article: Option<String>,
    #[serde(default)]
    has_tariff: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhraseRow {
    #[serde(default)]
    phrase: Option<String>,
    #[serde(default)]
    count: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FiscalLoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// Parses daily score rows. Rows with an unusable date are skipped and counted.
pub fn read_fiscal_indices<R: Read>(reader: R) -> Result<(Vec<FiscalIndex>, usize)> {
    let mut rdr = Reader::from_reader(reader);
    let mut indices = Vec::new();
    let mut skipped = 0;

    for row in rdr.deserialize::<ScoreRow>() {
        let row = row?;
        let date = match parse_date(Some(row.date.as_str())) {
            Some(date) => date,
            None => {
                skipped += 1;
                continue;
            }
        };
        let count = |v: &Option<String>| parse_number(v.as_deref()).map(|n| n.round() as i32);
        let score = |v: &Option<String>| parse_number(v.as_deref());

        indices.push(FiscalIndex {
            date,
            total_articles: count(&row.total_articles),
            fiscal_articles: count(&row.fiscal_articles),
            tariff_fiscal_articles: count(&row.tariff_fiscal_articles),
            non_tariff_fiscal_articles: count(&row.non_tariff_fiscal_articles),
            rate: score(&row.rate),
            tariff_rate: score(&row.tariff_rate),
            non_tariff_rate: score(&row.non_tariff_rate),
            fiscal_policy_index: score(&row.fiscal_policy_index),
            tariff_fiscal_index: score(&row.tariff_fiscal_index),
            non_tariff_fiscal_index: score(&row.non_tariff_fiscal_index),
        });
    }

    Ok((indices, skipped))
}

/// Parses per-article classifications. Rows without an id or a usable date
/// are skipped and counted; a missing flag reads as false.
pub fn read_fiscal_articles<R: Read>(reader: R) -> Result<(Vec<FiscalArticle>, usize)> {
    let mut rdr = Reader::from_reader(reader);
    let mut articles = Vec::new();
    let mut skipped = 0;

    for row in rdr.deserialize::<ArticleRow>() {
        let row = row?;
        let article_id = row.article_id.as_deref().map(str::trim).unwrap_or_default();
        let date = parse_date(row.date.as_deref());
        let date = match date {
            Some(date) if !article_id.is_empty() => date,
            _ => {
                skipped += 1;
                continue;
            }
        };

        articles.push(FiscalArticle {
            article_id: article_id.to_string(),
            date,
            is_fiscal_article: parse_flag(row.is_fiscal_article.as_deref()).unwrap_or(false),
            has_tariff: parse_flag(row.has_tariff.as_deref()).unwrap_or(false),
        });
    }

    Ok((articles, skipped))
}

/// Parses `phrase,count` rows. Blank phrases and non-numeric counts are skipped.
pub fn read_top_phrases<R: Read>(reader: R) -> Result<(Vec<TopPhrase>, usize)> {
    let mut rdr = Reader::from_reader(reader);
    let mut phrases = Vec::new();
    let mut skipped = 0;

    for row in rdr.deserialize::<PhraseRow>() {
        let row = row?;
        let phrase = row.phrase.as_deref().map(str::trim).unwrap_or_default();
        let count = parse_number(row.count.as_deref())
            .filter(|n| *n >= 0.0 && *n <= i32::MAX as f64)
            .map(|n| n.round() as i32);

        match count {
            Some(count) if !phrase.is_empty() => phrases.push(TopPhrase {
                phrase: phrase.to_string(),
                count,
            }),
            _ => skipped += 1,
        }
    }

    Ok((phrases, skipped))
}

/// Loads a score CSV into the store, upserting by date.
pub async fn load_fiscal_csv<S>(store: &S, path: &Path) -> Result<FiscalLoadSummary>
where
    S: AuctionStore + ?Sized,
{
    info!("Loading policy indices from {}", path.display());
    let bytes = tokio::fs::read(path).await?;
    let (indices, skipped) = read_fiscal_indices(bytes.as_slice())?;

    for index in &indices {
        store.upsert_fiscal_index(index).await?;
    }

    if skipped > 0 {
        warn!("Skipped {} indices with invalid dates", skipped);
    }
    info!("Policy indices loaded: {}", indices.len());
    Ok(FiscalLoadSummary {
        loaded: indices.len(),
        skipped,
    })
}

/// Loads article classifications, upserting by `article_id`.
pub async fn load_fiscal_articles<S>(store: &S, path: &Path) -> Result<FiscalLoadSummary>
where
    S: AuctionStore + ?Sized,
{
    info!("Loading fiscal articles from {}", path.display());
    let bytes = tokio::fs::read(path).await?;
    let (articles, skipped) = read_fiscal_articles(bytes.as_slice())?;

    for (n, article) in articles.iter().enumerate() {
        store.upsert_fiscal_article(article).await?;
        if (n + 1) % 1000 == 0 {
            info!("Progress: {} articles processed...", n + 1);
        }
    }

    if skipped > 0 {
        warn!("Skipped {} articles without an id or valid date", skipped);
    }
    info!("Fiscal articles loaded: {}", articles.len());
    Ok(FiscalLoadSummary {
        loaded: articles.len(),
        skipped,
    })
}

/// Loads phrase counts, upserting by phrase.
pub async fn load_top_phrases<S>(store: &S, path: &Path) -> Result<FiscalLoadSummary>
where
    S: AuctionStore + ?Sized,
{
    info!("Loading top phrases from {}", path.display());
    let bytes = tokio::fs::read(path).await?;
    let (phrases, skipped) = read_top_phrases(bytes.as_slice())?;

    for phrase in &phrases {
        store.upsert_top_phrase(phrase).await?;
    }

    if skipped > 0 {
        warn!("Skipped {} unusable phrase rows", skipped);
    }
    info!("Top phrases loaded: {}", phrases.len());
    Ok(FiscalLoadSummary {
        loaded: phrases.len(),
        skipped,
    })
}

/// What a full directory load did, per file, plus the resulting table sizes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FiscalDirectoryLoad {
    pub articles: FiscalLoadSummary,
    pub indices: FiscalLoadSummary,
    pub phrases: FiscalLoadSummary,
    pub counts: FiscalTableCounts,
}

/// Loads articles, scores and phrases from `dir`, then logs table counts.
/// A missing file is logged and loads nothing; any other failure aborts.
pub async fn load_fiscal_directory<S>(store: &S, dir: &Path) -> Result<FiscalDirectoryLoad>
where
    S: AuctionStore + ?Sized,
{
    let path = dir.join(ARTICLES_FILE);
    let articles = skip_missing(&path, load_fiscal_articles(store, &path).await)?;
    let path = dir.join(SCORES_FILE);
    let indices = skip_missing(&path, load_fiscal_csv(store, &path).await)?;
    let path = dir.join(PHRASES_FILE);
    let phrases = skip_missing(&path, load_top_phrases(store, &path).await)?;

    let counts = store.fiscal_table_counts().await?;
    info!("Fiscal article records: {}", counts.articles);
    info!("Fiscal policy index records: {}", counts.indices);
    info!("Top phrase records: {}", counts.phrases);

    Ok(FiscalDirectoryLoad {
        articles,
        indices,
        phrases,
        counts,
    })
}

fn skip_missing(path: &Path, result: Result<FiscalLoadSummary>) -> Result<FiscalLoadSummary> {
    match result {
        Err(IngestError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            error!("File not found: {}", path.display());
            Ok(FiscalLoadSummary::default())
        }
        other => other,
    }
}

/// The index with the greatest date not after `date`.
pub fn latest_on_or_before(indices: &[FiscalIndex], date: NaiveDate) -> Option<&FiscalIndex> {
    indices
        .iter()
        .filter(|index| index.date <= date)
        .max_by_key(|index| index.date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(date: &str, score: f64) -> FiscalIndex {
        FiscalIndex {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            total_articles: None,
            fiscal_articles: None,
            tariff_fiscal_articles: None,
            non_tariff_fiscal_articles: None,
            rate: None,
            tariff_rate: None,
            non_tariff_rate: None,
            fiscal_policy_index: Some(score),
            tariff_fiscal_index: None,
            non_tariff_fiscal_index: None,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn joins_latest_score_on_or_before() {
        let indices = vec![index("2024-06-20", 2.0), index("2024-06-10", 1.0)];
        let joined = latest_on_or_before(&indices, day("2024-06-15")).unwrap();
        assert_eq!(joined.date, day("2024-06-10"));

        let exact = latest_on_or_before(&indices, day("2024-06-20")).unwrap();
        assert_eq!(exact.fiscal_policy_index, Some(2.0));

        assert!(latest_on_or_before(&indices, day("2024-06-01")).is_none());
    }

    #[test]
    fn reads_scores_and_skips_bad_dates() {
        let csv = "\
date,total_articles,fiscal_articles,tariff_fiscal_articles,non_tariff_fiscal_articles,rate,tariff_rate,non_tariff_rate,fiscal_policy_index,tariff_fiscal_index,non_tariff_fiscal_index
2024-06-10,120,30,5,25,0.25,0.04,0.21,101.5,98.2,
not-a-date,1,1,1,1,1,1,1,1,1,1
2024-06-11 00:00:00,80,,,,,,,99.0,,
";
        let (indices, skipped) = read_fiscal_indices(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(indices.len(), 2);
        assert_eq!(indices[0].total_articles, Some(120));
        assert_eq!(indices[0].fiscal_policy_index, Some(101.5));
        assert_eq!(indices[0].non_tariff_fiscal_index, None);
        assert_eq!(indices[1].date, day("2024-06-11"));
        assert_eq!(indices[1].fiscal_articles, None);
    }

    #[test]
    fn reads_articles_and_skips_unusable_rows() {
        let csv = "\
article_id,date,is_fiscal_article,has_tariff
A100,2024-06-10,True,False
A101,2024-06-10 09:30:00,1,1
,2024-06-11,True,False
A103,,True,False
A104,2024-06-12,False,
";
        let (articles, skipped) = read_fiscal_articles(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].article_id, "A100");
        assert!(articles[0].is_fiscal_article);
        assert!(!articles[0].has_tariff);
        assert_eq!(articles[1].date, day("2024-06-10"));
        assert!(articles[1].has_tariff);
        assert!(!articles[2].is_fiscal_article);
        assert!(!articles[2].has_tariff);
    }

    #[test]
    fn articles_without_tariff_column_default_to_false() {
        let csv = "article_id,date,is_fiscal_article\nA1,2024-06-10,yes\n";
        let (articles, skipped) = read_fiscal_articles(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 0);
        assert!(articles[0].is_fiscal_article);
        assert!(!articles[0].has_tariff);
    }

    #[test]
    fn reads_phrases_and_skips_blank_or_bad_counts() {
        let csv = "\
phrase,count
  budget deficit ,412
tariff revenue,98
,7
debt ceiling,many
";
        let (phrases, skipped) = read_top_phrases(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(
            phrases,
            vec![
                TopPhrase {
                    phrase: "budget deficit".into(),
                    count: 412
                },
                TopPhrase {
                    phrase: "tariff revenue".into(),
                    count: 98
                },
            ]
        );
    }
}
