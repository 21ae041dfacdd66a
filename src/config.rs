// src/config.rs
use chrono::NaiveDate;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{IngestError, Result};

pub const DEFAULT_API_BASE: &str = "https://www.treasurydirect.gov/TA_WS/securities/jqsearch";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub api_base: String,
    pub page_size: usize,
    pub max_records: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cache_path: PathBuf,
    pub schedule_hour: u32,
    pub schedule_minute: u32,
    pub port: u16,
}

impl Settings {
    /// Reads settings from the process environment (after loading `.env`, if any).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| IngestError::Config("DATABASE_URL must be set".into()))?;

        let api_base = get("TREASURY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let page_size = parse_or("TREASURY_PAGE_SIZE", get("TREASURY_PAGE_SIZE"), 100usize)?;
        let max_records = parse_or("TREASURY_MAX_RECORDS", get("TREASURY_MAX_RECORDS"), 15_000usize)?;
        if page_size == 0 {
            return Err(IngestError::Config("TREASURY_PAGE_SIZE must be positive".into()));
        }

        let start_date = parse_date("TREASURY_START_DATE", get("TREASURY_START_DATE"))?;
        let end_date = parse_date("TREASURY_END_DATE", get("TREASURY_END_DATE"))?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(IngestError::Config(format!(
                    "TREASURY_START_DATE {} is after TREASURY_END_DATE {}",
                    start, end
                )));
            }
        }

        let cache_path = get("CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/treasury_cache.json"));

        let schedule_hour = parse_or("UPDATE_SCHEDULE_HOUR", get("UPDATE_SCHEDULE_HOUR"), 18u32)?;
        let schedule_minute = parse_or("UPDATE_SCHEDULE_MINUTE", get("UPDATE_SCHEDULE_MINUTE"), 0u32)?;
        if schedule_hour > 23 || schedule_minute > 59 {
            return Err(IngestError::Config(format!(
                "invalid daily schedule {:02}:{:02}",
                schedule_hour, schedule_minute
            )));
        }

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| IngestError::Config(format!("PORT must be a number, got '{}'", raw)))?,
            None => {
                warn!("$PORT not set, defaulting to 3030");
                3030
            }
        };

        Ok(Settings {
            database_url,
            api_base,
            page_size,
            max_records,
            start_date,
            end_date,
            cache_path,
            schedule_hour,
            schedule_minute,
            port,
        })
    }

    /// Six-field cron expression (seconds first) for the daily run, UTC.
    pub fn cron_expression(&self) -> String {
        format!("0 {} {} * * *", self.schedule_minute, self.schedule_hour)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| IngestError::Config(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_date(key: &str, raw: Option<String>) -> Result<Option<NaiveDate>> {
    raw.map(|raw| {
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| IngestError::Config(format!("{} must be YYYY-MM-DD, got '{}'", key, raw)))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/treasury")]).unwrap();
        assert_eq!(s.api_base, DEFAULT_API_BASE);
        assert_eq!(s.page_size, 100);
        assert_eq!(s.max_records, 15_000);
        assert_eq!(s.schedule_hour, 18);
        assert_eq!(s.schedule_minute, 0);
        assert_eq!(s.port, 3030);
        assert!(s.start_date.is_none());
        assert_eq!(s.cron_expression(), "0 0 18 * * *");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(matches!(settings(&[]), Err(IngestError::Config(_))));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let base = ("DATABASE_URL", "postgres://x");
        assert!(settings(&[base, ("TREASURY_PAGE_SIZE", "lots")]).is_err());
        assert!(settings(&[base, ("UPDATE_SCHEDULE_HOUR", "24")]).is_err());
        assert!(settings(&[base, ("TREASURY_START_DATE", "06/15/2024")]).is_err());
        assert!(settings(&[
            base,
            ("TREASURY_START_DATE", "2024-06-15"),
            ("TREASURY_END_DATE", "2024-01-01"),
        ])
        .is_err());
    }

    #[test]
    fn schedule_and_range_are_read() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://x"),
            ("UPDATE_SCHEDULE_HOUR", "6"),
            ("UPDATE_SCHEDULE_MINUTE", "30"),
            ("TREASURY_START_DATE", "2020-01-01"),
            ("CACHE_PATH", "/tmp/snap.json"),
        ])
        .unwrap();
        assert_eq!(s.cron_expression(), "0 30 6 * * *");
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(s.cache_path, PathBuf::from("/tmp/snap.json"));
    }
}
