//! Storage abstraction over cached rates and wage records.
//!
//! The rate store has two interchangeable backends selected once at
//! startup; the dispatcher never branches on backend identity. The wage
//! store is a document store and has a single disk backend.

pub mod disk;
pub mod memory;

use crate::config::{AppConfig, StoreBackend};
use crate::error::StoreError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One cached quote: the price of one cake (the fixed base amount of the
/// base currency) expressed in `code`. Unique per code, overwritten in
/// place on refresh, never deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRate {
    pub code: String,
    pub amount: f64,
    pub observed_at: DateTime<Utc>,
}

impl CachedRate {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.observed_at
    }
}

#[async_trait]
pub trait RateStore: Send + Sync {
    async fn is_cached(&self, code: &str) -> bool;

    async fn get(&self, code: &str) -> Result<Option<CachedRate>, StoreError>;

    /// Upsert: creates the record if absent, overwrites if present, and
    /// always stamps `observed_at` with the current time. Atomic per key.
    async fn put(&self, code: &str, amount: f64) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WageSource {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
}

/// Per-country wage document, keyed by `{ISO3}_{year}_{unit}`. Created by
/// an external ingestion job; this crate reads it and merges derived
/// fields back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WageRecord {
    pub iso3: String,
    pub year: i32,
    pub unit: String,
    #[serde(default)]
    pub country: Option<String>,
    /// Salary in `unit`, as ingested.
    pub value: f64,
    #[serde(default)]
    pub cake_salary: Option<f64>,
    #[serde(default)]
    pub salary_kzt: Option<f64>,
    #[serde(default)]
    pub source: Option<WageSource>,
    #[serde(default)]
    pub ingested_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl WageRecord {
    pub fn key(iso3: &str, year: i32, unit: &str) -> String {
        format!(
            "{}_{}_{}",
            iso3.trim().to_uppercase(),
            year,
            unit.trim().to_uppercase()
        )
    }
}

/// Derived fields written back after a salary computation.
#[derive(Debug, Clone, Default)]
pub struct WagePatch {
    pub cake_salary: Option<f64>,
    pub salary_kzt: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WagePatch {
    pub(crate) fn apply(&self, record: &mut WageRecord) {
        if let Some(cake_salary) = self.cake_salary {
            record.cake_salary = Some(cake_salary);
        }
        if let Some(salary_kzt) = self.salary_kzt {
            record.salary_kzt = Some(salary_kzt);
        }
        let stamp = self.updated_at.unwrap_or_else(Utc::now);
        record.updated_at = Some(stamp.to_rfc3339());
    }
}

#[async_trait]
pub trait WageStore: Send + Sync {
    async fn get(&self, iso3: &str, year: i32, unit: &str)
    -> Result<Option<WageRecord>, StoreError>;

    /// Merges `patch` into the stored record, stamping `updated_at` when
    /// the patch does not carry one. A patch against a missing record is
    /// dropped: derived fields cannot reconstruct the ingested document.
    async fn upsert(
        &self,
        iso3: &str,
        year: i32,
        unit: &str,
        patch: WagePatch,
    ) -> Result<(), StoreError>;
}

pub struct Stores {
    pub rates: Arc<dyn RateStore>,
    pub wages: Arc<dyn WageStore>,
}

/// Opens the storage backends once at process start. The fjall keyspace
/// is shared by the rate and wage partitions and lives for the rest of
/// the process.
pub fn open(config: &AppConfig) -> Result<Stores> {
    let data_dir = config.default_data_path()?.join("cache");
    let keyspace = fjall::Config::new(&data_dir)
        .open()
        .with_context(|| format!("Failed to open keyspace at {}", data_dir.display()))?;

    let wages: Arc<dyn WageStore> = Arc::new(disk::DiskWageStore::new(&keyspace)?);
    let rates: Arc<dyn RateStore> = match config.store {
        StoreBackend::Disk => {
            debug!("Using disk rate store");
            Arc::new(disk::DiskRateStore::new(&keyspace)?)
        }
        StoreBackend::Memory => {
            debug!("Using memory rate store");
            Arc::new(memory::MemoryRateStore::new())
        }
    };

    Ok(Stores { rates, wages })
}

pub(crate) fn rate_key(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wage_record_key() {
        assert_eq!(WageRecord::key("kaz", 2024, "usd"), "KAZ_2024_USD");
        assert_eq!(WageRecord::key(" DEU ", 2023, "EUR"), "DEU_2023_EUR");
    }

    #[test]
    fn test_patch_apply_stamps_updated_at() {
        let mut record = WageRecord {
            iso3: "KAZ".to_string(),
            year: 2024,
            unit: "USD".to_string(),
            country: Some("Kazakhstan".to_string()),
            value: 1000.0,
            cake_salary: None,
            salary_kzt: None,
            source: None,
            ingested_at: None,
            updated_at: None,
        };

        let patch = WagePatch {
            cake_salary: Some(0.75),
            salary_kzt: Some(450_000.0),
            updated_at: None,
        };
        patch.apply(&mut record);

        assert_eq!(record.cake_salary, Some(0.75));
        assert_eq!(record.salary_kzt, Some(450_000.0));
        assert!(record.updated_at.is_some());
        // Untouched fields survive the merge.
        assert_eq!(record.value, 1000.0);
        assert_eq!(record.country.as_deref(), Some("Kazakhstan"));
    }
}
