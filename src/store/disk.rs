use crate::error::StoreError;
use crate::store::{CachedRate, RateStore, WagePatch, WageRecord, WageStore, rate_key};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const RATES_PARTITION: &str = "exchange_rates";
const WAGES_PARTITION: &str = "wages";

/// On-disk rate record. Timestamps have landed in several shapes over
/// the store's history; they stay text on disk and are normalized to UTC
/// instants on read.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRate {
    amount: f64,
    #[serde(default)]
    observed_at: Option<String>,
}

/// Parses a stored timestamp. Accepts RFC 3339 and the legacy
/// `YYYY-MM-DD HH:MM:SS` form; anything else degrades to the Unix epoch
/// so the record takes the stale path instead of poisoning a read.
fn parse_observed_at(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return DateTime::UNIX_EPOCH;
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return ts.and_utc();
    }
    warn!("Unparseable stored timestamp '{}', treating as epoch", raw);
    DateTime::UNIX_EPOCH
}

pub struct DiskRateStore {
    partition: PartitionHandle,
}

impl DiskRateStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self, StoreError> {
        let partition =
            keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        Ok(Self { partition })
    }
}

#[async_trait]
impl RateStore for DiskRateStore {
    async fn is_cached(&self, code: &str) -> bool {
        match self.partition.contains_key(rate_key(code)) {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Rate store lookup failed for {}: {}", code, e);
                false
            }
        }
    }

    async fn get(&self, code: &str) -> Result<Option<CachedRate>, StoreError> {
        let key = rate_key(code);
        let Some(bytes) = self.partition.get(&key)? else {
            debug!("Rate cache MISS for {}", key);
            return Ok(None);
        };

        let stored: StoredRate =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
                key: key.clone(),
                source,
            })?;
        debug!("Rate cache HIT for {}", key);
        Ok(Some(CachedRate {
            code: key,
            amount: stored.amount,
            observed_at: parse_observed_at(stored.observed_at.as_deref()),
        }))
    }

    async fn put(&self, code: &str, amount: f64) -> Result<(), StoreError> {
        let key = rate_key(code);
        let stored = StoredRate {
            amount,
            observed_at: Some(Utc::now().to_rfc3339()),
        };
        let bytes = serde_json::to_vec(&stored).map_err(|source| StoreError::Encode {
            key: key.clone(),
            source,
        })?;
        debug!("Rate cache PUT for {}", key);
        // A single insert is atomic per key; a concurrent get sees either
        // the old record or the new one.
        self.partition.insert(&key, bytes)?;
        Ok(())
    }
}

pub struct DiskWageStore {
    partition: PartitionHandle,
}

impl DiskWageStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self, StoreError> {
        let partition =
            keyspace.open_partition(WAGES_PARTITION, PartitionCreateOptions::default())?;
        Ok(Self { partition })
    }

    /// Writes a full wage document. The ingestion job owns this path;
    /// the dispatcher only ever reads and patches.
    pub fn insert(&self, record: &WageRecord) -> Result<(), StoreError> {
        let key = WageRecord::key(&record.iso3, record.year, &record.unit);
        let bytes = serde_json::to_vec(record).map_err(|source| StoreError::Encode {
            key: key.clone(),
            source,
        })?;
        self.partition.insert(&key, bytes)?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<WageRecord>, StoreError> {
        let Some(bytes) = self.partition.get(key)? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(record))
    }
}

#[async_trait]
impl WageStore for DiskWageStore {
    async fn get(
        &self,
        iso3: &str,
        year: i32,
        unit: &str,
    ) -> Result<Option<WageRecord>, StoreError> {
        let key = WageRecord::key(iso3, year, unit);
        let record = self.read(&key)?;
        if record.is_some() {
            debug!("Wage doc HIT for {}", key);
        } else {
            debug!("Wage doc MISS for {}", key);
        }
        Ok(record)
    }

    async fn upsert(
        &self,
        iso3: &str,
        year: i32,
        unit: &str,
        patch: WagePatch,
    ) -> Result<(), StoreError> {
        let key = WageRecord::key(iso3, year, unit);
        let Some(mut record) = self.read(&key)? else {
            debug!("Wage patch for missing doc {} dropped", key);
            return Ok(());
        };

        patch.apply(&mut record);
        let bytes = serde_json::to_vec(&record).map_err(|source| StoreError::Encode {
            key: key.clone(),
            source,
        })?;
        self.partition.insert(&key, bytes)?;
        debug!("Wage doc PATCHED for {}", key);
        Ok(())
    }
}
