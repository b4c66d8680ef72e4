use crate::error::StoreError;
use crate::store::{CachedRate, RateStore, rate_key};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory rate store. Nothing survives a restart; useful for tests
/// and for running without a writable data directory.
pub struct MemoryRateStore {
    inner: Arc<Mutex<HashMap<String, CachedRate>>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Plants a record with an explicit timestamp. Only tests need to
    /// fabricate stale entries.
    #[cfg(test)]
    pub(crate) async fn put_at(&self, code: &str, amount: f64, observed_at: chrono::DateTime<Utc>) {
        let key = rate_key(code);
        let mut rates = self.inner.lock().await;
        rates.insert(
            key.clone(),
            CachedRate {
                code: key,
                amount,
                observed_at,
            },
        );
    }
}

impl Default for MemoryRateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn is_cached(&self, code: &str) -> bool {
        let rates = self.inner.lock().await;
        rates.contains_key(&rate_key(code))
    }

    async fn get(&self, code: &str) -> Result<Option<CachedRate>, StoreError> {
        let rates = self.inner.lock().await;
        let record = rates.get(&rate_key(code)).cloned();
        if record.is_some() {
            debug!("Rate cache HIT for {}", code);
        } else {
            debug!("Rate cache MISS for {}", code);
        }
        Ok(record)
    }

    async fn put(&self, code: &str, amount: f64) -> Result<(), StoreError> {
        let key = rate_key(code);
        let mut rates = self.inner.lock().await;
        debug!("Rate cache PUT for {}", key);
        rates.insert(
            key.clone(),
            CachedRate {
                code: key,
                amount,
                observed_at: Utc::now(),
            },
        );
        Ok(())
    }
}
