//! Cache-aside quote serving with staleness fallback.
//!
//! One invocation answers at most two independent segments: the currency
//! quote and the wage card. Segments touch disjoint keys, run
//! concurrently and fail in isolation; every path returns rendered text.

use crate::card;
use crate::config::AppConfig;
use crate::providers::RateProvider;
use crate::salary;
use crate::store::{CachedRate, RateStore, WagePatch, WageStore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Terminal state of one cache-aside pass. Nothing persists across calls
/// beyond the store contents themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum RateOutcome {
    /// The base currency itself; answered from the constant, no I/O.
    BaseConstant,
    HitFresh(CachedRate),
    Refreshed(CachedRate),
    /// Refresh failed; the expired record is served unchanged.
    StaleServed(CachedRate),
    Created(CachedRate),
    /// Miss and the provider failed; nothing was written.
    Unavailable { code: String },
}

impl RateOutcome {
    fn amount(&self) -> Option<f64> {
        match self {
            RateOutcome::BaseConstant | RateOutcome::Unavailable { .. } => None,
            RateOutcome::HitFresh(r)
            | RateOutcome::Refreshed(r)
            | RateOutcome::StaleServed(r)
            | RateOutcome::Created(r) => Some(r.amount),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuoteSettings {
    pub cake_price_kzt: f64,
    pub base_currency: String,
    pub ttl: Duration,
    pub reference_currency: String,
    pub wage_year: i32,
    pub wage_unit: String,
}

impl From<&AppConfig> for QuoteSettings {
    fn from(config: &AppConfig) -> Self {
        QuoteSettings {
            cake_price_kzt: config.cake_price_kzt,
            base_currency: config.base_currency.to_uppercase(),
            ttl: config.ttl(),
            reference_currency: config.reference_currency.to_uppercase(),
            wage_year: config.wage_year,
            wage_unit: config.wage_unit.clone(),
        }
    }
}

pub struct RateDispatcher {
    rates: Arc<dyn RateStore>,
    wages: Arc<dyn WageStore>,
    provider: Arc<dyn RateProvider>,
    settings: QuoteSettings,
}

impl RateDispatcher {
    pub fn new(
        rates: Arc<dyn RateStore>,
        wages: Arc<dyn WageStore>,
        provider: Arc<dyn RateProvider>,
        settings: QuoteSettings,
    ) -> Self {
        Self {
            rates,
            wages,
            provider,
            settings,
        }
    }

    /// Serves the resolved request. At least one argument is expected to
    /// be present; the resolver rejects fully unrecognized input before
    /// it gets here.
    pub async fn serve(&self, currency: Option<&str>, country: Option<&str>) -> String {
        let currency_text = async {
            match currency {
                Some(code) => Some(self.currency_segment(code).await),
                None => None,
            }
        };
        let salary_text = async {
            match country {
                Some(iso3) => Some(self.salary_segment(iso3).await),
                None => None,
            }
        };
        let (currency_text, salary_text) = tokio::join!(currency_text, salary_text);

        let parts: Vec<String> = [currency_text, salary_text].into_iter().flatten().collect();
        if parts.is_empty() {
            return card::unrecognized_hint();
        }
        parts.join("\n\n")
    }

    async fn currency_segment(&self, code: &str) -> String {
        let outcome = self.resolve_rate(code).await;
        debug!("Currency segment for {} ended as {:?}", code, outcome);
        self.render_rate(&outcome)
    }

    /// One cache-aside pass for `code`: fresh hit, stale refresh with
    /// fallback to the expired record, or miss with a create attempt.
    async fn resolve_rate(&self, code: &str) -> RateOutcome {
        let code = code.trim().to_uppercase();
        if code == self.settings.base_currency {
            return RateOutcome::BaseConstant;
        }

        // A failed read degrades to the miss path rather than aborting.
        let cached = match self.rates.get(&code).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Rate store read failed for {}: {}", code, e);
                None
            }
        };

        match cached {
            Some(record) if record.age(Utc::now()) <= self.settings.ttl => {
                RateOutcome::HitFresh(record)
            }
            Some(record) => match self.provider.fetch_rate(&code).await {
                Some(amount) => {
                    self.store_amount(&code, amount).await;
                    RateOutcome::Refreshed(CachedRate {
                        code,
                        amount,
                        observed_at: Utc::now(),
                    })
                }
                None => RateOutcome::StaleServed(record),
            },
            None => match self.provider.fetch_rate(&code).await {
                Some(amount) => {
                    self.store_amount(&code, amount).await;
                    RateOutcome::Created(CachedRate {
                        code,
                        amount,
                        observed_at: Utc::now(),
                    })
                }
                None => RateOutcome::Unavailable { code },
            },
        }
    }

    async fn store_amount(&self, code: &str, amount: f64) {
        if let Err(e) = self.rates.put(code, amount).await {
            warn!("Rate store write failed for {}: {}", code, e);
        }
    }

    fn render_rate(&self, outcome: &RateOutcome) -> String {
        let price = card::fmt_amount(self.settings.cake_price_kzt);
        let base = &self.settings.base_currency;
        match outcome {
            RateOutcome::BaseConstant => {
                format!("Cache • 1 cake = {price} {base} (constant)")
            }
            RateOutcome::HitFresh(r) => format!(
                "Cache • {price} {base} = {} {} (updated: {})",
                card::fmt_amount(r.amount),
                r.code,
                card::fmt_ts(r.observed_at)
            ),
            RateOutcome::Refreshed(r) => format!(
                "Refreshed • {price} {base} = {} {} (updated: {})",
                card::fmt_amount(r.amount),
                r.code,
                card::fmt_ts(r.observed_at)
            ),
            RateOutcome::Created(r) => format!(
                "Created • {price} {base} = {} {} (updated: {})",
                card::fmt_amount(r.amount),
                r.code,
                card::fmt_ts(r.observed_at)
            ),
            RateOutcome::StaleServed(r) => format!(
                "Service unavailable. Showing cached {} {} (updated: {})",
                card::fmt_amount(r.amount),
                r.code,
                card::fmt_ts(r.observed_at)
            ),
            RateOutcome::Unavailable { code } => {
                format!("Service unavailable, no cached data for {code}.")
            }
        }
    }

    async fn salary_segment(&self, iso3: &str) -> String {
        let iso3 = iso3.trim().to_uppercase();
        let reference = self.settings.reference_currency.clone();

        // The cake price in the reference unit goes through the same
        // cache-aside path; a stale quote is acceptable here.
        let reference_outcome = self.resolve_rate(&reference).await;
        let cake_price_in_unit = match &reference_outcome {
            RateOutcome::BaseConstant => Some(self.settings.cake_price_kzt),
            other => other.amount(),
        };
        let Some(cake_price_in_unit) = cake_price_in_unit else {
            return card::wage_rate_unavailable(&reference);
        };

        let (year, unit) = (self.settings.wage_year, self.settings.wage_unit.clone());
        let record = match self.wages.get(&iso3, year, &unit).await {
            Ok(Some(record)) => record,
            Ok(None) => return card::wage_missing(&iso3, year, &unit),
            Err(e) => {
                warn!("Wage store read failed for {}: {}", iso3, e);
                return card::wage_missing(&iso3, year, &unit);
            }
        };

        let kzt_per_unit = self.settings.cake_price_kzt / cake_price_in_unit;
        let calc = match salary::compute(record.value, kzt_per_unit, self.settings.cake_price_kzt) {
            Ok(calc) => calc,
            Err(e) => {
                debug!("Salary computation rejected for {}: {}", iso3, e);
                return card::salary_failed(record.country.as_deref().unwrap_or(&iso3));
            }
        };

        // Write-back is best effort; the card renders either way.
        let patch = WagePatch {
            cake_salary: Some(calc.cake_salary),
            salary_kzt: Some(calc.salary_kzt),
            updated_at: Some(calc.computed_at),
        };
        if let Err(e) = self.wages.upsert(&iso3, year, &unit, patch).await {
            warn!("Wage write-back failed for {}: {}", iso3, e);
        }

        card::salary_card(&record, &calc)
    }
}
