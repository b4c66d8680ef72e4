use crate::providers::RateProvider;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the open.er-api.com quote endpoint. One GET returns every
/// rate against the base currency; the requested code is picked out of
/// the map and materialized against the cake price.
pub struct OpenErApiClient {
    base_url: String,
    base_currency: String,
    cake_price: f64,
}

#[derive(Debug, Deserialize)]
struct OpenErResponse {
    result: Option<String>,
    rates: HashMap<String, f64>,
}

impl OpenErApiClient {
    pub fn new(base_url: &str, base_currency: &str, cake_price: f64) -> Self {
        OpenErApiClient {
            base_url: base_url.to_string(),
            base_currency: base_currency.to_string(),
            cake_price,
        }
    }

    async fn request_rate(&self, code: &str) -> Result<f64> {
        let url = format!("{}/latest/{}", self.base_url, self.base_currency);
        debug!("Requesting rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("cakerate/0.1")
            .build()?;
        let response = client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .with_context(|| format!("Request error for {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} from {}", response.status(), url));
        }

        let data = response
            .json::<OpenErResponse>()
            .await
            .with_context(|| format!("Malformed rates payload from {url}"))?;

        if let Some(result) = &data.result {
            if result != "success" {
                return Err(anyhow!("Provider reported '{}' for {}", result, url));
            }
        }

        data.rates
            .get(code)
            .copied()
            .ok_or_else(|| anyhow!("No rate for {} in provider response", code))
    }
}

#[async_trait]
impl RateProvider for OpenErApiClient {
    async fn fetch_rate(&self, code: &str) -> Option<f64> {
        let code = code.trim().to_uppercase();
        match self.request_rate(&code).await {
            Ok(rate) => Some(self.cake_price * rate),
            Err(e) => {
                warn!("FX fetch failed for {}: {:#}", code, e);
                None
            }
        }
    }
}
