pub mod open_er;

use async_trait::async_trait;

/// Live quote source for the materialized cake price.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Returns the price of one cake in `code`, or `None` on any
    /// upstream failure (transport error, bad status, malformed payload,
    /// unknown code). Failure is a normal return value, never an error.
    async fn fetch_rate(&self, code: &str) -> Option<f64>;
}
