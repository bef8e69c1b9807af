//! Exchange-rate providers.
//!
//! [`RateProvider`] is the seam between the monthly cache and wherever quotes come from:
//! [`HttpRateProvider`] calls the external rate API, [`StaticRateProvider`] serves fixed
//! quotes for tests and offline runs.

mod http;
mod static_provider;

pub use http::HttpRateProvider;
pub use static_provider::StaticRateProvider;

use crate::core::period::YearMonth;
use crate::entities::RateQuotes;
use crate::errors::Result;

/// Something that can produce a month's currency quotes.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    /// Returns quotes keyed `SRCDST` for every currency the provider knows, expressed
    /// from `source`.
    async fn fetch_quotes(&self, source: &str, year_month: YearMonth) -> Result<RateQuotes>;
}
