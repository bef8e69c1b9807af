//! Implements the `RateProvider` trait with quotes held in memory.
//!
//! Used by tests and when no rate API key is configured, so the whole service can run
//! without network access.

use super::RateProvider;
use crate::core::period::YearMonth;
use crate::entities::RateQuotes;
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves the same quotes for every month and counts how often it was asked.
#[derive(Debug, Default)]
pub struct StaticRateProvider {
    quotes: BTreeMap<String, f64>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticRateProvider {
    /// Creates a provider serving `quotes`, given as `(pair, rate)` like `("USDTWD", 31.0)`.
    #[must_use]
    pub fn new<'a>(quotes: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            quotes: quotes
                .into_iter()
                .map(|(pair, rate)| (pair.to_string(), rate))
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose every fetch fails, for exercising error paths.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `fetch_quotes` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RateProvider for StaticRateProvider {
    async fn fetch_quotes(&self, source: &str, year_month: YearMonth) -> Result<RateQuotes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::RateApi {
                message: format!("static provider configured to fail ({year_month})"),
            });
        }
        let quotes = RateQuotes(
            self.quotes
                .iter()
                .filter(|(pair, _)| pair.starts_with(source))
                .map(|(pair, rate)| (pair.clone(), *rate))
                .collect(),
        );
        if quotes.0.is_empty() {
            return Err(Error::RateApi {
                message: format!("no static quotes from {source} ({year_month})"),
            });
        }
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    fn may() -> YearMonth {
        YearMonth::new(2024, 5).unwrap()
    }

    #[tokio::test]
    async fn test_filters_by_source() {
        let provider = StaticRateProvider::new([("USDTWD", 32.0), ("EURTWD", 35.0)]);
        let quotes = provider.fetch_quotes("USD", may()).await.unwrap();
        assert_eq!(quotes.0.len(), 1);
        assert_eq!(quotes.0["USDTWD"], 32.0);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_and_failing_providers_error() {
        let empty = StaticRateProvider::default();
        assert!(matches!(
            empty.fetch_quotes("USD", may()).await,
            Err(Error::RateApi { .. })
        ));

        let failing = StaticRateProvider::failing();
        assert!(failing.fetch_quotes("USD", may()).await.is_err());
        assert_eq!(failing.calls(), 1);
    }
}
