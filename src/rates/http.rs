//! Implements the `RateProvider` trait against a currencylayer-style HTTP API.

use super::RateProvider;
use crate::core::period::YearMonth;
use crate::entities::RateQuotes;
use crate::errors::{Error, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetches quotes from a currencylayer-style API.
///
/// The current month (or a later one) comes from `GET {url}?access_key={key}&source={src}`.
/// Earlier months come from the sibling `historical` endpoint with `date` set to the first
/// of that month, so a month's snapshot never holds another month's quotes.
pub struct HttpRateProvider {
    client: reqwest::Client,
    live_url: String,
    historical_url: String,
    access_key: String,
}

/// Which endpoint serves a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Live,
    Historical(NaiveDate),
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    success: bool,
    #[serde(default)]
    quotes: BTreeMap<String, f64>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    info: String,
}

impl HttpRateProvider {
    /// Creates a provider for the live endpoint `url` authenticated with `access_key`.
    pub fn new(url: impl Into<String>, access_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let live_url = url.into();
        Ok(Self {
            client,
            historical_url: historical_url(&live_url),
            live_url,
            access_key: access_key.into(),
        })
    }

    async fn fetch_for(
        &self,
        source: &str,
        year_month: YearMonth,
        current: YearMonth,
    ) -> Result<RateQuotes> {
        let mut query = vec![
            ("access_key", self.access_key.clone()),
            ("source", source.to_string()),
        ];
        let url = match endpoint_for(year_month, current)? {
            Endpoint::Live => &self.live_url,
            Endpoint::Historical(date) => {
                query.push(("date", date.format("%Y-%m-%d").to_string()));
                &self.historical_url
            }
        };
        debug!(%year_month, source, %url, "fetching exchange rates");

        let response = self.client.get(url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::RateApi {
                message: format!("rate API returned status {status}: {body}"),
            });
        }

        let body: LiveResponse = response.json().await?;
        trace!(quotes = body.quotes.len(), "rate API responded");
        parse_live_response(body)
    }
}

#[async_trait::async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_quotes(&self, source: &str, year_month: YearMonth) -> Result<RateQuotes> {
        let current = YearMonth::from_date(Utc::now().date_naive());
        self.fetch_for(source, year_month, current).await
    }
}

/// The `historical` endpoint next to a `live` one; `{url}/historical` for anything else.
fn historical_url(live_url: &str) -> String {
    let trimmed = live_url.trim_end_matches('/');
    match trimmed.strip_suffix("live") {
        Some(base) if base.ends_with('/') => format!("{base}historical"),
        _ => format!("{trimmed}/historical"),
    }
}

/// Live quotes for the current month and later; the first of the month for earlier ones.
fn endpoint_for(year_month: YearMonth, current: YearMonth) -> Result<Endpoint> {
    if year_month >= current {
        return Ok(Endpoint::Live);
    }
    NaiveDate::from_ymd_opt(year_month.year(), year_month.month(), 1)
        .map(Endpoint::Historical)
        .ok_or_else(|| Error::RateApi {
            message: format!("no historical date for {year_month}"),
        })
}

fn parse_live_response(body: LiveResponse) -> Result<RateQuotes> {
    if !body.success {
        let info = body
            .error
            .map(|e| e.info)
            .filter(|info| !info.is_empty())
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(Error::RateApi { message: info });
    }
    if body.quotes.is_empty() {
        return Err(Error::RateApi {
            message: "response contained no quotes".to_string(),
        });
    }
    Ok(RateQuotes(body.quotes))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use axum::{Json, Router, extract::State, http::Uri};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_parse_successful_response() {
        let body: LiveResponse = serde_json::from_str(
            r#"{"success": true, "source": "USD", "quotes": {"USDTWD": 31.5, "USDJPY": 150.2}}"#,
        )
        .unwrap();
        let quotes = parse_live_response(body).unwrap();
        assert_eq!(quotes.0.len(), 2);
        assert_eq!(quotes.0["USDTWD"], 31.5);
    }

    #[test]
    fn test_parse_error_response() {
        let body: LiveResponse = serde_json::from_str(
            r#"{"success": false, "error": {"code": 101, "info": "invalid access key"}}"#,
        )
        .unwrap();
        let err = parse_live_response(body).unwrap_err();
        assert!(matches!(err, Error::RateApi { message } if message == "invalid access key"));
    }

    #[test]
    fn test_parse_empty_quotes() {
        let body: LiveResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(parse_live_response(body).is_err());
    }

    #[test]
    fn test_historical_url() {
        assert_eq!(
            historical_url("https://api.currencylayer.com/live"),
            "https://api.currencylayer.com/historical"
        );
        assert_eq!(
            historical_url("http://localhost:9000/rates/live/"),
            "http://localhost:9000/rates/historical"
        );
        assert_eq!(
            historical_url("http://localhost:9000/quotes"),
            "http://localhost:9000/quotes/historical"
        );
    }

    #[test]
    fn test_endpoint_for() {
        let may = YearMonth::new(2024, 5).unwrap();
        assert_eq!(endpoint_for(may, may).unwrap(), Endpoint::Live);
        assert_eq!(
            endpoint_for(YearMonth::new(2024, 6).unwrap(), may).unwrap(),
            Endpoint::Live
        );
        assert_eq!(
            endpoint_for(YearMonth::new(2023, 1).unwrap(), may).unwrap(),
            Endpoint::Historical(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
        );
    }

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Answers like the rate API: 30 from `historical`, 32 from anything else, and keeps
    /// every request target.
    async fn rate_api(State(seen): State<Seen>, uri: Uri) -> Json<serde_json::Value> {
        seen.lock().unwrap().push(uri.to_string());
        let rate = if uri.path().ends_with("/historical") { 30.0 } else { 32.0 };
        Json(json!({ "success": true, "source": "USD", "quotes": { "USDTWD": rate } }))
    }

    async fn serve_rate_api() -> (String, Seen) {
        let seen = Seen::default();
        let app = Router::new().fallback(rate_api).with_state(Arc::clone(&seen));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/api/live"), seen)
    }

    #[tokio::test]
    async fn test_past_month_uses_historical_endpoint() {
        let (url, seen) = serve_rate_api().await;
        let provider = HttpRateProvider::new(url, "secret").unwrap();
        let may = YearMonth::new(2024, 5).unwrap();

        let current = provider.fetch_for("USD", may, may).await.unwrap();
        assert_eq!(current.0["USDTWD"], 32.0);

        let april = provider
            .fetch_for("USD", YearMonth::new(2024, 4).unwrap(), may)
            .await
            .unwrap();
        assert_eq!(april.0["USDTWD"], 30.0);

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], "/api/live?access_key=secret&source=USD");
        assert_eq!(
            seen[1],
            "/api/historical?access_key=secret&source=USD&date=2024-04-01"
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_is_rate_api_error() {
        let provider = HttpRateProvider::new("http://127.0.0.1:9/live", "secret").unwrap();
        let may = YearMonth::new(2024, 5).unwrap();
        let result = provider.fetch_for("USD", may, may).await;
        assert!(matches!(result, Err(Error::RateApi { .. })));
    }
}
