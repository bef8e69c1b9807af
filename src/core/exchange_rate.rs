//! Exchange-rate cache and currency conversion.
//!
//! Quotes are cached one row per calendar month (`YYYY-MM`). A month is fetched from the
//! [`RateProvider`] the first time it is asked for and read from the database afterwards.
//! There is no eviction. Concurrent writers for the same month resolve by upsert, so the
//! last write wins; the values are the same snapshot either way.

use crate::{
    core::period::YearMonth,
    entities::{ExchangeRate, RateQuotes, exchange_rate},
    errors::{Error, Result},
    rates::RateProvider,
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use tracing::{debug, info};

/// Where rates come from and which currencies they convert between.
#[derive(Clone, Copy)]
pub struct RateContext<'a> {
    /// Source of quotes for months not cached yet
    pub provider: &'a dyn RateProvider,
    /// Currency the provider quotes from
    pub source: &'a str,
    /// Currency records are converted into
    pub base: &'a str,
}

/// Looks up the cached snapshot for `year_month`.
pub async fn get_cached_rates<C>(db: &C, year_month: YearMonth) -> Result<Option<exchange_rate::Model>>
where
    C: ConnectionTrait,
{
    ExchangeRate::find()
        .filter(exchange_rate::Column::YearMonth.eq(year_month.to_string()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Writes the snapshot for `year_month`, replacing any existing one.
pub async fn store_monthly_rates<C>(
    db: &C,
    year_month: YearMonth,
    source: &str,
    quotes: RateQuotes,
) -> Result<exchange_rate::Model>
where
    C: ConnectionTrait,
{
    let row = exchange_rate::ActiveModel {
        year_month: Set(year_month.to_string()),
        source: Set(source.to_string()),
        quotes: Set(quotes),
        fetched_at: Set(Utc::now()),
        ..Default::default()
    };

    ExchangeRate::insert(row)
        .on_conflict(
            OnConflict::column(exchange_rate::Column::YearMonth)
                .update_columns([
                    exchange_rate::Column::Source,
                    exchange_rate::Column::Quotes,
                    exchange_rate::Column::FetchedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    get_cached_rates(db, year_month)
        .await?
        .ok_or_else(|| Error::Database {
            message: format!("exchange rates for {year_month} missing after write"),
        })
}

/// Returns the snapshot for `year_month`, fetching and caching it on first access.
///
/// # Errors
/// Provider failures surface as `Error::RateApi`; nothing is cached in that case.
pub async fn get_monthly_rates(
    db: &DatabaseConnection,
    provider: &dyn RateProvider,
    source: &str,
    year_month: YearMonth,
) -> Result<exchange_rate::Model> {
    if let Some(cached) = get_cached_rates(db, year_month).await? {
        debug!(%year_month, "exchange rates served from cache");
        return Ok(cached);
    }

    let quotes = provider.fetch_quotes(source, year_month).await?;
    info!(%year_month, quotes = quotes.0.len(), "caching exchange rates");
    store_monthly_rates(db, year_month, source, quotes).await
}

/// Rate that converts one unit of `from` into `to` using a month's snapshot.
///
/// Quotes are expressed from the snapshot's source currency, so the cross rate is
/// `quote(source→to) / quote(source→from)`; the source itself has an implicit quote of 1.
///
/// # Errors
/// `Error::RateUnavailable` when either currency has no usable quote.
pub fn cross_rate(rates: &exchange_rate::Model, from: &str, to: &str) -> Result<f64> {
    if from.eq_ignore_ascii_case(to) {
        return Ok(1.0);
    }
    let unavailable = || Error::RateUnavailable {
        from: from.to_string(),
        to: to.to_string(),
        year_month: rates.year_month.clone(),
    };
    let from_quote = source_quote(rates, from).ok_or_else(unavailable)?;
    let to_quote = source_quote(rates, to).ok_or_else(unavailable)?;
    Ok(to_quote / from_quote)
}

fn source_quote(rates: &exchange_rate::Model, currency: &str) -> Option<f64> {
    if rates.source.eq_ignore_ascii_case(currency) {
        return Some(1.0);
    }
    let key = format!("{}{}", rates.source, currency).to_ascii_uppercase();
    rates
        .quotes
        .0
        .get(&key)
        .copied()
        .filter(|q| q.is_finite() && *q > 0.0)
}

/// Converts an amount with a stored exchange rate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn convert(amount: i64, rate: f64) -> f64 {
    amount as f64 * rate
}

/// Exchange rate to snapshot on a record entered in `currency` on `date`.
///
/// Records already in the base currency get exactly 1 without touching the cache.
pub async fn rate_for_record(
    db: &DatabaseConnection,
    rates: RateContext<'_>,
    currency: &str,
    date: DateTime<Utc>,
) -> Result<f64> {
    if currency.eq_ignore_ascii_case(rates.base) {
        return Ok(1.0);
    }
    let year_month = YearMonth::from_datetime(date);
    let snapshot = get_monthly_rates(db, rates.provider, rates.source, year_month).await?;
    cross_rate(&snapshot, currency, rates.base)
}
