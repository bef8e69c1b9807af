//! Monthly exchange-rate refresh.
//!
//! Once per calendar month the current month's quotes are fetched from the rate provider
//! and written over that month's cache row. The date of the last refresh is kept in the
//! `system_state` table so that the job runs once per month no matter how often the
//! scheduler wakes up or how many times the service restarts.

use crate::{
    core::{exchange_rate, period::YearMonth},
    entities::{SystemState, system_state},
    errors::{Error, Result},
    rates::RateProvider,
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

const LAST_RATE_REFRESH_KEY: &str = "last_rate_refresh";

/// Outcome of one monthly refresh.
#[derive(Debug, Clone)]
pub struct RateRefreshResult {
    /// Month whose snapshot was written
    pub year_month: YearMonth,
    /// Number of quotes stored
    pub quote_count: usize,
    /// Date the refresh ran
    pub refreshed_on: NaiveDate,
}

/// Checks if a refresh is needed by comparing the last refresh date with `today`.
///
/// # Returns
/// * `Ok(true)` - No refresh recorded yet, or the last one was in an earlier month
/// * `Ok(false)` - Already refreshed this month
pub async fn is_rate_refresh_needed(db: &DatabaseConnection, today: NaiveDate) -> Result<bool> {
    let last_refresh = get_last_rate_refresh_date(db).await?;

    Ok(last_refresh.is_none_or(|last_date| {
        last_date.year() != today.year() || last_date.month() != today.month()
    }))
}

/// Retrieves the date of the last refresh from the `system_state` table.
pub async fn get_last_rate_refresh_date(db: &DatabaseConnection) -> Result<Option<NaiveDate>> {
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_RATE_REFRESH_KEY))
        .one(db)
        .await?;

    match state {
        Some(s) => NaiveDate::parse_from_str(&s.value, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| Error::Config {
                message: format!("Failed to parse last rate refresh date: {e}"),
            }),
        None => Ok(None),
    }
}

/// Records `date` as the last refresh date.
async fn set_last_rate_refresh_date<C>(db: &C, date: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    let date_str = date.format("%Y-%m-%d").to_string();
    let now = Utc::now().naive_utc();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_RATE_REFRESH_KEY))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(date_str);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(LAST_RATE_REFRESH_KEY.to_string()),
            value: Set(date_str),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Refreshes the snapshot for the month containing `today`, once per month.
///
/// The quotes are fetched before the database transaction starts; the snapshot and the
/// refresh date are then written together.
///
/// # Returns
/// * `Ok(Some(result))` - The snapshot was written
/// * `Ok(None)` - Already refreshed this month
#[instrument(skip(db, provider))]
pub async fn refresh_monthly_rates(
    db: &DatabaseConnection,
    provider: &dyn RateProvider,
    source: &str,
    today: NaiveDate,
) -> Result<Option<RateRefreshResult>> {
    if !is_rate_refresh_needed(db, today).await? {
        return Ok(None);
    }

    let year_month = YearMonth::from_date(today);
    let quotes = provider.fetch_quotes(source, year_month).await?;
    let quote_count = quotes.0.len();

    let txn = db.begin().await?;
    exchange_rate::store_monthly_rates(&txn, year_month, source, quotes).await?;
    set_last_rate_refresh_date(&txn, today).await?;
    txn.commit().await?;

    Ok(Some(RateRefreshResult {
        year_month,
        quote_count,
        refreshed_on: today,
    }))
}

/// Formats a refresh result for the log.
#[must_use]
pub fn format_refresh_summary(result: &RateRefreshResult) -> String {
    format!(
        "Exchange rates for {} refreshed on {} ({} quotes)",
        result.year_month,
        result.refreshed_on.format("%Y-%m-%d"),
        result.quote_count
    )
}

/// Runs one scheduler tick: refresh if due, log the outcome, never fail.
pub async fn run_scheduled_refresh(
    db: &DatabaseConnection,
    provider: &dyn RateProvider,
    source: &str,
) {
    let today = Utc::now().date_naive();
    match refresh_monthly_rates(db, provider, source, today).await {
        Ok(Some(result)) => info!("{}", format_refresh_summary(&result)),
        Ok(None) => debug!("exchange rates already refreshed this month"),
        Err(e) => error!("Monthly exchange rate refresh failed: {e}"),
    }
}

/// Spawns the background task that checks every `interval` whether a refresh is due.
pub fn spawn_rate_scheduler(
    db: Arc<DatabaseConnection>,
    provider: Arc<dyn RateProvider>,
    source: String,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            interval_secs = interval.as_secs(),
            "exchange rate scheduler started"
        );
        loop {
            ticker.tick().await;
            run_scheduled_refresh(&db, provider.as_ref(), &source).await;
        }
    })
}
