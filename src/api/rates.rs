//! Exchange-rate lookup.

use super::AppState;
use crate::{
    core::{exchange_rate, period::YearMonth},
    entities::ExchangeRateModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
};

/// `GET /api/rates/:year_month`: the month's snapshot, fetched on first access.
pub async fn get_rates(
    State(state): State<AppState>,
    Path(year_month): Path<String>,
) -> Result<Json<ExchangeRateModel>> {
    let year_month: YearMonth = year_month.parse()?;
    let snapshot = exchange_rate::get_monthly_rates(
        &state.db,
        state.rates.as_ref(),
        &state.settings.rate_source_currency,
        year_month,
    )
    .await?;
    Ok(Json(snapshot))
}
