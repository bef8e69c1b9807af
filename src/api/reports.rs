//! Chart and summary endpoints over the caller's records.

use super::{AppState, auth::CurrentUser};
use crate::{
    core::{
        period::Period,
        record::RecordFilter,
        report::{self, ChartReport, GroupBy, PeriodTotal, Summary},
    },
    entities::RecordType,
    errors::Result,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Query string shared by the report endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Only records on or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only records on or before this instant
    pub to: Option<DateTime<Utc>>,
    /// Only expenses or only income
    #[serde(rename = "type")]
    pub record_type: Option<RecordType>,
    /// Bucket size for `/periods`; month when omitted
    #[serde(default)]
    pub period: Period,
}

impl ReportQuery {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            from: self.from,
            to: self.to,
            record_type: self.record_type,
            ..RecordFilter::default()
        }
    }
}

/// `GET /api/reports/summary`: income, expense and balance.
pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Summary>> {
    let summary = report::generate_summary(&state.db, user.id(), &query.filter()).await?;
    Ok(Json(summary))
}

/// `GET /api/reports/categories`: chart slices per category.
pub async fn by_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ChartReport>> {
    let chart =
        report::generate_report(&state.db, user.id(), &query.filter(), GroupBy::Category).await?;
    Ok(Json(chart))
}

/// `GET /api/reports/accounts`: chart slices per account.
pub async fn by_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ChartReport>> {
    let chart =
        report::generate_report(&state.db, user.id(), &query.filter(), GroupBy::Account).await?;
    Ok(Json(chart))
}

/// `GET /api/reports/periods`: income and expense per day or month.
pub async fn by_period(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<PeriodTotal>>> {
    let totals =
        report::generate_period_report(&state.db, user.id(), &query.filter(), query.period).await?;
    Ok(Json(totals))
}
