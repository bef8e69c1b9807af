//! Report generation business logic.
//!
//! This module provides the aggregation behind the charts: totals per category, per
//! account and per time bucket, plus an income/expense summary. Amounts are converted to
//! the base currency with each record's stored exchange rate before summing. The
//! aggregation functions are pure; [`generate_report`] loads the records and labels and
//! hands them over.

use crate::{
    core::{
        account::{self, DELETED_ACCOUNT_LABEL},
        category::{self, DELETED_CATEGORY_LABEL},
        exchange_rate::convert,
        period::Period,
        record::{self, RecordFilter},
    },
    entities::{RecordType, record as record_entity},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One slice of a category or account chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    /// Category or account id
    pub id: i64,
    /// Display label, or the deleted placeholder
    pub label: String,
    /// Sum in the base currency
    pub total: f64,
    /// Share of the grand total, 0-100, two decimals
    pub percentage: f64,
    /// Number of records in the slice
    pub count: usize,
}

/// A category or account chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartReport {
    /// Slices, largest first
    pub slices: Vec<ChartSlice>,
    /// Sum over all slices
    pub grand_total: f64,
}

/// Income and expense totals for one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    /// `YYYY-MM-DD` or `YYYY-MM`
    pub bucket: String,
    /// Income in the base currency
    pub income: f64,
    /// Expenses in the base currency
    pub expense: f64,
    /// Number of records in the bucket
    pub count: usize,
}

/// Income, expense and net balance over a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Total income in the base currency
    pub income: f64,
    /// Total expenses in the base currency
    pub expense: f64,
    /// `income - expense`
    pub balance: f64,
    /// Number of records
    pub count: usize,
}

/// Which dimension a chart groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// Per category
    Category,
    /// Per account
    Account,
}

/// A record's amount in the base currency.
#[must_use]
pub fn converted_amount(record: &record_entity::Model) -> f64 {
    convert(record.amount, record.exchange_rate)
}

/// Rounds to two decimals for display.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `total`, rounded to two decimals; 0 when the total is 0.
#[must_use]
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    round2(part / total * 100.0)
}

fn aggregate_by<F>(
    records: &[record_entity::Model],
    key: F,
    labels: &HashMap<i64, String>,
    missing_label: &str,
) -> ChartReport
where
    F: Fn(&record_entity::Model) -> i64,
{
    let mut groups: HashMap<i64, (f64, usize)> = HashMap::new();
    for record in records {
        let entry = groups.entry(key(record)).or_insert((0.0, 0));
        entry.0 += converted_amount(record);
        entry.1 += 1;
    }

    let grand_total: f64 = groups.values().map(|(total, _)| total).sum();

    let mut slices: Vec<ChartSlice> = groups
        .into_iter()
        .map(|(id, (total, count))| ChartSlice {
            id,
            label: labels
                .get(&id)
                .cloned()
                .unwrap_or_else(|| missing_label.to_string()),
            total,
            percentage: percentage(total, grand_total),
            count,
        })
        .collect();

    slices.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.id.cmp(&b.id))
    });

    ChartReport {
        slices,
        grand_total,
    }
}

/// Groups records by category and sums their converted amounts.
///
/// Categories missing from `labels` (deleted or hidden) are labelled
/// [`DELETED_CATEGORY_LABEL`].
#[must_use]
pub fn aggregate_by_category(
    records: &[record_entity::Model],
    labels: &HashMap<i64, String>,
) -> ChartReport {
    aggregate_by(records, |r| r.category_id, labels, DELETED_CATEGORY_LABEL)
}

/// Groups records by account and sums their converted amounts.
#[must_use]
pub fn aggregate_by_account(
    records: &[record_entity::Model],
    labels: &HashMap<i64, String>,
) -> ChartReport {
    aggregate_by(records, |r| r.account_id, labels, DELETED_ACCOUNT_LABEL)
}

/// Totals per time bucket, oldest bucket first.
#[must_use]
pub fn aggregate_by_period(records: &[record_entity::Model], period: Period) -> Vec<PeriodTotal> {
    let mut buckets: BTreeMap<String, PeriodTotal> = BTreeMap::new();
    for record in records {
        let bucket = period.bucket(record.date);
        let entry = buckets.entry(bucket.clone()).or_insert_with(|| PeriodTotal {
            bucket,
            income: 0.0,
            expense: 0.0,
            count: 0,
        });
        if record.record_type == RecordType::Income.as_str() {
            entry.income += converted_amount(record);
        } else {
            entry.expense += converted_amount(record);
        }
        entry.count += 1;
    }
    buckets.into_values().collect()
}

/// Income, expense and balance over `records`.
#[must_use]
pub fn summarize(records: &[record_entity::Model]) -> Summary {
    let mut summary = Summary::default();
    for record in records {
        if record.record_type == RecordType::Income.as_str() {
            summary.income += converted_amount(record);
        } else {
            summary.expense += converted_amount(record);
        }
        summary.count += 1;
    }
    summary.balance = summary.income - summary.expense;
    summary
}

/// Loads `user_id`'s records matching `filter` and builds a category or account chart.
pub async fn generate_report(
    db: &DatabaseConnection,
    user_id: &str,
    filter: &RecordFilter,
    group_by: GroupBy,
) -> Result<ChartReport> {
    let records = record::load_filtered_records(db, user_id, filter).await?;
    let report = match group_by {
        GroupBy::Category => {
            let labels = category::category_labels(db, user_id).await?;
            aggregate_by_category(&records, &labels)
        }
        GroupBy::Account => {
            let labels = account::account_labels(db, user_id).await?;
            aggregate_by_account(&records, &labels)
        }
    };
    Ok(report)
}

/// Loads `user_id`'s records matching `filter` and totals them per time bucket.
pub async fn generate_period_report(
    db: &DatabaseConnection,
    user_id: &str,
    filter: &RecordFilter,
    period: Period,
) -> Result<Vec<PeriodTotal>> {
    let records = record::load_filtered_records(db, user_id, filter).await?;
    Ok(aggregate_by_period(&records, period))
}

/// Loads `user_id`'s records matching `filter` and summarizes them.
pub async fn generate_summary(
    db: &DatabaseConnection,
    user_id: &str,
    filter: &RecordFilter,
) -> Result<Summary> {
    let records = record::load_filtered_records(db, user_id, filter).await?;
    Ok(summarize(&records))
}
