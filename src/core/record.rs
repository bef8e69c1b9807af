//! Record business logic - Handles creating, reading, updating, deleting and paging records.
//!
//! Every operation is scoped to the owning user: a record that belongs to someone else
//! behaves exactly like one that does not exist. Amounts arrive as string-encoded positive
//! integers and are validated here before anything touches the database. The exchange
//! rate to the base currency is captured when a record is created and again whenever its
//! currency or date changes.

use crate::{
    core::{
        account, category,
        exchange_rate::{self, RateContext},
    },
    entities::{ImageUrls, Record, RecordType, record},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Select, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Most receipt images a record can carry.
pub const MAX_IMAGES: usize = 5;
/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Largest page size accepted.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Fields of a new record as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecord {
    /// Expense or income
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// When the money moved
    pub date: DateTime<Utc>,
    /// String-encoded positive integer
    pub amount: String,
    /// ISO currency code
    pub currency: String,
    /// Category to file under
    pub category_id: i64,
    /// Account the money moved through
    pub account_id: i64,
    /// Optional note
    #[serde(default)]
    pub note: Option<String>,
    /// Receipt image URLs
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update of a record; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordUpdate {
    /// New type
    #[serde(default, rename = "type")]
    pub record_type: Option<RecordType>,
    /// New date
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// New amount, string-encoded
    #[serde(default)]
    pub amount: Option<String>,
    /// New currency
    #[serde(default)]
    pub currency: Option<String>,
    /// New category
    #[serde(default)]
    pub category_id: Option<i64>,
    /// New account
    #[serde(default)]
    pub account_id: Option<i64>,
    /// New note; an empty string clears it
    #[serde(default)]
    pub note: Option<String>,
    /// Replacement image list
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

/// Narrows which records are listed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    /// Only records on or after this instant
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Only records on or before this instant
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Only expenses or only income
    #[serde(default, rename = "type")]
    pub record_type: Option<RecordType>,
    /// Only this category
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Only this account
    #[serde(default)]
    pub account_id: Option<i64>,
}

/// One page of records, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct RecordPage {
    /// The records on this page
    pub records: Vec<record::Model>,
    /// Cursor for the next page: the date of this page's last record
    pub next_cursor: Option<DateTime<Utc>>,
    /// False once a page comes back shorter than the page size
    pub has_more: bool,
}

/// Parses a string-encoded amount, which must be a positive integer.
///
/// # Errors
/// `Error::InvalidAmount` for anything that is not a plain run of digits with a value
/// greater than zero that fits an `i64`.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let invalid = || Error::InvalidAmount {
        amount: raw.to_string(),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: i64 = trimmed.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }
    Ok(amount)
}

/// Normalizes a three-letter currency code to upper case.
pub fn normalize_currency(raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(Error::Validation {
            field: "currency",
            message: format!("expected a three-letter currency code, got {raw:?}"),
        });
    }
    Ok(code.to_ascii_uppercase())
}

/// Validates the receipt image list: at most [`MAX_IMAGES`], no blank entries.
pub fn validate_images(images: Vec<String>) -> Result<ImageUrls> {
    if images.len() > MAX_IMAGES {
        return Err(Error::TooManyImages {
            count: images.len(),
            max: MAX_IMAGES,
        });
    }
    let images: Vec<String> = images.into_iter().map(|url| url.trim().to_string()).collect();
    if images.iter().any(String::is_empty) {
        return Err(Error::Validation {
            field: "images",
            message: "image URLs cannot be empty".to_string(),
        });
    }
    Ok(ImageUrls(images))
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Checks that `user_id` can file records under the category and that its type matches.
async fn check_category(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: i64,
    record_type: RecordType,
) -> Result<()> {
    let category = category::get_visible_category(db, user_id, category_id).await?;
    if category.record_type != record_type.as_str() {
        return Err(Error::Validation {
            field: "category_id",
            message: format!(
                "category {} is for {} records, not {}",
                category.name, category.record_type, record_type
            ),
        });
    }
    Ok(())
}

/// Creates a record for `user_id`, snapshotting the exchange rate for its date.
///
/// The category and account must be visible to the user, and the category must be of the
/// same type as the record.
pub async fn create_record(
    db: &DatabaseConnection,
    rates: RateContext<'_>,
    user_id: &str,
    input: NewRecord,
) -> Result<record::Model> {
    // Validate before any I/O
    let amount = parse_amount(&input.amount)?;
    let currency = normalize_currency(&input.currency)?;
    let images = validate_images(input.images)?;

    check_category(db, user_id, input.category_id, input.record_type).await?;
    account::get_visible_account(db, user_id, input.account_id).await?;

    let exchange_rate =
        exchange_rate::rate_for_record(db, rates, &currency, input.date).await?;

    let now = Utc::now();
    let record = record::ActiveModel {
        user_id: Set(user_id.to_string()),
        record_type: Set(input.record_type.as_str().to_string()),
        date: Set(input.date),
        amount: Set(amount),
        currency: Set(currency),
        exchange_rate: Set(exchange_rate),
        category_id: Set(input.category_id),
        account_id: Set(input.account_id),
        note: Set(normalize_note(input.note)),
        images: Set(images),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = record.insert(db).await?;
    debug!(id = result.id, user_id, amount, "record created");
    Ok(result)
}

/// Retrieves one of `user_id`'s records.
pub async fn get_record(
    db: &DatabaseConnection,
    user_id: &str,
    record_id: i64,
) -> Result<record::Model> {
    Record::find_by_id(record_id)
        .filter(record::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(Error::RecordNotFound { id: record_id })
}

/// Applies a partial update to one of `user_id`'s records.
///
/// A changed currency or date re-captures the exchange rate. A changed type or category
/// re-checks that the two agree.
pub async fn update_record(
    db: &DatabaseConnection,
    rates: RateContext<'_>,
    user_id: &str,
    record_id: i64,
    update: RecordUpdate,
) -> Result<record::Model> {
    let existing = get_record(db, user_id, record_id).await?;

    let amount = update.amount.as_deref().map(parse_amount).transpose()?;
    let currency = update
        .currency
        .as_deref()
        .map(normalize_currency)
        .transpose()?;
    let images = update.images.map(validate_images).transpose()?;

    let record_type = match update.record_type {
        Some(t) => t,
        None => existing.record_type.parse()?,
    };
    let category_id = update.category_id.unwrap_or(existing.category_id);
    if update.category_id.is_some() || update.record_type.is_some() {
        check_category(db, user_id, category_id, record_type).await?;
    }
    if let Some(account_id) = update.account_id {
        account::get_visible_account(db, user_id, account_id).await?;
    }

    let new_currency = currency.clone().unwrap_or_else(|| existing.currency.clone());
    let new_date = update.date.unwrap_or(existing.date);
    let rate_changed = new_currency != existing.currency || new_date != existing.date;
    let exchange_rate = if rate_changed {
        Some(exchange_rate::rate_for_record(db, rates, &new_currency, new_date).await?)
    } else {
        None
    };

    let mut active_model: record::ActiveModel = existing.into();
    active_model.record_type = Set(record_type.as_str().to_string());
    active_model.category_id = Set(category_id);
    if let Some(amount) = amount {
        active_model.amount = Set(amount);
    }
    if let Some(currency) = currency {
        active_model.currency = Set(currency);
    }
    if let Some(date) = update.date {
        active_model.date = Set(date);
    }
    if let Some(rate) = exchange_rate {
        active_model.exchange_rate = Set(rate);
    }
    if let Some(account_id) = update.account_id {
        active_model.account_id = Set(account_id);
    }
    if update.note.is_some() {
        active_model.note = Set(normalize_note(update.note));
    }
    if let Some(images) = images {
        active_model.images = Set(images);
    }
    active_model.updated_at = Set(Utc::now());

    let result = active_model.update(db).await?;
    debug!(id = result.id, user_id, "record updated");
    Ok(result)
}

/// Deletes one of `user_id`'s records.
pub async fn delete_record(db: &DatabaseConnection, user_id: &str, record_id: i64) -> Result<()> {
    let record = get_record(db, user_id, record_id).await?;
    record.delete(db).await?;
    debug!(record_id, user_id, "record deleted");
    Ok(())
}

/// Clamps a requested page size into `1..=MAX_PAGE_SIZE`.
#[must_use]
pub fn clamp_page_size(requested: Option<u64>) -> u64 {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// `user_id`'s records narrowed by `filter`, newest first (id descending for equal dates).
fn filtered_query(user_id: &str, filter: &RecordFilter) -> Select<Record> {
    let mut query = Record::find().filter(record::Column::UserId.eq(user_id));

    if let Some(from) = filter.from {
        query = query.filter(record::Column::Date.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(record::Column::Date.lte(to));
    }
    if let Some(record_type) = filter.record_type {
        query = query.filter(record::Column::RecordType.eq(record_type.as_str()));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(record::Column::CategoryId.eq(category_id));
    }
    if let Some(account_id) = filter.account_id {
        query = query.filter(record::Column::AccountId.eq(account_id));
    }

    query
        .order_by_desc(record::Column::Date)
        .order_by_desc(record::Column::Id)
}

/// Fetches one page of `user_id`'s records, newest first.
///
/// With a cursor, only records dated at or before it are returned. The cursor is
/// inclusive, so a page can repeat records from the end of the previous one when several
/// share a date; [`merge_pages`] drops those.
pub async fn list_records_page(
    db: &DatabaseConnection,
    user_id: &str,
    filter: &RecordFilter,
    cursor: Option<DateTime<Utc>>,
    page_size: u64,
) -> Result<RecordPage> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut query = filtered_query(user_id, filter);
    if let Some(cursor) = cursor {
        query = query.filter(record::Column::Date.lte(cursor));
    }

    let records = query.limit(page_size).all(db).await?;

    let has_more = records.len() as u64 == page_size;
    let next_cursor = records.last().map(|r| r.date);
    Ok(RecordPage {
        records,
        next_cursor,
        has_more,
    })
}

/// Loads every record of `user_id` matching `filter` in one query, newest first.
///
/// Reports aggregate over this rather than the date-cursor pages, which cannot get past
/// more than a page worth of records sharing one date.
pub async fn load_filtered_records(
    db: &DatabaseConnection,
    user_id: &str,
    filter: &RecordFilter,
) -> Result<Vec<record::Model>> {
    Ok(filtered_query(user_id, filter).all(db).await?)
}

/// Appends `page` to `existing`, skipping ids already present, and keeps the result
/// ordered by date descending (id descending for equal dates).
#[must_use]
pub fn merge_pages(existing: Vec<record::Model>, page: Vec<record::Model>) -> Vec<record::Model> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(existing.len() + page.len());
    let mut merged: Vec<record::Model> = existing
        .into_iter()
        .chain(page)
        .filter(|r| seen.insert(r.id))
        .collect();
    merged.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    merged
}

/// Walks every page matching `filter` and returns the merged list, the way a client
/// scrolling the listing would.
///
/// Stops when a page is short or adds no new records.
pub async fn fetch_all_records(
    db: &DatabaseConnection,
    user_id: &str,
    filter: &RecordFilter,
    page_size: u64,
) -> Result<Vec<record::Model>> {
    let mut all = Vec::new();
    let mut cursor = None;
    loop {
        let page = list_records_page(db, user_id, filter, cursor, page_size).await?;
        let before = all.len();
        all = merge_pages(all, page.records);
        if !page.has_more || all.len() == before {
            break;
        }
        cursor = page.next_cursor;
    }
    Ok(all)
}
