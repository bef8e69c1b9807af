//! Record endpoints. Amounts travel as decimal strings in both directions; each record in a
//! response carries the labels of its category and account as the caller sees them.

use super::{AppState, auth::CurrentUser};
use crate::{
    core::{
        account::{self, DELETED_ACCOUNT_LABEL},
        category::{self, DELETED_CATEGORY_LABEL},
        exchange_rate,
        record::{self, NewRecord, RecordFilter, RecordUpdate},
        report::round2,
    },
    entities::{RecordModel, RecordType},
    errors::Result,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query string of `GET /api/records`.
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    /// Inclusive upper bound on the date, from the previous page's `next_cursor`
    pub cursor: Option<DateTime<Utc>>,
    /// Page size, clamped to `1..=100`
    pub limit: Option<u64>,
    /// Only records on or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only records on or before this instant
    pub to: Option<DateTime<Utc>>,
    /// Only expenses or only income
    #[serde(rename = "type")]
    pub record_type: Option<RecordType>,
    /// Only this category
    pub category_id: Option<i64>,
    /// Only this account
    pub account_id: Option<i64>,
}

impl RecordsQuery {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            from: self.from,
            to: self.to,
            record_type: self.record_type,
            category_id: self.category_id,
            account_id: self.account_id,
        }
    }
}

/// A record as the client sees it.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    /// Record id
    pub id: i64,
    /// `"expense"` or `"income"`
    #[serde(rename = "type")]
    pub record_type: String,
    /// When the money moved
    pub date: DateTime<Utc>,
    /// Positive integer as a string
    pub amount: String,
    /// ISO currency code
    pub currency: String,
    /// Rate to the base currency captured for the record's month
    pub exchange_rate: f64,
    /// Amount in the base currency, rounded to cents
    pub converted_amount: f64,
    /// Category id, kept even when the category is gone
    pub category_id: i64,
    /// Category name, or the deleted placeholder
    pub category: String,
    /// Account id, kept even when the account is gone
    pub account_id: i64,
    /// Account name, or the deleted placeholder
    pub account: String,
    /// Optional note
    pub note: Option<String>,
    /// Receipt image URLs
    pub images: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Category and account names visible to one user.
struct Labels {
    categories: HashMap<i64, String>,
    accounts: HashMap<i64, String>,
}

impl Labels {
    async fn load(state: &AppState, user_id: &str) -> Result<Self> {
        Ok(Self {
            categories: category::category_labels(&state.db, user_id).await?,
            accounts: account::account_labels(&state.db, user_id).await?,
        })
    }

    fn respond(&self, model: RecordModel) -> RecordResponse {
        let category = self
            .categories
            .get(&model.category_id)
            .map_or(DELETED_CATEGORY_LABEL, String::as_str)
            .to_string();
        let account = self
            .accounts
            .get(&model.account_id)
            .map_or(DELETED_ACCOUNT_LABEL, String::as_str)
            .to_string();
        RecordResponse {
            id: model.id,
            record_type: model.record_type,
            date: model.date,
            amount: model.amount.to_string(),
            currency: model.currency,
            exchange_rate: model.exchange_rate,
            converted_amount: round2(exchange_rate::convert(model.amount, model.exchange_rate)),
            category_id: model.category_id,
            category,
            account_id: model.account_id,
            account,
            note: model.note,
            images: model.images.0,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// One page of records plus the cursor for the next.
#[derive(Debug, Serialize)]
pub struct RecordPageResponse {
    /// Records on this page, newest first
    pub records: Vec<RecordResponse>,
    /// Pass back as `cursor` to fetch the next page
    pub next_cursor: Option<DateTime<Utc>>,
    /// False once the last page has been reached
    pub has_more: bool,
}

/// `GET /api/records`: one page of the caller's records.
pub async fn list_records(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordPageResponse>> {
    let page_size = record::clamp_page_size(query.limit);
    let page =
        record::list_records_page(&state.db, user.id(), &query.filter(), query.cursor, page_size)
            .await?;
    let labels = Labels::load(&state, user.id()).await?;
    Ok(Json(RecordPageResponse {
        records: page.records.into_iter().map(|r| labels.respond(r)).collect(),
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    }))
}

/// `POST /api/records`: creates a record and snapshots its exchange rate.
pub async fn create_record(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewRecord>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    let created = record::create_record(&state.db, state.rate_context(), user.id(), body).await?;
    let labels = Labels::load(&state, user.id()).await?;
    Ok((StatusCode::CREATED, Json(labels.respond(created))))
}

/// `GET /api/records/:id`
pub async fn get_record(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<RecordResponse>> {
    let found = record::get_record(&state.db, user.id(), id).await?;
    let labels = Labels::load(&state, user.id()).await?;
    Ok(Json(labels.respond(found)))
}

/// `PUT /api/records/:id`: partial update; absent fields stay as they are.
pub async fn update_record(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<RecordUpdate>,
) -> Result<Json<RecordResponse>> {
    let updated = record::update_record(&state.db, state.rate_context(), user.id(), id, body).await?;
    let labels = Labels::load(&state, user.id()).await?;
    Ok(Json(labels.respond(updated)))
}

/// `DELETE /api/records/:id`
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    record::delete_record(&state.db, user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use crate::api::test_support::*;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    async fn ids(app: &axum::Router) -> (i64, i64) {
        let (_, cats) = send(app, "GET", "/api/categories?type=expense", Some(ALICE_TOKEN), None).await;
        let food = cats
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == "Food")
            .unwrap()["id"]
            .as_i64()
            .unwrap();
        let (_, accounts) = send(app, "GET", "/api/accounts", Some(ALICE_TOKEN), None).await;
        let cash = accounts
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["name"] == "Cash")
            .unwrap()["id"]
            .as_i64()
            .unwrap();
        (food, cash)
    }

    fn body(category_id: i64, account_id: i64, amount: &str, currency: &str, date: &str) -> Value {
        json!({
            "type": "expense",
            "date": date,
            "amount": amount,
            "currency": currency,
            "category_id": category_id,
            "account_id": account_id,
            "note": "lunch",
        })
    }

    #[tokio::test]
    async fn test_create_and_get_record() {
        let (app, _) = test_app().await;
        let (food, cash) = ids(&app).await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/records",
            Some(ALICE_TOKEN),
            Some(body(food, cash, "12", "USD", "2024-05-10T12:00:00Z")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["amount"], "12");
        assert_eq!(created["exchange_rate"], 32.0);
        assert_eq!(created["converted_amount"], 384.0);
        assert_eq!(created["category"], "Food");
        assert_eq!(created["account"], "Cash");

        let uri = format!("/api/records/{}", created["id"]);
        let (status, fetched) = send(&app, "GET", &uri, Some(ALICE_TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["note"], "lunch");

        // Other users cannot see it
        let (status, _) = send(&app, "GET", &uri, Some(BOB_TOKEN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_amount() {
        let (app, _) = test_app().await;
        let (food, cash) = ids(&app).await;

        for amount in ["0", "-5", "1.5", "abc"] {
            let (status, body) = send(
                &app,
                "POST",
                "/api/records",
                Some(ALICE_TOKEN),
                Some(body(food, cash, amount, "TWD", "2024-05-10T12:00:00Z")),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_record() {
        let (app, _) = test_app().await;
        let (food, cash) = ids(&app).await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/records",
            Some(ALICE_TOKEN),
            Some(body(food, cash, "500", "TWD", "2024-05-10T12:00:00Z")),
        )
        .await;
        assert_eq!(created["exchange_rate"], 1.0);
        let uri = format!("/api/records/{}", created["id"]);

        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            Some(ALICE_TOKEN),
            Some(json!({ "amount": "3", "currency": "usd" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["amount"], "3");
        assert_eq!(updated["currency"], "USD");
        assert_eq!(updated["exchange_rate"], 32.0);

        let (status, _) = send(&app, "DELETE", &uri, Some(ALICE_TOKEN), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &uri, Some(ALICE_TOKEN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_pages_with_cursor() {
        let (app, _) = test_app().await;
        let (food, cash) = ids(&app).await;

        for day in 1..=5 {
            let date = format!("2024-05-{day:02}T12:00:00Z");
            send(
                &app,
                "POST",
                "/api/records",
                Some(ALICE_TOKEN),
                Some(body(food, cash, "10", "TWD", &date)),
            )
            .await;
        }

        let (status, first) = send(&app, "GET", "/api/records?limit=2", Some(ALICE_TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["records"].as_array().unwrap().len(), 2);
        assert_eq!(first["has_more"], true);
        assert_eq!(first["records"][0]["date"], "2024-05-05T12:00:00Z");

        let cursor = first["next_cursor"].as_str().unwrap();
        let uri = format!("/api/records?limit=10&cursor={cursor}");
        let (_, rest) = send(&app, "GET", &uri, Some(ALICE_TOKEN), None).await;
        // Inclusive cursor: the boundary record appears again
        assert_eq!(rest["records"].as_array().unwrap().len(), 4);
        assert_eq!(rest["has_more"], false);

        let (_, bob) = send(&app, "GET", "/api/records", Some(BOB_TOKEN), None).await;
        assert!(bob["records"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hidden_category_shows_placeholder_label() {
        let (app, state) = test_app().await;
        let (food, cash) = ids(&app).await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/records",
            Some(ALICE_TOKEN),
            Some(body(food, cash, "80", "TWD", "2024-05-10T12:00:00Z")),
        )
        .await;

        let uri = format!("/api/categories/{food}");
        send(&app, "DELETE", &uri, Some(ALICE_TOKEN), None).await;

        let uri = format!("/api/records/{}", created["id"]);
        let (_, fetched) = send(&app, "GET", &uri, Some(ALICE_TOKEN), None).await;
        assert_eq!(fetched["category"], "Deleted category");
        assert_eq!(fetched["account"], "Cash");

        // The shared category is untouched for everyone else
        assert_eq!(find_category(&state.db, "Food").await.unwrap().id, food);
    }
}
