//! Category endpoints: list, create and delete.

use super::{AppState, auth::CurrentUser};
use crate::{
    core::{category, visibility::DeleteAction},
    entities::{CategoryModel, RecordType},
    errors::Result,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Query string of `GET /api/categories`.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Only categories of this type
    #[serde(rename = "type")]
    pub record_type: Option<RecordType>,
}

/// Body of `POST /api/categories`.
#[derive(Debug, Deserialize)]
pub struct NewCategory {
    /// Display name
    pub name: String,
    /// Icon name; blank picks the default
    #[serde(default)]
    pub icon: String,
    /// Expense or income
    #[serde(rename = "type")]
    pub record_type: RecordType,
}

/// A category as the client sees it.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Icon name
    pub icon: String,
    /// `"expense"` or `"income"`
    #[serde(rename = "type")]
    pub record_type: String,
    /// Whether this is a shared default rather than the caller's own
    pub system: bool,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(model: CategoryModel) -> Self {
        let system = crate::core::visibility::SharedItem::is_system(&model);
        Self {
            id: model.id,
            name: model.name,
            icon: model.icon,
            record_type: model.record_type,
            system,
        }
    }
}

/// Result of deleting a category or account.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always true; failures use the error body
    pub success: bool,
    /// `"hidden"` for a shared item, `"removed"` for the caller's own
    pub action: &'static str,
}

impl From<DeleteAction> for DeleteResponse {
    fn from(action: DeleteAction) -> Self {
        Self {
            success: true,
            action: match action {
                DeleteAction::Hide => "hidden",
                DeleteAction::Remove => "removed",
            },
        }
    }
}

/// `GET /api/categories`: the caller's visible categories, optionally of one type.
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = category::list_visible_categories(&state.db, user.id(), query.record_type).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// `POST /api/categories`: creates a category owned by the caller.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewCategory>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let created =
        category::create_category(&state.db, user.id(), &body.name, &body.icon, body.record_type)
            .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// `DELETE /api/categories/:id`: hides a shared category or removes the caller's own.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    let action = category::delete_category(&state.db, user.id(), id).await?;
    Ok(Json(action.into()))
}
