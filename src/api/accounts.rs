//! Account endpoints: list, create and delete.

use super::{AppState, auth::CurrentUser, categories::DeleteResponse};
use crate::{core::account, entities::AccountModel, errors::Result};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/accounts`.
#[derive(Debug, Deserialize)]
pub struct NewAccount {
    /// Display name
    pub name: String,
    /// Free-form kind such as `cash` or `credit`, stored lower-case
    #[serde(rename = "type", default = "default_account_type")]
    pub account_type: String,
}

fn default_account_type() -> String {
    "cash".to_string()
}

/// An account as the client sees it.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Account kind
    #[serde(rename = "type")]
    pub account_type: String,
    /// Whether this is a shared default rather than the caller's own
    pub system: bool,
}

impl From<AccountModel> for AccountResponse {
    fn from(model: AccountModel) -> Self {
        let system = crate::core::visibility::SharedItem::is_system(&model);
        Self {
            id: model.id,
            name: model.name,
            account_type: model.account_type,
            system,
        }
    }
}

/// `GET /api/accounts`: the caller's visible accounts, shared ones first.
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<AccountResponse>>> {
    let accounts = account::list_visible_accounts(&state.db, user.id()).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// `POST /api/accounts`: creates an account owned by the caller.
pub async fn create_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewAccount>,
) -> Result<(StatusCode, Json<AccountResponse>)> {
    let created = account::create_account(&state.db, user.id(), &body.name, &body.account_type).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// `DELETE /api/accounts/:id`: hides a shared account or removes the caller's own.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    let action = account::delete_account(&state.db, user.id(), id).await?;
    Ok(Json(action.into()))
}
