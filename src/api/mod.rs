//! HTTP API layer - axum router, shared state and request handlers.
//!
//! Every route under `/api` except `/api/auth/session` requires an identity token, either
//! as `Authorization: Bearer <token>` or in the `session` cookie. Handlers parse the
//! request, call into [`crate::core`] and serialize the result; failures are rendered as
//! `{"success": false, "error": "..."}` with the status from [`Error::status_code`].

/// Shared account endpoints
pub mod accounts;
/// Identity tokens, session cookie and the authentication middleware
pub mod auth;
/// Shared category endpoints
pub mod categories;
/// Exchange-rate lookup endpoint
pub mod rates;
/// Record CRUD and paging endpoints
pub mod records;
/// Chart and summary endpoints
pub mod reports;

use crate::{
    config::Settings,
    core::exchange_rate::RateContext,
    errors::Error,
    rates::RateProvider,
};
use auth::IdentityVerifier;
use axum::{
    Json, Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Where uncached exchange-rate months come from
    pub rates: Arc<dyn RateProvider>,
    /// Runtime settings
    pub settings: Arc<Settings>,
    /// Configured identity tokens
    pub identities: Arc<IdentityVerifier>,
}

impl AppState {
    /// Creates the state shared by the router.
    pub fn new(
        db: Arc<DatabaseConnection>,
        rates: Arc<dyn RateProvider>,
        settings: Settings,
        identities: IdentityVerifier,
    ) -> Self {
        Self {
            db,
            rates,
            settings: Arc::new(settings),
            identities: Arc::new(identities),
        }
    }

    /// Conversion context for snapshotting record exchange rates.
    pub fn rate_context(&self) -> RateContext<'_> {
        RateContext {
            provider: self.rates.as_ref(),
            source: &self.settings.rate_source_currency,
            base: &self.settings.base_currency,
        }
    }
}

/// Builds the full router: `/health`, the session endpoints and the authenticated API.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            axum::routing::delete(categories::delete_category),
        )
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route("/accounts/:id", axum::routing::delete(accounts::delete_account))
        .route(
            "/records",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/records/:id",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/reports/summary", get(reports::summary))
        .route("/reports/categories", get(reports::by_category))
        .route("/reports/accounts", get(reports::by_account))
        .route("/reports/periods", get(reports::by_period))
        .route("/rates/:year_month", get(rates::get_rates))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    let api = Router::new()
        .route(
            "/auth/session",
            post(auth::create_session).delete(auth::delete_session),
        )
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, "request failed: {self}");
        } else {
            warn!(%status, "request rejected: {self}");
        }
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::test_support::*;
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_api_rejects_missing_and_bad_tokens() {
        let (app, _) = test_app().await;

        let (status, body) = send(&app, "GET", "/api/categories", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Unauthorized"));

        let (status, _) = send(&app, "GET", "/api/records", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_error_response_shape() {
        let response = Error::RecordNotFound { id: 7 }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
