use dotenvy::dotenv;
use moneybook::{
    api::{self, AppState, auth::IdentityVerifier},
    config::{self, Settings},
    core::{account, category, monthly},
    errors::Result,
    rates::{HttpRateProvider, RateProvider, StaticRateProvider},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Runtime settings and seed configuration
    let settings = Settings::from_env()
        .inspect_err(|e| error!("Invalid settings: {}", e))?;
    let app_config = config::seed::load_config_or_default(&settings.config_path)
        .inspect_err(|e| error!("Failed to load {}: {}", settings.config_path, e))?;

    // 4. Initialize database
    let db = config::database::create_connection(&settings.database_url)
        .await
        .map(Arc::new)
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed shared categories and accounts
    let seeded_categories = category::seed_system_categories(&db, &app_config.categories).await?;
    let seeded_accounts = account::seed_system_accounts(&db, &app_config.accounts).await?;
    info!(
        categories = seeded_categories,
        accounts = seeded_accounts,
        "Seed data applied."
    );

    // 6. Exchange-rate provider and the monthly refresh
    let provider: Arc<dyn RateProvider> = match &settings.rate_api_key {
        Some(key) => Arc::new(HttpRateProvider::new(&settings.rate_api_url, key)?),
        None => {
            warn!("RATE_API_KEY not set; foreign-currency records will be rejected");
            Arc::new(StaticRateProvider::default())
        }
    };
    let scheduler = monthly::spawn_rate_scheduler(
        Arc::clone(&db),
        Arc::clone(&provider),
        settings.rate_source_currency.clone(),
        settings.rate_refresh_interval,
    );

    // 7. Serve the API
    let identities = IdentityVerifier::new(&app_config.identities);
    if identities.is_empty() {
        warn!("No identities configured; every API request will be rejected");
    } else {
        info!(identities = identities.len(), "Identity tokens loaded.");
    }
    let bind_addr = settings.bind_addr;
    let state = AppState::new(db, provider, settings, identities);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", bind_addr, e))?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
