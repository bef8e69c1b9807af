//! Shared test utilities for moneybook.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::{SeedAccount, SeedCategory},
    core::{account, category, exchange_rate::RateContext},
    entities::{self, ImageUrls, RecordType},
    errors::{Error, Result},
    rates::RateProvider,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{DatabaseConnection, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shared categories used across tests: Food and Transport (expense), Salary (income).
#[must_use]
pub fn test_seed_categories() -> Vec<SeedCategory> {
    [("Food", "expense"), ("Transport", "expense"), ("Salary", "income")]
        .into_iter()
        .map(|(name, record_type)| SeedCategory {
            name: name.to_string(),
            icon: "tag".to_string(),
            record_type: record_type.to_string(),
        })
        .collect()
}

/// Shared accounts used across tests: Cash and Bank.
#[must_use]
pub fn test_seed_accounts() -> Vec<SeedAccount> {
    [("Cash", "cash"), ("Bank", "bank")]
        .into_iter()
        .map(|(name, account_type)| SeedAccount {
            name: name.to_string(),
            account_type: account_type.to_string(),
        })
        .collect()
}

/// Seeds the shared test categories and accounts.
/// Returns the Food category and the Cash account, the pair most tests file records under.
pub async fn seed_test_items(
    db: &DatabaseConnection,
) -> Result<(entities::category::Model, entities::account::Model)> {
    category::seed_system_categories(db, &test_seed_categories()).await?;
    account::seed_system_accounts(db, &test_seed_accounts()).await?;
    Ok((find_category(db, "Food").await?, find_account(db, "Cash").await?))
}

/// Finds a category by name.
pub async fn find_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    entities::Category::find()
        .filter(entities::category::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("test category {name} missing"),
        })
}

/// Finds an account by name.
pub async fn find_account(db: &DatabaseConnection, name: &str) -> Result<entities::account::Model> {
    entities::Account::find()
        .filter(entities::account::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("test account {name} missing"),
        })
}

/// Rate context converting into TWD from USD-sourced quotes.
pub fn test_rate_context(provider: &dyn RateProvider) -> RateContext<'_> {
    test_rate_context_base(provider, "TWD")
}

/// Rate context converting into `base` from USD-sourced quotes.
pub fn test_rate_context_base<'a>(provider: &'a dyn RateProvider, base: &'a str) -> RateContext<'a> {
    RateContext {
        provider,
        source: "USD",
        base,
    }
}

/// A valid expense input dated 2024-05-10 in USD.
#[must_use]
pub fn new_record_input(
    category_id: i64,
    account_id: i64,
    amount: &str,
) -> crate::core::record::NewRecord {
    crate::core::record::NewRecord {
        record_type: RecordType::Expense,
        date: test_date(),
        amount: amount.to_string(),
        currency: "USD".to_string(),
        category_id,
        account_id,
        note: None,
        images: Vec::new(),
    }
}

/// Fixed timestamp used by record helpers.
#[must_use]
pub fn test_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// An in-memory record model for pure-function tests.
#[must_use]
pub fn sample_record(id: i64, date: DateTime<Utc>) -> entities::record::Model {
    entities::record::Model {
        id,
        user_id: "alice".to_string(),
        record_type: RecordType::Expense.as_str().to_string(),
        date,
        amount: 100,
        currency: "USD".to_string(),
        exchange_rate: 1.0,
        category_id: 1,
        account_id: 1,
        note: None,
        images: ImageUrls::default(),
        created_at: date,
        updated_at: date,
    }
}
