//! Record entity - One income or expense entry owned by a user.
//!
//! Each record carries a positive integer amount, the currency it was
//! entered in and the exchange rate to the base currency captured when it was saved.
//! `category_id` and `account_id` are soft references: the referenced item may have been
//! hidden or deleted since.

use super::types::ImageUrls;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the record
    pub user_id: String,
    /// `"expense"` or `"income"`
    pub record_type: String,
    /// When the money moved
    pub date: DateTimeUtc,
    /// Positive integer amount in `currency`
    pub amount: i64,
    /// ISO currency code, upper-case
    pub currency: String,
    /// Multiply `amount` by this to get the base currency
    pub exchange_rate: f64,
    /// Category this record is filed under
    pub category_id: i64,
    /// Account the money moved through
    pub account_id: i64,
    /// Free-form note
    pub note: Option<String>,
    /// Receipt image URLs (at most five)
    pub images: ImageUrls,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Records reference categories and accounts by id only, without foreign keys.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
