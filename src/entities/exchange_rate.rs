//! Exchange rate entity - One snapshot of currency quotes per calendar month.

use super::types::RateQuotes;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly exchange rate database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exchange_rates")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Month key in `YYYY-MM` form
    #[sea_orm(unique)]
    pub year_month: String,
    /// Currency every quote is expressed from
    pub source: String,
    /// Quotes keyed `SRCDST`
    pub quotes: RateQuotes,
    /// When the quotes were fetched
    pub fetched_at: DateTimeUtc,
}

/// `ExchangeRate` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
