//! Account entity - Where money is held (cash, bank, card), shared or user-defined.

use super::types::UserIdSet;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display label (e.g., "Wallet")
    pub name: String,
    /// Kind of account, e.g. `"cash"`, `"bank"`, `"credit_card"`
    pub account_type: String,
    /// `"system"` for shared items, otherwise the owning user id
    pub created_by: String,
    /// Users who hid this item
    pub deleted_by: UserIdSet,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// `Account` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
