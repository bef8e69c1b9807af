//! Category entity - A classification for records, shared or user-defined.
//!
//! Shared categories have `created_by == "system"` and are visible to everyone until a
//! user hides one for themselves by being added to `deleted_by`.

use super::types::UserIdSet;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display label (e.g., "Food", "Salary")
    pub name: String,
    /// Icon identifier used by clients
    pub icon: String,
    /// `"expense"` or `"income"`
    pub record_type: String,
    /// `"system"` for shared items, otherwise the owning user id
    pub created_by: String,
    /// Users who hid this item
    pub deleted_by: UserIdSet,
    /// When the category was created
    pub created_at: DateTimeUtc,
}

/// `Category` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
