//! Column value types shared by several entities.
//!
//! The set and list types are stored as JSON text columns.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// `created_by` value of items seeded for every user.
pub const SYSTEM_OWNER: &str = "system";

/// Whether a record or category is money going out or coming in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Money spent
    Expense,
    /// Money received
    Income,
}

impl RecordType {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(crate::errors::Error::Validation {
                field: "type",
                message: format!("expected \"expense\" or \"income\", got {other:?}"),
            }),
        }
    }
}

/// User ids that have hidden a shared item for themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct UserIdSet(pub BTreeSet<String>);

impl UserIdSet {
    /// Whether `user_id` is in the set.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.0.contains(user_id)
    }

    /// Adds `user_id`; returns false if it was already present.
    pub fn insert(&mut self, user_id: &str) -> bool {
        self.0.insert(user_id.to_string())
    }
}

/// Receipt image URLs attached to a record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ImageUrls(pub Vec<String>);

/// Currency-pair quotes keyed `SRCDST`, e.g. `USDTWD`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct RateQuotes(pub BTreeMap<String, f64>);
