//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod category;
pub mod exchange_rate;
pub mod record;
pub mod system_state;
pub mod types;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use exchange_rate::{
    Column as ExchangeRateColumn, Entity as ExchangeRate, Model as ExchangeRateModel,
};
pub use record::{Column as RecordColumn, Entity as Record, Model as RecordModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use types::{ImageUrls, RateQuotes, RecordType, UserIdSet, SYSTEM_OWNER};
