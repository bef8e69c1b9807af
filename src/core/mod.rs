//! Core business logic - framework-agnostic bookkeeping operations.
//!
//! Everything here takes a database connection and plain values; the HTTP layer in
//! [`crate::api`] only parses requests and shapes responses around these functions.

/// Shared account management (system defaults plus per-user accounts)
pub mod account;
/// Shared category management (system defaults plus per-user categories)
pub mod category;
/// Monthly exchange-rate cache and currency conversion
pub mod exchange_rate;
/// Once-a-month exchange-rate refresh job
pub mod monthly;
/// Calendar month keys and report bucketing
pub mod period;
/// Income and expense records: validation, CRUD and cursor pagination
pub mod record;
/// Chart and summary aggregation over records
pub mod report;
/// Per-user visibility of shared categories and accounts
pub mod visibility;
