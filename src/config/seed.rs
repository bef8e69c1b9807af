//! Application configuration loaded from config.toml
//!
//! The file lists the shared categories and accounts seeded for every user and the
//! identity tokens the API accepts. Seed items are inserted on start when no shared
//! item with the same name exists yet.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Shared categories to seed
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    /// Shared accounts to seed
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
    /// Accepted identity tokens
    #[serde(default)]
    pub identities: Vec<IdentityConfig>,
}

/// A shared category to create on first run
#[derive(Debug, Deserialize, Clone)]
pub struct SeedCategory {
    /// Display label
    pub name: String,
    /// Icon identifier
    #[serde(default = "default_icon")]
    pub icon: String,
    /// `"expense"` or `"income"`
    #[serde(rename = "type")]
    pub record_type: String,
}

/// A shared account to create on first run
#[derive(Debug, Deserialize, Clone)]
pub struct SeedAccount {
    /// Display label
    pub name: String,
    /// Kind of account
    #[serde(default = "default_account_type")]
    pub account_type: String,
}

/// An identity token and the user it authenticates
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    /// User id the token maps to
    pub user_id: String,
    /// Bearer token value
    pub token: String,
}

fn default_icon() -> String {
    "tag".to_string()
}

fn default_account_type() -> String {
    "cash".to_string()
}

/// Loads the application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses config.toml contents.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration, or an empty one when the file does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        tracing::warn!(
            "Config file {} not found, starting without seed data or identities",
            path.as_ref().display()
        );
        Ok(AppConfig::default())
    }
}
