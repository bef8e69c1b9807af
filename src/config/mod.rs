/// Database configuration and connection management
pub mod database;

/// Seed items and identity tokens loaded from config.toml
pub mod seed;

/// Runtime settings loaded from environment variables
pub mod settings;

pub use seed::{AppConfig, IdentityConfig, SeedAccount, SeedCategory};
pub use settings::Settings;
