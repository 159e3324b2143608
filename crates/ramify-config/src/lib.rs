//! Typed configuration for Ramify.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use ramify_config::{ConfigLoader, DEFAULT_ENV_PREFIX};
//!
//! # fn main() -> Result<(), ramify_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("ramify.toml")?
//!     .with_env_prefix(DEFAULT_ENV_PREFIX)
//!     .load()?;
//!
//! println!("default page size: {}", config.views.default_limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [views]
//! default_limit = 20
//! max_limit = 1000
//! raw_search_results = false
//!
//! [search_index]
//! enabled = true
//! id_separator = ","
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `RAMIFY__VIEWS__DEFAULT_LIMIT=50`
//! - `RAMIFY__SEARCH_INDEX__ENABLED=false`
//! - `RAMIFY__LOGGING__FORMAT=pretty`

#![doc(html_root_url = "https://docs.rs/ramify-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::RamifyConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{LogFormat, LoggingConfig, SearchIndexConfig, ViewSettings};
