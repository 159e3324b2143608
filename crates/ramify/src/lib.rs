//! # Ramify
//!
//! **Parent-scoped REST resource views**
//!
//! Ramify serves a nested resource tree (`/users/{username}/stories/{id}`)
//! on top of pluggable persistence models and search indexes:
//!
//! - **Scoped lookups** – nested items are only visible through their parent's collection attribute
//! - **CRUD method table** – GET/POST/PUT/PATCH/DELETE/OPTIONS mapped per depth
//! - **Search-index reads** – list and show through a secondary index, writes to the primary store
//! - **Default ACLs** – generated descriptors for new items and principals
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ramify::prelude::*;
//!
//! let config = ConfigLoader::new().with_defaults().with_env_prefix("RAMIFY").load()?;
//! ramify::init(&config)?;
//!
//! let registry = ViewRegistry::builder(tree)
//!     .with_config(&config)
//!     .bind_uid("user", ViewBinding::new(users, acl))?
//!     .build();
//! let output = Dispatcher::new(Arc::new(registry)).dispatch(request).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → match_path → ActionTable → CollectionView ─┬─ PersistenceModel
//!                                          │            └─ SearchIndex
//!                                          └─ parent view (narrowed request)
//! ```

#![doc(html_root_url = "https://docs.rs/ramify/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use ramify_core as core;

// Re-export router types
pub use ramify_router as router;

// Re-export configuration types
pub use ramify_config as config;

// Re-export telemetry
pub use ramify_telemetry as telemetry;

// Re-export views
pub use ramify_views as views;

use ramify_config::{LogFormat, LoggingConfig, RamifyConfig};
use ramify_telemetry::{LogConfig, TelemetryResult};

/// Converts the logging section of a loaded configuration.
#[must_use]
pub fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        enabled: logging.enabled,
        level: logging.level.clone(),
        json_format: logging.format == LogFormat::Json,
        span_events: logging.format == LogFormat::Pretty,
        file_line_info: logging.include_location,
        include_target: true,
    }
}

/// Installs logging from `config` and registers metric descriptions.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init(config: &RamifyConfig) -> TelemetryResult<()> {
    ramify_telemetry::init_logging(&log_config(&config.logging))?;
    ramify_telemetry::metrics::describe_metrics();
    Ok(())
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use ramify::prelude::*;
///
/// let config = RamifyConfig::default();
/// assert_eq!(config.views.default_limit, 20);
/// ```
pub mod prelude {
    pub use ramify_core::{
        Acl, AclFactory, AclSubject, CallerIdentity, Collection, Entity, ErrorCategory, Fields,
        ItemAcl, PersistenceModel, QueryParams, RequestContext, RequestId, Resolution, Scope,
        SearchHits, SearchIndex, ViewError, ViewResult,
    };

    pub use ramify_router::{
        ActionTable, Depth, Params, ResourceId, ResourceSpec, ResourceTree, ViewAction,
    };

    pub use ramify_config::{ConfigLoader, RamifyConfig};

    pub use ramify_telemetry::{init_logging, LogConfig};

    pub use ramify_views::{
        assign_principal_acl, BaseView, CollectionView, Dispatcher, ViewBinding, ViewKind,
        ViewOutput, ViewRegistry,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_mapping() {
        let dev = log_config(&RamifyConfig::development().logging);
        assert!(!dev.json_format);
        assert!(dev.file_line_info);
        assert_eq!(dev.level, "debug");

        let prod = log_config(&RamifyConfig::production().logging);
        assert!(prod.json_format);
        assert!(!prod.span_events);
    }
}
