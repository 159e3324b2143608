//! Main configuration type.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, SearchIndexConfig, ViewSettings};

/// Complete Ramify configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use ramify_config::RamifyConfig;
///
/// let config = RamifyConfig::default();
/// assert_eq!(config.views.default_limit, 20);
/// assert!(config.search_index.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RamifyConfig {
    /// View behaviour.
    #[serde(default)]
    pub views: ViewSettings,

    /// Search index behaviour.
    #[serde(default)]
    pub search_index: SearchIndexConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RamifyConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `views.default_limit` is zero or above `views.max_limit`
    /// - `search_index.id_separator` is empty
    /// - `logging.level` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.views.default_limit == 0 {
            return Err(ConfigError::invalid_value(
                "views.default_limit",
                "must be at least 1",
            ));
        }

        if self.views.default_limit > self.views.max_limit {
            return Err(ConfigError::invalid_value(
                "views.default_limit",
                format!("must not exceed views.max_limit ({})", self.views.max_limit),
            ));
        }

        if self.search_index.id_separator.is_empty() {
            return Err(ConfigError::invalid_value(
                "search_index.id_separator",
                "must not be empty",
            ));
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Create a development configuration preset: pretty debug logs with
    /// source locations, raw search documents.
    ///
    /// # Example
    ///
    /// ```
    /// use ramify_config::{LogFormat, RamifyConfig};
    ///
    /// let config = RamifyConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            views: ViewSettings {
                raw_search_results: true,
                ..ViewSettings::default()
            },
            search_index: SearchIndexConfig::default(),
            logging: LoggingConfig {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
            },
        }
    }

    /// Create a production configuration preset: JSON info logs.
    ///
    /// # Example
    ///
    /// ```
    /// use ramify_config::{LogFormat, RamifyConfig};
    ///
    /// let config = RamifyConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// assert!(!config.views.raw_search_results);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        Self {
            views: ViewSettings::default(),
            search_index: SearchIndexConfig::default(),
            logging: LoggingConfig {
                enabled: true,
                level: "info".to_string(),
                format: LogFormat::Json,
                include_location: false,
            },
        }
    }
}
