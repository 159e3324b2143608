//! Configuration section types.

use serde::{Deserialize, Serialize};

/// View behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ViewSettings {
    /// Page size placed in `_limit` when the request names none.
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Upper bound accepted for `default_limit`.
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    /// Return search-index documents as stored instead of wrapping them as
    /// entities.
    #[serde(default)]
    pub raw_search_results: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            raw_search_results: false,
        }
    }
}

const fn default_limit() -> u64 {
    20
}

const fn default_max_limit() -> u64 {
    1000
}

/// Search index settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SearchIndexConfig {
    /// Serve reads of search-indexed resources from the index. When off,
    /// those reads go to the primary store.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Separator joining identifiers in the primary-key filter.
    #[serde(default = "default_id_separator")]
    pub id_separator: String,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id_separator: default_id_separator(),
        }
    }
}

fn default_id_separator() -> String {
    ",".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (`info`, `ramify_views=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_settings_defaults() {
        let settings = ViewSettings::default();
        assert_eq!(settings.default_limit, 20);
        assert!(!settings.raw_search_results);
    }

    #[test]
    fn test_view_settings_partial_toml() {
        let settings: ViewSettings = toml::from_str("raw_search_results = true").unwrap();
        assert!(settings.raw_search_results);
        assert_eq!(settings.default_limit, 20);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<SearchIndexConfig, _> = toml::from_str("enabeld = false");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert!(serde_json::from_str::<LogFormat>(r#""xml""#).is_err());
    }
}
