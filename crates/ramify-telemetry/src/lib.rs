//! Observability for Ramify.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: dispatch counters and latency via the `metrics` facade
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `ramify_dispatch_total` | Counter | `action`, `outcome` |
//! | `ramify_dispatch_duration_seconds` | Histogram | `action` |
//! | `ramify_parent_resolutions_total` | Counter | `resource` |
//! | `ramify_search_queries_total` | Counter | `outcome` |

#![doc(html_root_url = "https://docs.rs/ramify-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogConfig};
