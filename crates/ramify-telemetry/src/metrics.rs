//! Dispatch metrics.
//!
//! Recorded through the `metrics` facade; the embedding service installs
//! whichever recorder/exporter it uses.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `ramify_dispatch_total` | Counter | `action`, `outcome` | Dispatched view actions |
//! | `ramify_dispatch_duration_seconds` | Histogram | `action` | View action latency |
//! | `ramify_parent_resolutions_total` | Counter | `resource` | Parent lookups made to scope a query |
//! | `ramify_search_queries_total` | Counter | `outcome` | Search index queries, including skipped ones |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Dispatch counter name.
pub const DISPATCH_TOTAL: &str = "ramify_dispatch_total";
/// Dispatch latency histogram name.
pub const DISPATCH_DURATION: &str = "ramify_dispatch_duration_seconds";
/// Parent resolution counter name.
pub const PARENT_RESOLUTIONS: &str = "ramify_parent_resolutions_total";
/// Search query counter name.
pub const SEARCH_QUERIES: &str = "ramify_search_queries_total";

/// Registers descriptions for all metrics.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total number of dispatched view actions");
    describe_histogram!(DISPATCH_DURATION, "View action duration in seconds");
    describe_counter!(
        PARENT_RESOLUTIONS,
        "Parent items resolved to scope a nested query"
    );
    describe_counter!(
        SEARCH_QUERIES,
        "Search index queries by outcome (queried or skipped)"
    );
}

/// Records a completed dispatch.
///
/// `outcome` is `ok` or the error category of the failure.
pub fn record_dispatch(action: &str, outcome: &str, duration: Duration) {
    counter!(
        DISPATCH_TOTAL,
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(DISPATCH_DURATION, "action" => action.to_string())
        .record(duration.as_secs_f64());
}

/// Records one parent lookup performed for `resource`.
pub fn record_parent_resolution(resource: &str) {
    counter!(PARENT_RESOLUTIONS, "resource" => resource.to_string()).increment(1);
}

/// Records a search query; `queried` is false when an empty scope made the
/// query unnecessary.
pub fn record_search_query(queried: bool) {
    let outcome = if queried { "queried" } else { "skipped" };
    counter!(SEARCH_QUERIES, "outcome" => outcome).increment(1);
}
