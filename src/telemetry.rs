//! Telemetry metric name constants.
//!
//! Centralised metric names for bifrost operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `bifrost_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `endpoint`: "primary" or "fallback"
//! - `operation`: "generate" or "generate_stream"
//! - `status`: "ok" or "error"
//! - `direction`: "prompt", "candidates" or "thoughts"

/// Total HTTP attempts sent to the vendor.
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "bifrost_requests_total";

/// Total times the fallback endpoint was tried after a primary failure.
pub const FALLBACKS_TOTAL: &str = "bifrost_fallbacks_total";

/// Call duration in seconds, measured until the response (or stream) is
/// established.
///
/// Labels: `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "bifrost_request_duration_seconds";

/// Total tokens reported by the vendor.
///
/// Labels: `direction` ("prompt" | "candidates" | "thoughts").
pub const TOKENS_TOTAL: &str = "bifrost_tokens_total";
