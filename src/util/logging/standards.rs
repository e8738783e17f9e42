//! Centralised logging metadata (event names, shared targets).

/// Target used for per-request access lines, so they can be filtered
/// separately (`RUST_LOG=http.server=off`).
pub const ACCESS_TARGET: &str = "http.server";

/// Canonical event names used across the service.
pub mod events {
    /// HTTP request lifecycle.
    pub const REQUEST_COMPLETE: &str = "request.complete";
    pub const REQUEST_ERROR: &str = "request.error";

    /// Server lifecycle.
    pub const SERVER_BIND: &str = "http.server.bound";
    pub const SERVER_START: &str = "http.server.start";
    pub const SERVER_SIGNAL: &str = "http.server.signal";
    pub const SERVER_STOPPED: &str = "http.server.stopped";
    pub const SERVER_FAILED: &str = "http.server.failed";
    pub const SIGNAL_UNAVAILABLE: &str = "http.server.signal_unavailable";

    /// Connection lifecycle.
    pub const ACCEPT_ERROR: &str = "http.conn.accept_error";
    pub const CONNECTION_IDLE: &str = "http.conn.idle";
    pub const CONNECTION_ERROR: &str = "http.conn.error";

    /// Release metadata.
    pub const RELEASE_RESOLVED: &str = "release.resolved";
    pub const RELEASE_HEADER_INVALID: &str = "release.header_invalid";

    pub const LOG_INIT: &str = "log.init";
    pub const PANIC: &str = "panic.raised";
}
