//! Target names for filtering `tracing` output.
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_veil::session=debug,horizon_veil::registry=trace")
//!     .init();
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Crate-level target.
    pub const VEIL: &str = "horizon_veil";
    /// Session configuration and engage.
    pub const MAINTAINER: &str = "horizon_veil::maintainer";
    /// Session recomputation and disengage.
    pub const SESSION: &str = "horizon_veil::session";
    /// Marker acquire and release.
    pub const REGISTRY: &str = "horizon_veil::registry";
    /// Path resolution.
    pub const RESOLVER: &str = "horizon_veil::resolver";
    /// Mutation subscriptions.
    pub const REACTOR: &str = "horizon_veil::reactor";
}
