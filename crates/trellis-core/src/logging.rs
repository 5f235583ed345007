//! Logging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // Your application code...
//! }
//! ```
//!
//! The [`targets`] module lists the target names Trellis logs under, for
//! use with `tracing` filter directives (e.g. `trellis::proxy=trace`).

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "trellis_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Scheduler target.
    pub const SCHEDULER: &str = "trellis_core::scheduler";
    /// Type conversion target.
    pub const CONVERT: &str = "trellis::convert";
    /// Validation feedback target.
    pub const VALIDATE: &str = "trellis::validate";
    /// Widget binding target.
    pub const BINDING: &str = "trellis::binding";
    /// Model proxy target.
    pub const PROXY: &str = "trellis::proxy";
}
