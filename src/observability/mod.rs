//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (transaction counters, confirmation latency)
//!
//! Workflows open a span per operation carrying a UUID operation id,
//! so approval and payment logs of one attempt correlate.
//! ```

pub mod logging;
pub mod metrics;
