//! User-facing workflows on top of a session.
//!
//! # Data Flow
//! ```text
//! typed input → amount.rs / registration::validate_username (no network)
//!     → workflow.rs   allowance guard → payByUsername
//!     → registration.rs registerUsername
//!     → lookup.rs     eth_call reads only
//! ```

pub mod amount;
pub mod lookup;
pub mod registration;
pub mod workflow;

pub use amount::{format_amount, to_smallest_unit};
pub use registration::{register_username, validate_username};
pub use workflow::{send_payment, PaymentReport, PaymentRequest, PaymentState};
