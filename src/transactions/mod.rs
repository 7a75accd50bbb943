//! Transaction subsystem.
//!
//! # Data Flow
//! ```text
//! contract handle
//!     → intent.rs (target, calldata, optional gas limit override)
//!     → submitter.rs (gas policy, sign & broadcast, race confirmation vs timeout)
//!     → outcome.rs (Confirmed | TimedOut | Reverted | Rejected)
//!
//! allowance.rs sits in front of payments:
//!     allowance() read → approve(MAX) through the submitter only when short
//! ```

pub mod allowance;
pub mod intent;
pub mod outcome;
pub mod submitter;

pub use allowance::{ensure_allowance, ensure_allowance_with, AllowanceStatus};
pub use intent::{GasPolicy, TransactionIntent};
pub use outcome::TransactionOutcome;
pub use submitter::TransactionSubmitter;
