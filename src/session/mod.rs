//! Wallet session subsystem.
//!
//! # Data Flow
//! ```text
//! WalletProvider (injected, possibly absent)
//!     → negotiator.rs: request accounts
//!     → negotiator.rs: chain id check → switch, or register then switch
//!     → provider.rs: signer re-derived for the final account/network
//!     → ContractHandles bound to that signer
//!     → Session published (all or nothing)
//!
//! Wallet events (accounts/chain changed):
//!     → session torn down and re-acquired, never patched in place
//! ```

pub mod negotiator;
pub mod provider;
pub mod signer;

pub use negotiator::{ensure_network, Session, SessionNegotiator};
pub use provider::{WalletError, WalletEvent, WalletProvider};
pub use signer::{PendingTransaction, ProviderSigner, Receipt, SigningCapability};
