//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration (network descriptor) + environment (private key)
//!     → network.rs (chain identity, endpoints, explorer links)
//!     → wallet.rs (key-backed wallet provider, network switching)
//!     → client.rs (read-only RPC with ordered failover, for diagnostics)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All diagnostic RPC calls have a timeout

pub mod client;
pub mod network;
pub mod types;
pub mod wallet;

pub use client::{BlockSummary, BlockchainClient};
pub use network::{NativeCurrency, NetworkDescriptor};
pub use types::ChainId;
pub use wallet::LocalWallet;
