//! The wallet seam.
//!
//! A [`WalletProvider`] is the Rust counterpart of an injected EIP-1193
//! wallet: it owns the accounts, knows which network it is on, can be asked
//! to switch or register networks, and hands out a signer for the current
//! account/network pair. It may be absent entirely.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::blockchain::network::NetworkDescriptor;
use crate::session::signer::SigningCapability;

/// EIP-1193 code for a chain the wallet does not know.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Error returned by a wallet provider (EIP-1193 `ProviderRpcError`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletError {
    pub code: i64,
    pub message: String,
}

impl WalletError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The wallet does not know the requested chain and needs it registered first.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN_CODE || self.message.contains("Unrecognized")
    }
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for WalletError {}

/// Notifications pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnected,
}

/// An injected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user for account access (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Accounts already exposed without prompting (`eth_accounts`).
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Chain the wallet is currently on.
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `wallet_switchEthereumChain`.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// `wallet_addEthereumChain` with the full descriptor.
    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError>;

    /// Signer bound to the current account and chain.
    ///
    /// A signer obtained before a network switch is stale and must not be reused.
    async fn signer(&self) -> Result<Arc<dyn SigningCapability>, WalletError>;

    /// Subscribe to account/network notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
