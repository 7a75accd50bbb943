//! Key-backed wallet provider.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//!
//! `LocalWallet` behaves like an injected browser wallet that already
//! trusts this application: account access is granted without a prompt,
//! and it only signs on networks it has been told about, answering
//! unknown ones with EIP-1193 code 4902.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::blockchain::network::NetworkDescriptor;
use crate::session::provider::{WalletError, WalletEvent, WalletProvider, UNRECOGNIZED_CHAIN_CODE};
use crate::session::signer::{ProviderSigner, SigningCapability};

/// EIP-1193 / JSON-RPC code for malformed request parameters.
pub const INVALID_PARAMS_CODE: i64 = -32602;

const EVENT_CAPACITY: usize = 16;

struct WalletState {
    current: NetworkDescriptor,
    known: HashMap<u64, NetworkDescriptor>,
}

/// Wallet holding one private key.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    state: Mutex<WalletState>,
    events: broadcast::Sender<WalletEvent>,
}

impl LocalWallet {
    /// Wallet that starts on, and only knows, `home`.
    pub fn new(signer: PrivateKeySigner, home: NetworkDescriptor) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut known = HashMap::new();
        known.insert(home.chain_id.0, home.clone());

        tracing::info!(
            address = %signer.address(),
            chain_id = home.chain_id.0,
            "Wallet initialized"
        );

        Self {
            signer,
            state: Mutex::new(WalletState {
                current: home,
                known,
            }),
            events,
        }
    }

    /// Create a wallet from a hex-encoded private key (with or without `0x`).
    pub fn from_private_key(private_key_hex: &str, home: NetworkDescriptor) -> Result<Self, WalletError> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let signer: PrivateKeySigner = key_hex.parse().map_err(|e| {
            WalletError::new(INVALID_PARAMS_CODE, format!("Invalid private key format: {e}"))
        })?;
        Ok(Self::new(signer, home))
    }

    /// Load the key from environment variable `var`.
    ///
    /// `Ok(None)` when the variable is unset or blank: there is no wallet.
    pub fn from_env(var: &str, home: NetworkDescriptor) -> Result<Option<Self>, WalletError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Self::from_private_key(&key, home).map(Some),
            _ => {
                tracing::debug!(env = var, "No private key in environment");
                Ok(None)
            }
        }
    }

    /// Also know `network`, without switching to it.
    pub fn with_known_network(self, network: NetworkDescriptor) -> Self {
        self.lock().known.insert(network.chain_id.0, network);
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Network the wallet is currently on.
    pub fn current_network(&self) -> NetworkDescriptor {
        self.lock().current.clone()
    }

    fn lock(&self) -> MutexGuard<'_, WalletState> {
        // State is plain data; a panicked holder cannot leave it half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: WalletEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.signer.address())
            .field("chain_id", &self.lock().current.chain_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.signer.address()])
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.signer.address()])
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.lock().current.chain_id.0)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let changed = {
            let mut state = self.lock();
            let network = state.known.get(&chain_id).cloned().ok_or_else(|| {
                WalletError::new(
                    UNRECOGNIZED_CHAIN_CODE,
                    format!("Unrecognized chain ID {chain_id:#x}"),
                )
            })?;
            let changed = state.current.chain_id.0 != chain_id;
            state.current = network;
            changed
        };

        if changed {
            tracing::info!(chain_id, "Wallet switched network");
            self.emit(WalletEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError> {
        if network.rpc_endpoints.is_empty() {
            return Err(WalletError::new(INVALID_PARAMS_CODE, "rpcUrls must not be empty"));
        }
        tracing::info!(params = %network.add_chain_params(), "Adding network to wallet");
        self.lock().known.insert(network.chain_id.0, network.clone());
        self.switch_chain(network.chain_id.0).await
    }

    async fn signer(&self) -> Result<Arc<dyn SigningCapability>, WalletError> {
        let network = self.current_network();
        let rpc = network.primary_rpc().ok_or_else(|| {
            WalletError::new(INVALID_PARAMS_CODE, "Network has no RPC endpoint")
        })?;
        let url: url::Url = rpc.parse().map_err(|e| {
            WalletError::new(INVALID_PARAMS_CODE, format!("Invalid RPC URL '{rpc}': {e}"))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(url)
            .erased();

        Ok(Arc::new(ProviderSigner::new(
            provider,
            self.signer.address(),
            network.chain_id.0,
        )))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::ChainId;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn mainnet() -> NetworkDescriptor {
        NetworkDescriptor {
            chain_id: ChainId(1),
            name: "Ethereum".to_string(),
            rpc_endpoints: vec!["http://localhost:8545".to_string()],
            ..NetworkDescriptor::default()
        }
    }

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, mainnet()).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );

        let prefixed = LocalWallet::from_private_key(&format!("0x{TEST_PRIVATE_KEY}"), mainnet()).unwrap();
        assert_eq!(prefixed.address(), wallet.address());
    }

    #[test]
    fn test_invalid_private_key() {
        let err = LocalWallet::from_private_key("invalid_key", mainnet()).unwrap_err();
        assert!(err.message.contains("Invalid private key"));
    }

    #[test]
    fn test_missing_env_means_no_wallet() {
        let wallet = LocalWallet::from_env("USERNAME_PAY_TEST_KEY_NEVER_SET", mainnet()).unwrap();
        assert!(wallet.is_none());
    }

    #[test]
    fn test_blank_env_means_no_wallet() {
        std::env::set_var("USERNAME_PAY_TEST_KEY_BLANK", "  ");
        let wallet = LocalWallet::from_env("USERNAME_PAY_TEST_KEY_BLANK", mainnet()).unwrap();
        assert!(wallet.is_none());
    }

    #[tokio::test]
    async fn test_unknown_chain_is_unrecognized() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, mainnet()).unwrap();
        let err = wallet.switch_chain(5_042_002).await.unwrap_err();
        assert!(err.is_unrecognized_chain());
        assert_eq!(wallet.chain_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_chain_switches_and_notifies() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, mainnet()).unwrap();
        let mut events = wallet.subscribe();

        wallet.add_chain(&NetworkDescriptor::default()).await.unwrap();

        assert_eq!(wallet.chain_id().await.unwrap(), 5_042_002);
        assert_eq!(events.recv().await.unwrap(), WalletEvent::ChainChanged(5_042_002));

        // Known now; switching back and forth no longer needs registration.
        wallet.switch_chain(1).await.unwrap();
        wallet.switch_chain(5_042_002).await.unwrap();
    }

    #[tokio::test]
    async fn test_signer_tracks_current_network() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, mainnet())
            .unwrap()
            .with_known_network(NetworkDescriptor::default());

        assert_eq!(wallet.signer().await.unwrap().chain_id(), 1);
        wallet.switch_chain(5_042_002).await.unwrap();
        let signer = wallet.signer().await.unwrap();
        assert_eq!(signer.chain_id(), 5_042_002);
        assert_eq!(signer.address(), wallet.address());
    }
}
