//! Session negotiation: accounts, network identity, signer, handles.
//!
//! The negotiator is the only writer of the session. `acquire` and
//! `disconnect` take `&mut self`; everything else borrows the session
//! immutably for the duration of one operation.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::broadcast;

use crate::blockchain::network::NetworkDescriptor;
use crate::contracts::handles::{ContractAddresses, ContractHandles};
use crate::error::{Error, Result};
use crate::session::provider::{WalletEvent, WalletProvider};
use crate::session::signer::SigningCapability;

/// An authenticated, network-scoped signing session.
#[derive(Clone)]
pub struct Session {
    account: Address,
    signer: Arc<dyn SigningCapability>,
    chain_id: u64,
    handles: ContractHandles,
}

impl Session {
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn signer(&self) -> &Arc<dyn SigningCapability> {
        &self.signer
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Contract handles built from this session's signer.
    pub fn handles(&self) -> &ContractHandles {
        &self.handles
    }

    /// `0x1234...abcd` form for display.
    pub fn short_account(&self) -> String {
        let full = self.account.to_checksum(None);
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Acquires, repairs and drops the wallet session.
pub struct SessionNegotiator {
    wallet: Option<Arc<dyn WalletProvider>>,
    network: Arc<NetworkDescriptor>,
    addresses: ContractAddresses,
    session: Option<Session>,
}

impl SessionNegotiator {
    /// `wallet` is `None` when the environment has no wallet at all.
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        network: Arc<NetworkDescriptor>,
        addresses: ContractAddresses,
    ) -> Self {
        Self {
            wallet,
            network,
            addresses,
            session: None,
        }
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Wallet notifications, or `None` without a wallet.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        self.wallet.as_ref().map(|wallet| wallet.subscribe())
    }

    fn wallet(&self) -> Result<Arc<dyn WalletProvider>> {
        self.wallet.clone().ok_or(Error::NoWalletFound)
    }

    /// Request account access, move the wallet to the target network and
    /// publish a fresh session.
    ///
    /// Any previous session is dropped first; on failure none is left behind.
    pub async fn acquire(&mut self) -> Result<&Session> {
        self.session = None;
        let wallet = self.wallet()?;

        let accounts = wallet.request_accounts().await?;
        let account = *accounts.first().ok_or(Error::UserRejected)?;

        let target = self.network.chain_id.0;
        let current = wallet.chain_id().await?;
        if current != target {
            tracing::info!(current, target, "Wallet on wrong network, switching");
            ensure_network(wallet.as_ref(), &self.network).await?;
        }

        // Always derived after any switch; a signer from before it is stale.
        let signer = wallet.signer().await?;
        if signer.chain_id() != target {
            return Err(Error::NetworkMismatch {
                expected: target,
                actual: signer.chain_id(),
            });
        }

        let handles = ContractHandles::build(Arc::clone(&signer), self.addresses);
        tracing::info!(account = %account, chain_id = target, "Session acquired");

        Ok(&*self.session.insert(Session {
            account,
            signer,
            chain_id: target,
            handles,
        }))
    }

    /// Connect silently when the wallet already exposes an account.
    pub async fn restore(&mut self) -> Result<Option<&Session>> {
        let Some(wallet) = self.wallet.clone() else {
            return Ok(None);
        };
        if wallet.accounts().await?.is_empty() {
            return Ok(None);
        }
        self.acquire().await.map(Some)
    }

    /// Drop the session and its handles. Returns whether one was active.
    pub fn disconnect(&mut self) -> bool {
        let was_active = self.session.take().is_some();
        if was_active {
            tracing::info!("Session cleared");
        }
        was_active
    }
}

/// Put the wallet on `network`, registering the network if the wallet does
/// not know it.
///
/// Only an unrecognised-chain error triggers registration; any other switch
/// failure is returned as is.
pub async fn ensure_network(wallet: &dyn WalletProvider, network: &NetworkDescriptor) -> Result<()> {
    let target = network.chain_id.0;

    match wallet.switch_chain(target).await {
        Ok(()) => {}
        Err(e) if e.is_unrecognized_chain() => {
            tracing::info!(chain_id = target, name = %network.name, "Registering network with wallet");
            wallet.add_chain(network).await?;
        }
        Err(e) => return Err(e.into()),
    }

    let actual = wallet.chain_id().await?;
    if actual != target {
        return Err(Error::NetworkMismatch {
            expected: target,
            actual,
        });
    }
    Ok(())
}
