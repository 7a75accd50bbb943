//! Signing capability and the alloy-backed implementation.

use std::future::Future;

use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, Log, TxHash};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::error::{Error, Result};

/// Mined transaction, reduced to what workflows need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `false` when the transaction reverted on-chain.
    pub success: bool,
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }
    }
}

/// A broadcast transaction whose confirmation can be awaited.
pub struct PendingTransaction {
    tx_hash: TxHash,
    confirmation: BoxFuture<'static, Result<Receipt>>,
}

impl PendingTransaction {
    pub fn new<F>(tx_hash: TxHash, confirmation: F) -> Self
    where
        F: Future<Output = Result<Receipt>> + Send + 'static,
    {
        Self {
            tx_hash,
            confirmation: confirmation.boxed(),
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// The node wait. Dropping it abandons the observation, not the transaction.
    pub fn into_confirmation(self) -> BoxFuture<'static, Result<Receipt>> {
        self.confirmation
    }
}

impl std::fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx_hash", &self.tx_hash)
            .finish_non_exhaustive()
    }
}

/// Authority to read from and sign for one account on one chain.
#[async_trait]
pub trait SigningCapability: Send + Sync {
    /// Account this capability signs for.
    fn address(&self) -> Address;

    /// Chain the capability is bound to.
    fn chain_id(&self) -> u64;

    /// Read-only `eth_call`.
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// Sign and broadcast.
    async fn send_transaction(&self, request: TransactionRequest) -> Result<PendingTransaction>;
}

/// Signing capability over an alloy provider that carries a wallet filler.
#[derive(Clone)]
pub struct ProviderSigner {
    provider: DynProvider<Ethereum>,
    address: Address,
    chain_id: u64,
}

impl ProviderSigner {
    pub fn new(provider: DynProvider<Ethereum>, address: Address, chain_id: u64) -> Self {
        Self {
            provider,
            address,
            chain_id,
        }
    }
}

#[async_trait]
impl SigningCapability for ProviderSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        self.provider
            .call(request)
            .await
            .map_err(Error::from_transport)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<PendingTransaction> {
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(Error::from_transport)?;
        let tx_hash = *pending.tx_hash();

        tracing::debug!(tx_hash = %tx_hash, "Transaction broadcast");

        let confirmation = async move {
            let receipt = pending.get_receipt().await.map_err(|e| Error::Rpc {
                message: format!("failed to fetch receipt: {e}"),
                hint: None,
            })?;
            Ok(Receipt::from(&receipt))
        };

        Ok(PendingTransaction::new(tx_hash, confirmation))
    }
}

impl std::fmt::Debug for ProviderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSigner")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_transaction_resolves() {
        let receipt = Receipt {
            tx_hash: TxHash::with_last_byte(7),
            block_number: Some(12),
            gas_used: 21_000,
            success: true,
            logs: Vec::new(),
        };
        let expected = receipt.clone();
        let pending = PendingTransaction::new(receipt.tx_hash, async move { Ok(receipt) });

        assert_eq!(pending.tx_hash(), TxHash::with_last_byte(7));
        assert_eq!(pending.into_confirmation().await.unwrap(), expected);
    }
}
