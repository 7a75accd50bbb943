//! Read-only RPC client with ordered failover.
//!
//! # Responsibilities
//! - Connect to every endpoint of a [`NetworkDescriptor`], primary first
//! - Query chain state (chain id, blocks, gas price, balances, code)
//! - Check that the node serves the configured chain
//! - Move on to the next endpoint on error or timeout
//!
//! Never signs or sends; transactions go through a session's signer.

use std::future::Future;
use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::TransportResult;
use tokio::time::timeout;

use crate::blockchain::network::NetworkDescriptor;
use crate::blockchain::types::ChainId;
use crate::error::{Error, Result};
use crate::observability::metrics;

/// Per-request timeout when none is given.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Latest block summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    pub number: u64,
    pub gas_limit: u64,
    pub base_fee_per_gas: Option<u64>,
}

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// Providers in descriptor order (primary + failovers), with their URLs.
    providers: Vec<(String, DynProvider<Ethereum>)>,
    network: NetworkDescriptor,
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Build providers for every valid endpoint of `network`.
    ///
    /// Invalid URLs are skipped with a warning; an error is returned only
    /// when none is usable. No request is made here.
    pub fn new(network: NetworkDescriptor, timeout_duration: Duration) -> Result<Self> {
        let mut providers = Vec::new();
        for url_str in &network.rpc_endpoints {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push((
                    url_str.clone(),
                    ProviderBuilder::new().connect_http(url).erased(),
                )),
                Err(e) => tracing::warn!(url = %url_str, error = %e, "Ignoring invalid RPC URL"),
            }
        }

        if providers.is_empty() {
            return Err(Error::Rpc {
                message: format!("No usable RPC endpoint for {}", network.name),
                hint: None,
            });
        }

        tracing::debug!(
            network = %network.name,
            endpoints = providers.len(),
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            network,
            timeout_duration,
        })
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Endpoint URLs in failover order.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|(url, _)| url.as_str())
    }

    /// Run `request` against each provider in order until one answers.
    async fn with_failover<T, F, Fut>(&self, operation: &'static str, request: F) -> Result<T>
    where
        F: Fn(DynProvider<Ethereum>) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = None;
        for (i, (url, provider)) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, request(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, rpc_url = %url, error = %e, operation, "RPC error, trying next provider");
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, rpc_url = %url, operation, "RPC timeout, trying next provider");
                    last_error = Some("timed out".to_string());
                }
            }
            metrics::record_rpc_failure(operation, i);
        }

        Err(Error::Rpc {
            message: format!(
                "All RPC providers failed to {operation}: {}",
                last_error.unwrap_or_default()
            ),
            hint: None,
        })
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> Result<ChainId> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Verify the node serves the descriptor's chain; returns the node's id.
    pub async fn verify_chain_id(&self) -> Result<ChainId> {
        let actual = self.get_chain_id().await?;
        check_chain_id(self.network.chain_id, actual)?;
        Ok(actual)
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> Result<u128> {
        self.with_failover("get gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    /// Native balance of an address.
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.with_failover("get balance", |p| async move { p.get_balance(address).await })
            .await
    }

    /// Deployed bytecode at `address`; empty when no contract lives there.
    pub async fn get_code_at(&self, address: Address) -> Result<Bytes> {
        self.with_failover("get code", |p| async move { p.get_code_at(address).await })
            .await
    }

    /// Number and gas limit of the latest block.
    pub async fn latest_block(&self) -> Result<BlockSummary> {
        let block = self
            .with_failover("get latest block", |p| async move {
                p.get_block_by_number(BlockNumberOrTag::Latest).await
            })
            .await?
            .ok_or_else(|| Error::Rpc {
                message: "Node returned no latest block".to_string(),
                hint: None,
            })?;

        Ok(BlockSummary {
            number: block.header.number,
            gas_limit: block.header.gas_limit,
            base_fee_per_gas: block.header.base_fee_per_gas,
        })
    }
}

fn check_chain_id(expected: ChainId, actual: ChainId) -> Result<()> {
    if actual != expected {
        return Err(Error::NetworkMismatch {
            expected: expected.0,
            actual: actual.0,
        });
    }
    Ok(())
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("network", &self.network.name)
            .field("endpoints", &self.endpoints().collect::<Vec<_>>())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
