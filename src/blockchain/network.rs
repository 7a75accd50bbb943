//! Static description of the target network.
//!
//! The same structure is used for three things: configuration, explorer
//! links, and the payload handed to a wallet when the network has to be
//! registered (`wallet_addEthereumChain`).

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::blockchain::types::ChainId;

/// Metadata of the network's native asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    /// Wallets require 18 for custom networks, even when the asset is a stablecoin.
    pub decimals: u8,
}

/// Immutable network identity and endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkDescriptor {
    /// Chain ID (5042002 for Arc Testnet).
    pub chain_id: ChainId,

    /// Human-readable network name.
    pub name: String,

    /// Native asset metadata.
    pub native_currency: NativeCurrency,

    /// RPC endpoints; index 0 is primary, the rest are fallbacks.
    pub rpc_endpoints: Vec<String>,

    /// Block explorer base URL, with trailing slash.
    pub explorer_base_url: String,
}

impl Default for NetworkDescriptor {
    fn default() -> Self {
        Self {
            chain_id: ChainId(5_042_002),
            name: "Arc Testnet".to_string(),
            native_currency: NativeCurrency {
                name: "USDC".to_string(),
                symbol: "USDC".to_string(),
                decimals: 18,
            },
            rpc_endpoints: vec![
                "https://rpc.testnet.arc.network".to_string(),
                "https://rpc.blockdaemon.testnet.arc.network".to_string(),
                "https://rpc.drpc.testnet.arc.network".to_string(),
                "https://rpc.quicknode.testnet.arc.network".to_string(),
            ],
            explorer_base_url: "https://testnet.arcscan.app/".to_string(),
        }
    }
}

impl NetworkDescriptor {
    /// Primary RPC endpoint.
    pub fn primary_rpc(&self) -> Option<&str> {
        self.rpc_endpoints.first().map(String::as_str)
    }

    /// Explorer link for a transaction.
    pub fn tx_url(&self, tx_hash: &TxHash) -> String {
        let base = self.explorer_base_url.trim_end_matches('/');
        format!("{base}/tx/{tx_hash}")
    }

    /// Parameters for a wallet network-registration request.
    pub fn add_chain_params(&self) -> Value {
        json!({
            "chainId": self.chain_id.to_hex(),
            "chainName": self.name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": self.rpc_endpoints,
            "blockExplorerUrls": [self.explorer_base_url],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_arc_testnet() {
        let network = NetworkDescriptor::default();
        assert_eq!(network.chain_id, ChainId(5_042_002));
        assert_eq!(network.primary_rpc(), Some("https://rpc.testnet.arc.network"));
        assert_eq!(network.native_currency.decimals, 18);
    }

    #[test]
    fn test_tx_url() {
        let network = NetworkDescriptor::default();
        let url = network.tx_url(&TxHash::ZERO);
        assert!(url.starts_with("https://testnet.arcscan.app/tx/0x"));
        assert!(!url.contains("app//tx"));
    }

    #[test]
    fn test_add_chain_params_shape() {
        let params = NetworkDescriptor::default().add_chain_params();
        assert_eq!(params["chainId"], "0x4cef52");
        assert_eq!(params["chainName"], "Arc Testnet");
        assert_eq!(params["nativeCurrency"]["symbol"], "USDC");
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
        assert_eq!(params["rpcUrls"].as_array().map(Vec::len), Some(4));
        assert_eq!(params["blockExplorerUrls"][0], "https://testnet.arcscan.app/");
    }
}
