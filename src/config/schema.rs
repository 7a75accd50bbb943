//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file targets Arc Testnet.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::blockchain::network::NetworkDescriptor;

/// One gwei in wei.
pub const GWEI: u128 = 1_000_000_000;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Target network.
    pub network: NetworkDescriptor,

    /// Deployed contract addresses and token denomination.
    pub contracts: ContractsConfig,

    /// Fixed gas policy.
    pub gas: GasConfig,

    /// Confirmation settings.
    pub transactions: TransactionConfig,

    /// Local wallet settings.
    pub wallet: WalletConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployed contracts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Username registry / payment router.
    pub payment_address: Address,

    /// Stablecoin token contract.
    pub token_address: Address,

    /// Token symbol used in status messages.
    pub token_symbol: String,

    /// Token decimals. Not the native asset's decimals.
    pub token_decimals: u8,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            payment_address: address!("0x9d12E496e241B8412e0842936E0A0b723b06D5B8"),
            token_address: address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
            token_symbol: "USDC".to_string(),
            token_decimals: 6,
        }
    }
}

/// Gas parameters applied to every transaction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    /// Max fee per gas in gwei. Must sit above the network base fee (~160 gwei).
    pub max_fee_per_gas_gwei: u64,

    /// Max priority fee per gas in gwei.
    pub max_priority_fee_per_gas_gwei: u64,

    /// Gas limit for contract calls.
    pub gas_limit: u64,

    /// Gas limit for token approvals.
    pub approval_gas_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_fee_per_gas_gwei: 200,
            max_priority_fee_per_gas_gwei: 5,
            gas_limit: 600_000,
            approval_gas_limit: 100_000,
        }
    }
}

/// Transaction confirmation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// How long to wait for a confirmation before reporting a timeout.
    pub confirmation_timeout_secs: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 90,
        }
    }
}

/// Local wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,

    /// Network the wallet starts on. Defaults to the target network.
    pub home_network: Option<NetworkDescriptor>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "USERNAME_PAY_PRIVATE_KEY".to_string(),
            home_network: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
