//! Transaction intents and the gas policy applied to them.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;

use crate::config::schema::{GasConfig, GWEI};

/// Fixed EIP-1559 gas parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub gas_limit: u64,
}

impl From<&GasConfig> for GasPolicy {
    fn from(config: &GasConfig) -> Self {
        Self {
            max_fee_per_gas: u128::from(config.max_fee_per_gas_gwei) * GWEI,
            max_priority_fee_per_gas: u128::from(config.max_priority_fee_per_gas_gwei) * GWEI,
            gas_limit: config.gas_limit,
        }
    }
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self::from(&GasConfig::default())
    }
}

/// A contract call to be signed and sent. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    target: Address,
    signature: &'static str,
    calldata: Bytes,
    gas_limit: Option<u64>,
}

impl TransactionIntent {
    /// Intent for an ABI call on `target`.
    pub fn new<C: SolCall>(target: Address, call: &C) -> Self {
        Self {
            target,
            signature: C::SIGNATURE,
            calldata: call.abi_encode().into(),
            gas_limit: None,
        }
    }

    /// Override the policy's gas limit for this call only.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn target(&self) -> Address {
        self.target
    }

    /// Function name without the parameter list, e.g. `approve`.
    pub fn function_name(&self) -> &'static str {
        self.signature
            .split_once('(')
            .map_or(self.signature, |(name, _)| name)
    }

    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }

    /// Gas limit this intent will be sent with under `policy`.
    pub fn effective_gas_limit(&self, policy: &GasPolicy) -> u64 {
        self.gas_limit.unwrap_or(policy.gas_limit)
    }

    /// Build the request, with fees from `policy`.
    pub fn into_request(self, from: Address, policy: &GasPolicy) -> TransactionRequest {
        let gas_limit = self.effective_gas_limit(policy);
        TransactionRequest::default()
            .with_from(from)
            .with_to(self.target)
            .with_input(self.calldata)
            .with_max_fee_per_gas(policy.max_fee_per_gas)
            .with_max_priority_fee_per_gas(policy.max_priority_fee_per_gas)
            .with_gas_limit(gas_limit)
    }
}
