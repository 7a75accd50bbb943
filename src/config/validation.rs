//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every problem found,
//! not just the first.

use alloy::primitives::Address;

use crate::blockchain::network::NetworkDescriptor;
use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_network("network", &config.network, &mut errors);

    if config.contracts.payment_address == Address::ZERO {
        errors.push(ValidationError::new(
            "contracts.payment_address",
            "must not be the zero address",
        ));
    }
    if config.contracts.token_address == Address::ZERO {
        errors.push(ValidationError::new(
            "contracts.token_address",
            "must not be the zero address",
        ));
    }
    if config.contracts.token_decimals > 77 {
        errors.push(ValidationError::new(
            "contracts.token_decimals",
            "must fit a uint256 scale (<= 77)",
        ));
    }

    let gas = &config.gas;
    if gas.max_fee_per_gas_gwei == 0 {
        errors.push(ValidationError::new("gas.max_fee_per_gas_gwei", "must be > 0"));
    }
    if gas.max_priority_fee_per_gas_gwei > gas.max_fee_per_gas_gwei {
        errors.push(ValidationError::new(
            "gas.max_priority_fee_per_gas_gwei",
            "must not exceed max_fee_per_gas_gwei",
        ));
    }
    if gas.gas_limit == 0 {
        errors.push(ValidationError::new("gas.gas_limit", "must be > 0"));
    }
    if gas.approval_gas_limit == 0 {
        errors.push(ValidationError::new("gas.approval_gas_limit", "must be > 0"));
    }

    if config.transactions.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transactions.confirmation_timeout_secs",
            "must be > 0",
        ));
    }

    if config.wallet.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("wallet.private_key_env", "must be set"));
    }
    if let Some(home) = &config.wallet.home_network {
        validate_network("wallet.home_network", home, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_network(prefix: &str, network: &NetworkDescriptor, errors: &mut Vec<ValidationError>) {
    if network.chain_id.0 == 0 {
        errors.push(ValidationError::new(
            &format!("{prefix}.chain_id"),
            "must be non-zero",
        ));
    }
    if network.rpc_endpoints.is_empty() {
        errors.push(ValidationError::new(
            &format!("{prefix}.rpc_endpoints"),
            "at least one endpoint is required",
        ));
    }
    for (i, endpoint) in network.rpc_endpoints.iter().enumerate() {
        if let Err(e) = endpoint.parse::<url::Url>() {
            errors.push(ValidationError::new(
                &format!("{prefix}.rpc_endpoints[{i}]"),
                format!("invalid URL '{endpoint}': {e}"),
            ));
        }
    }
    if let Err(e) = network.explorer_base_url.parse::<url::Url>() {
        errors.push(ValidationError::new(
            &format!("{prefix}.explorer_base_url"),
            format!("invalid URL: {e}"),
        ));
    }
}
