//! Contract bindings.
//!
//! `abi.rs` declares the registry and token interfaces with `sol!`;
//! `handles.rs` binds them to a deployed address and a session signer.
//! `UsernamePay.sol` is the registry source printed by the deployment guide.

pub mod abi;
pub mod handles;

pub use abi::{IUsernamePay, IERC20, MAX_USERNAME_BYTES};
pub use handles::{ContractAddresses, ContractHandles, PaymentContract, TokenContract};

/// Solidity source of the registry contract.
pub const CONTRACT_SOURCE: &str = include_str!("UsernamePay.sol");
