//! Contract handles bound to a session's signer.
//!
//! Binding is pure: no I/O happens until a method is called. Reads go
//! through `eth_call`; writes come back as [`TransactionIntent`]s for the
//! submitter, so handles never sign anything themselves.

use std::sync::Arc;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolEvent};

use crate::contracts::abi::{IUsernamePay, IERC20};
use crate::error::{Error, Result};
use crate::session::signer::{Receipt, SigningCapability};
use crate::transactions::intent::TransactionIntent;

/// Deployed addresses the factory binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub payment: Address,
    pub token: Address,
}

/// Handles for both contracts, built from one signer.
#[derive(Clone)]
pub struct ContractHandles {
    pub payment: PaymentContract,
    pub token: TokenContract,
}

impl ContractHandles {
    /// Bind both ABIs to `signer`. Must be redone whenever the signer changes.
    pub fn build(signer: Arc<dyn SigningCapability>, addresses: ContractAddresses) -> Self {
        Self {
            payment: PaymentContract {
                address: addresses.payment,
                signer: Arc::clone(&signer),
            },
            token: TokenContract {
                address: addresses.token,
                signer,
            },
        }
    }
}

async fn read<C: SolCall>(
    signer: &dyn SigningCapability,
    target: Address,
    call: C,
) -> Result<C::Return> {
    let request = TransactionRequest::default()
        .with_from(signer.address())
        .with_to(target)
        .with_input(call.abi_encode());
    let output = signer.call(request).await?;
    C::abi_decode_returns(&output)
        .map_err(|e| Error::Decode(format!("{}: {e}", C::SIGNATURE)))
}

/// Username registry handle.
#[derive(Clone)]
pub struct PaymentContract {
    address: Address,
    signer: Arc<dyn SigningCapability>,
}

impl PaymentContract {
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signer this handle was bound with.
    pub fn signer(&self) -> &Arc<dyn SigningCapability> {
        &self.signer
    }

    pub async fn is_username_available(&self, username: &str) -> Result<bool> {
        let call = IUsernamePay::isUsernameAvailableCall {
            username: username.to_string(),
        };
        read(self.signer.as_ref(), self.address, call).await
    }

    /// Address registered for `username`; zero when unregistered.
    pub async fn get_address(&self, username: &str) -> Result<Address> {
        let call = IUsernamePay::getAddressCall {
            username: username.to_string(),
        };
        read(self.signer.as_ref(), self.address, call).await
    }

    /// Username registered by `user`; empty when unregistered.
    pub async fn get_username(&self, user: Address) -> Result<String> {
        let call = IUsernamePay::getUsernameCall { userAddress: user };
        read(self.signer.as_ref(), self.address, call).await
    }

    pub fn register_username(&self, username: &str) -> TransactionIntent {
        TransactionIntent::new(
            self.address,
            &IUsernamePay::registerUsernameCall {
                username: username.to_string(),
            },
        )
    }

    pub fn pay_by_username(&self, to: &str, amount: U256, message: &str) -> TransactionIntent {
        TransactionIntent::new(
            self.address,
            &IUsernamePay::payByUsernameCall {
                toUsername: to.to_string(),
                amount,
                message: message.to_string(),
            },
        )
    }

    /// `PaymentSent` events this contract emitted in `receipt`.
    pub fn payments_in(&self, receipt: &Receipt) -> Vec<IUsernamePay::PaymentSent> {
        self.decode_events(receipt)
    }

    /// `UsernameRegistered` events this contract emitted in `receipt`.
    pub fn registrations_in(&self, receipt: &Receipt) -> Vec<IUsernamePay::UsernameRegistered> {
        self.decode_events(receipt)
    }

    fn decode_events<E: SolEvent>(&self, receipt: &Receipt) -> Vec<E> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .filter_map(|log| E::decode_log_data(&log.data).ok())
            .collect()
    }
}

/// ERC-20 handle.
#[derive(Clone)]
pub struct TokenContract {
    address: Address,
    signer: Arc<dyn SigningCapability>,
}

impl TokenContract {
    pub fn address(&self) -> Address {
        self.address
    }

    /// Account the handle reads and signs for.
    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    /// Signer this handle was bound with.
    pub fn signer(&self) -> &Arc<dyn SigningCapability> {
        &self.signer
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        read(
            self.signer.as_ref(),
            self.address,
            IERC20::allowanceCall { owner, spender },
        )
        .await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        read(
            self.signer.as_ref(),
            self.address,
            IERC20::balanceOfCall { account },
        )
        .await
    }

    pub fn approve(&self, spender: Address, amount: U256) -> TransactionIntent {
        TransactionIntent::new(self.address, &IERC20::approveCall { spender, amount })
    }
}
