//! Shared mocks for integration tests: an in-memory chain, a scripted
//! signer bound to it, a scripted wallet and a recording status reporter.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, Log, TxHash, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use tokio::sync::broadcast;

use username_pay::blockchain::NetworkDescriptor;
use username_pay::config::AppConfig;
use username_pay::contracts::{ContractAddresses, IUsernamePay, IERC20};
use username_pay::error::{Error, Result};
use username_pay::session::{
    PendingTransaction, Receipt, SigningCapability, WalletError, WalletEvent, WalletProvider,
};
use username_pay::status::{Channel, Severity, StatusReporter};

pub const TARGET_CHAIN: u64 = 5_042_002;

pub fn account() -> Address {
    Address::with_last_byte(0xaa)
}

pub fn addresses() -> ContractAddresses {
    let config = AppConfig::default();
    ContractAddresses {
        payment: config.contracts.payment_address,
        token: config.contracts.token_address,
    }
}

/// How the next broadcast transaction behaves.
#[derive(Debug, Clone)]
pub enum SendScript {
    /// Mined immediately.
    Confirm,
    /// Mined after a delay; effects apply only then.
    ConfirmAfter(Duration),
    /// Broadcast but never mined.
    Never,
    /// Mined with a failed status.
    FailedReceipt,
    /// Declined in the wallet.
    Reject,
    /// Rejected by the node with a revert reason.
    Revert(String),
    /// Node internal error.
    InternalError,
}

/// A transaction as it reached the chain.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub function: &'static str,
    pub to: Option<Address>,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub input: Bytes,
}

#[derive(Default)]
struct ChainState {
    allowance: U256,
    balance: U256,
    by_name: HashMap<String, Address>,
    by_address: HashMap<Address, String>,
    payments: Vec<(String, U256, String)>,
    scripts: VecDeque<SendScript>,
    /// "call:<fn>" and "send:<fn>" in order.
    log: Vec<String>,
    sent: Vec<SentTx>,
    nonce: u64,
}

/// In-memory registry and token contracts.
#[derive(Clone)]
pub struct MockChain {
    addresses: ContractAddresses,
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            addresses: addresses(),
            state: Arc::new(Mutex::new(ChainState::default())),
        }
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        self.state.lock().unwrap().allowance = allowance;
        self
    }

    pub fn with_balance(self, balance: U256) -> Self {
        self.state.lock().unwrap().balance = balance;
        self
    }

    pub fn with_username(self, name: &str, owner: Address) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.by_name.insert(name.to_string(), owner);
            state.by_address.insert(owner, name.to_string());
        }
        self
    }

    /// Queue behaviours for the next broadcasts, in order.
    pub fn script(&self, scripts: impl IntoIterator<Item = SendScript>) {
        self.state.lock().unwrap().scripts.extend(scripts);
    }

    pub fn allowance(&self) -> U256 {
        self.state.lock().unwrap().allowance
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_functions(&self) -> Vec<&'static str> {
        self.sent().iter().map(|tx| tx.function).collect()
    }

    pub fn payments(&self) -> Vec<(String, U256, String)> {
        self.state.lock().unwrap().payments.clone()
    }

    pub fn username_of(&self, owner: Address) -> Option<String> {
        self.state.lock().unwrap().by_address.get(&owner).cloned()
    }

    pub fn signer(&self, chain_id: u64) -> Arc<dyn SigningCapability> {
        Arc::new(MockSigner {
            chain: self.clone(),
            address: account(),
            chain_id,
        })
    }

    fn handle_call(&self, input: &[u8]) -> Result<Bytes> {
        let mut state = self.state.lock().unwrap();
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::Decode("short calldata".into()))?;

        let output = match selector {
            IERC20::allowanceCall::SELECTOR => {
                state.log.push("call:allowance".into());
                IERC20::allowanceCall::abi_encode_returns(&state.allowance)
            }
            IERC20::balanceOfCall::SELECTOR => {
                state.log.push("call:balanceOf".into());
                IERC20::balanceOfCall::abi_encode_returns(&state.balance)
            }
            IUsernamePay::isUsernameAvailableCall::SELECTOR => {
                state.log.push("call:isUsernameAvailable".into());
                let call = IUsernamePay::isUsernameAvailableCall::abi_decode(input).unwrap();
                let free = !state.by_name.contains_key(&call.username);
                IUsernamePay::isUsernameAvailableCall::abi_encode_returns(&free)
            }
            IUsernamePay::getAddressCall::SELECTOR => {
                state.log.push("call:getAddress".into());
                let call = IUsernamePay::getAddressCall::abi_decode(input).unwrap();
                let owner = state.by_name.get(&call.username).copied().unwrap_or_default();
                IUsernamePay::getAddressCall::abi_encode_returns(&owner)
            }
            IUsernamePay::getUsernameCall::SELECTOR => {
                state.log.push("call:getUsername".into());
                let call = IUsernamePay::getUsernameCall::abi_decode(input).unwrap();
                let name = state
                    .by_address
                    .get(&call.userAddress)
                    .cloned()
                    .unwrap_or_default();
                IUsernamePay::getUsernameCall::abi_encode_returns(&name)
            }
            other => panic!("unexpected call selector {other:?}"),
        };
        Ok(output.into())
    }

    /// Apply a mined transaction's effects and build its receipt.
    fn mine(&self, from: Address, input: &[u8], tx_hash: TxHash, success: bool) -> Receipt {
        let mut state = self.state.lock().unwrap();
        let mut logs = Vec::new();

        if success {
            if let Ok(call) = IERC20::approveCall::abi_decode(input) {
                state.allowance = call.amount;
            } else if let Ok(call) = IUsernamePay::registerUsernameCall::abi_decode(input) {
                state.by_name.insert(call.username.clone(), from);
                state.by_address.insert(from, call.username.clone());
                let event = IUsernamePay::UsernameRegistered {
                    username: call.username,
                    userAddress: from,
                };
                logs.push(Log {
                    address: self.addresses.payment,
                    data: event.encode_log_data(),
                });
            } else if let Ok(call) = IUsernamePay::payByUsernameCall::abi_decode(input) {
                state.allowance = state.allowance.saturating_sub(call.amount);
                state.balance = state.balance.saturating_sub(call.amount);
                let sender = state.by_address.get(&from).cloned().unwrap_or_default();
                let event = IUsernamePay::PaymentSent {
                    fromUsername: keccak256(sender.as_bytes()),
                    toUsername: keccak256(call.toUsername.as_bytes()),
                    amount: call.amount,
                    message: call.message.clone(),
                };
                logs.push(Log {
                    address: self.addresses.payment,
                    data: event.encode_log_data(),
                });
                state
                    .payments
                    .push((call.toUsername, call.amount, call.message));
            }
        }

        Receipt {
            tx_hash,
            block_number: Some(100 + state.nonce),
            gas_used: 50_000,
            success,
            logs,
        }
    }

    fn handle_send(&self, from: Address, request: TransactionRequest) -> Result<PendingTransaction> {
        let input = request.input.input().cloned().unwrap_or_default();
        let function = function_name(&input);

        let (script, tx_hash) = {
            let mut state = self.state.lock().unwrap();
            state.log.push(format!("send:{function}"));
            let script = state.scripts.pop_front().unwrap_or(SendScript::Confirm);
            match &script {
                SendScript::Reject => return Err(Error::UserRejected),
                SendScript::Revert(reason) => return Err(Error::Reverted(reason.clone())),
                SendScript::InternalError => {
                    return Err(Error::classify(
                        Some(-32603),
                        "Internal JSON-RPC error.",
                        None,
                    ))
                }
                _ => {}
            }
            state.nonce += 1;
            state.sent.push(SentTx {
                function,
                to: request.to.and_then(|kind| kind.to().copied()),
                gas_limit: request.gas,
                max_fee_per_gas: request.max_fee_per_gas,
                max_priority_fee_per_gas: request.max_priority_fee_per_gas,
                input: input.clone(),
            });
            (script, B256::with_last_byte(state.nonce as u8))
        };

        let chain = self.clone();
        let confirmation = async move {
            match script {
                SendScript::Never => std::future::pending().await,
                SendScript::ConfirmAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(chain.mine(from, &input, tx_hash, true))
                }
                SendScript::FailedReceipt => Ok(chain.mine(from, &input, tx_hash, false)),
                _ => Ok(chain.mine(from, &input, tx_hash, true)),
            }
        };
        Ok(PendingTransaction::new(tx_hash, confirmation))
    }
}

fn function_name(input: &[u8]) -> &'static str {
    let selector: [u8; 4] = match input.get(..4).and_then(|s| s.try_into().ok()) {
        Some(selector) => selector,
        None => return "unknown",
    };
    match selector {
        IERC20::approveCall::SELECTOR => "approve",
        IUsernamePay::registerUsernameCall::SELECTOR => "registerUsername",
        IUsernamePay::payByUsernameCall::SELECTOR => "payByUsername",
        _ => "unknown",
    }
}

/// Signer that talks to a [`MockChain`].
pub struct MockSigner {
    chain: MockChain,
    address: Address,
    chain_id: u64,
}

#[async_trait]
impl SigningCapability for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        let input = request.input.input().cloned().unwrap_or_default();
        self.chain.handle_call(&input)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<PendingTransaction> {
        self.chain.handle_send(self.address, request)
    }
}

struct WalletState {
    accounts: Vec<Address>,
    chain_id: u64,
    known: HashSet<u64>,
    /// Error returned by the next `switch_chain`, before anything else.
    switch_error: Option<WalletError>,
    /// Accept switches but stay on the current chain.
    stuck: bool,
    /// Error returned by `request_accounts`.
    accounts_error: Option<WalletError>,
    calls: Vec<String>,
}

/// Scripted EIP-1193 wallet.
pub struct MockWallet {
    chain: MockChain,
    state: Mutex<WalletState>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    /// Wallet on `chain_id` that only knows that chain.
    pub fn on_chain(chain: MockChain, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            chain,
            state: Mutex::new(WalletState {
                accounts: vec![account()],
                chain_id,
                known: HashSet::from([chain_id]),
                switch_error: None,
                stuck: false,
                accounts_error: None,
                calls: Vec::new(),
            }),
            events,
        }
    }

    pub fn on_target(chain: MockChain) -> Self {
        Self::on_chain(chain, TARGET_CHAIN)
    }

    pub fn knowing(self, chain_id: u64) -> Self {
        self.state.lock().unwrap().known.insert(chain_id);
        self
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.state.lock().unwrap().accounts = accounts;
        self
    }

    pub fn rejecting_accounts(self) -> Self {
        self.state.lock().unwrap().accounts_error =
            Some(WalletError::new(4001, "User rejected the request."));
        self
    }

    pub fn failing_switch(self, error: WalletError) -> Self {
        self.state.lock().unwrap().switch_error = Some(error);
        self
    }

    pub fn stuck(self) -> Self {
        self.state.lock().unwrap().stuck = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn current_chain(&self) -> u64 {
        self.state.lock().unwrap().chain_id
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    /// Move to another chain as if the user did it in the wallet.
    pub fn user_switches_to(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
        self.emit(WalletEvent::ChainChanged(chain_id));
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("request_accounts".into());
        match &state.accounts_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.accounts.clone()),
        }
    }

    async fn accounts(&self) -> std::result::Result<Vec<Address>, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("accounts".into());
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> std::result::Result<u64, WalletError> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> std::result::Result<(), WalletError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("switch_chain:{chain_id}"));
        if let Some(e) = state.switch_error.take() {
            return Err(e);
        }
        if !state.known.contains(&chain_id) {
            return Err(WalletError::new(4902, "Unrecognized chain ID"));
        }
        if !state.stuck && state.chain_id != chain_id {
            state.chain_id = chain_id;
            self.emit(WalletEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> std::result::Result<(), WalletError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("add_chain:{}", network.chain_id.to_hex()));
        state.known.insert(network.chain_id.0);
        if !state.stuck && state.chain_id != network.chain_id.0 {
            state.chain_id = network.chain_id.0;
            self.emit(WalletEvent::ChainChanged(network.chain_id.0));
        }
        Ok(())
    }

    async fn signer(&self) -> std::result::Result<Arc<dyn SigningCapability>, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("signer".into());
        Ok(self.chain.signer(state.chain_id))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// Reporter that keeps every update.
#[derive(Default)]
pub struct RecordingReporter {
    updates: Mutex<Vec<(Channel, Severity, String)>>,
}

impl RecordingReporter {
    pub fn updates(&self) -> Vec<(Channel, Severity, String)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn messages(&self, channel: Channel) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|(c, _, _)| *c == channel)
            .map(|(_, _, message)| message)
            .collect()
    }

    pub fn last(&self, channel: Channel) -> Option<(Severity, String)> {
        self.updates()
            .into_iter()
            .filter(|(c, _, _)| *c == channel)
            .map(|(_, severity, message)| (severity, message))
            .last()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, channel: Channel, severity: Severity, message: &str) {
        self.updates
            .lock()
            .unwrap()
            .push((channel, severity, message.to_string()));
    }
}
