//! Transaction submission and confirmation.
//!
//! # Responsibilities
//! - Apply the fixed gas policy to an intent, sign and broadcast it
//! - Race the confirmation against the configured timeout
//! - Classify the result into a [`TransactionOutcome`]
//!
//! # Guarantees
//! - At-most-once: nothing is ever resent
//! - A timeout abandons the wait only; the node wait keeps running detached
//!   and logs whatever it eventually sees

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::TxHash;
use tokio::time::timeout;

use crate::blockchain::network::NetworkDescriptor;
use crate::config::schema::AppConfig;
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::session::signer::{PendingTransaction, SigningCapability};
use crate::transactions::intent::{GasPolicy, TransactionIntent};
use crate::transactions::outcome::TransactionOutcome;

/// Sends intents and waits for them, one at a time.
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    gas: GasPolicy,
    approval_gas_limit: u64,
    confirmation_timeout: Duration,
    network: Arc<NetworkDescriptor>,
}

impl TransactionSubmitter {
    pub fn new(gas: GasPolicy, confirmation_timeout: Duration, network: Arc<NetworkDescriptor>) -> Self {
        Self {
            gas,
            approval_gas_limit: gas.gas_limit,
            confirmation_timeout,
            network,
        }
    }

    /// Submitter configured from the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            GasPolicy::from(&config.gas),
            Duration::from_secs(config.transactions.confirmation_timeout_secs),
            Arc::new(config.network.clone()),
        )
        .with_approval_gas_limit(config.gas.approval_gas_limit)
    }

    /// Gas limit used for token approvals.
    pub fn with_approval_gas_limit(mut self, gas_limit: u64) -> Self {
        self.approval_gas_limit = gas_limit;
        self
    }

    pub fn gas_policy(&self) -> &GasPolicy {
        &self.gas
    }

    pub fn approval_gas_limit(&self) -> u64 {
        self.approval_gas_limit
    }

    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Explorer link for a transaction on the target network.
    pub fn explorer_url(&self, tx_hash: &TxHash) -> String {
        self.network.tx_url(tx_hash)
    }

    /// Sign and broadcast `intent` with the gas policy applied.
    pub async fn send(
        &self,
        signer: &dyn SigningCapability,
        intent: TransactionIntent,
    ) -> Result<PendingTransaction> {
        let function = intent.function_name();
        let target = intent.target();
        let gas_limit = intent.effective_gas_limit(&self.gas);
        let request = intent.into_request(signer.address(), &self.gas);

        tracing::info!(
            function,
            target = %target,
            gas_limit,
            max_fee_per_gas = self.gas.max_fee_per_gas,
            "Submitting transaction"
        );

        let pending = signer.send_transaction(request).await?;

        tracing::info!(
            function,
            tx_hash = %pending.tx_hash(),
            explorer = %self.explorer_url(&pending.tx_hash()),
            "Transaction sent"
        );
        Ok(pending)
    }

    /// Wait for `pending`, giving up after the confirmation timeout.
    pub async fn confirm(
        &self,
        function: &'static str,
        pending: PendingTransaction,
    ) -> Result<TransactionOutcome> {
        let tx_hash = pending.tx_hash();
        let started = Instant::now();
        let deadline = self.confirmation_timeout;

        let watcher = tokio::spawn(async move {
            let result = pending.into_confirmation().await;
            let elapsed = started.elapsed();
            if elapsed > deadline {
                match &result {
                    Ok(receipt) => tracing::info!(
                        tx_hash = %tx_hash,
                        success = receipt.success,
                        elapsed_secs = elapsed.as_secs(),
                        "Transaction landed after the wait was abandoned"
                    ),
                    Err(e) => tracing::warn!(
                        tx_hash = %tx_hash,
                        error = %e,
                        "Abandoned confirmation wait failed"
                    ),
                }
            }
            result
        });

        let result = match timeout(deadline, watcher).await {
            Ok(Ok(Ok(receipt))) if receipt.success => Ok(TransactionOutcome::Confirmed(receipt)),
            Ok(Ok(Ok(receipt))) => {
                tracing::warn!(tx_hash = %receipt.tx_hash, "Receipt reports failure status");
                Ok(TransactionOutcome::Reverted(
                    "transaction reverted on-chain".to_string(),
                ))
            }
            Ok(Ok(Err(e))) => outcome_from_error(e),
            Ok(Err(join_error)) => Err(Error::Rpc {
                message: format!("confirmation watcher failed: {join_error}"),
                hint: None,
            }),
            Err(_) => {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    timeout_secs = deadline.as_secs(),
                    "Confirmation wait timed out; transaction not cancelled"
                );
                Ok(TransactionOutcome::TimedOut {
                    tx_hash,
                    explorer_url: self.explorer_url(&tx_hash),
                })
            }
        };

        if let Ok(outcome) = &result {
            metrics::record_confirmation(function, started.elapsed(), outcome);
        }
        result
    }

    /// Send and confirm, calling `on_broadcast` with the hash and explorer link in between.
    pub async fn submit_with<F>(
        &self,
        signer: &dyn SigningCapability,
        intent: TransactionIntent,
        on_broadcast: F,
    ) -> Result<TransactionOutcome>
    where
        F: FnOnce(TxHash, &str),
    {
        let function = intent.function_name();
        let pending = match self.send(signer, intent).await {
            Ok(pending) => pending,
            Err(e) => {
                let result = outcome_from_error(e);
                match &result {
                    Ok(outcome) => metrics::record_outcome(function, outcome.label()),
                    Err(_) => metrics::record_outcome(function, "rpc_error"),
                }
                return result;
            }
        };

        let tx_hash = pending.tx_hash();
        on_broadcast(tx_hash, &self.explorer_url(&tx_hash));
        self.confirm(function, pending).await
    }

    /// Send and confirm.
    pub async fn submit(
        &self,
        signer: &dyn SigningCapability,
        intent: TransactionIntent,
    ) -> Result<TransactionOutcome> {
        self.submit_with(signer, intent, |_, _| {}).await
    }
}

/// Rejections and reverts are outcomes; everything else stays an error.
fn outcome_from_error(err: Error) -> Result<TransactionOutcome> {
    match err {
        Error::UserRejected => Ok(TransactionOutcome::Rejected),
        Error::Reverted(reason) => Ok(TransactionOutcome::Reverted(reason)),
        other => Err(other),
    }
}
