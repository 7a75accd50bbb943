//! Application orchestrator.
//!
//! Owns the negotiator, the submitter and the status reporter, and wires
//! the workflows to them. Every operation boundary turns failures into a
//! status message before handing them back; nothing here panics.

use std::future::Future;
use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::broadcast::error::RecvError;

use crate::blockchain::wallet::LocalWallet;
use crate::config::schema::AppConfig;
use crate::contracts::handles::ContractAddresses;
use crate::error::{Error, Result};
use crate::payments::lookup;
use crate::payments::registration::register_username;
use crate::payments::workflow::{send_payment, PaymentReport, PaymentRequest};
use crate::session::negotiator::{Session, SessionNegotiator};
use crate::session::provider::{WalletEvent, WalletProvider};
use crate::status::{Channel, Severity, StatusReporter};
use crate::transactions::outcome::TransactionOutcome;
use crate::transactions::submitter::TransactionSubmitter;

/// Shown when the session's account has no username, or there is no session.
pub const NOT_REGISTERED: &str = "Not registered";

pub struct UsernamePayApp {
    config: AppConfig,
    negotiator: SessionNegotiator,
    submitter: TransactionSubmitter,
    reporter: Arc<dyn StatusReporter>,
    username: Option<String>,
}

impl UsernamePayApp {
    /// `wallet` is `None` when no wallet is available.
    pub fn new(
        config: AppConfig,
        wallet: Option<Arc<dyn WalletProvider>>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        let addresses = ContractAddresses {
            payment: config.contracts.payment_address,
            token: config.contracts.token_address,
        };
        let submitter = TransactionSubmitter::from_config(&config);
        let network = Arc::new(config.network.clone());
        Self {
            negotiator: SessionNegotiator::new(wallet, network, addresses),
            submitter,
            reporter,
            username: None,
            config,
        }
    }

    /// App backed by a [`LocalWallet`] whose key comes from the configured
    /// environment variable. A missing key means no wallet, not an error.
    pub fn from_config(config: AppConfig, reporter: Arc<dyn StatusReporter>) -> Result<Self> {
        let home = config
            .wallet
            .home_network
            .clone()
            .unwrap_or_else(|| config.network.clone());
        let wallet = LocalWallet::from_env(&config.wallet.private_key_env, home)?
            .map(|wallet| Arc::new(wallet) as Arc<dyn WalletProvider>);
        Ok(Self::new(config, wallet, reporter))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn submitter(&self) -> &TransactionSubmitter {
        &self.submitter
    }

    pub fn session(&self) -> Option<&Session> {
        self.negotiator.session()
    }

    /// `@name`, or "Not registered".
    pub fn username_display(&self) -> String {
        match &self.username {
            Some(name) => format!("@{name}"),
            None => NOT_REGISTERED.to_string(),
        }
    }

    fn require_session(&self) -> Result<&Session> {
        self.negotiator
            .session()
            .ok_or_else(|| Error::Validation("Wallet not connected".to_string()))
    }

    /// Acquire a session and load the account's username.
    pub async fn connect(&mut self) -> Result<()> {
        self.username = None;
        let short = match self.negotiator.acquire().await {
            Ok(session) => session.short_account(),
            Err(e) => {
                tracing::error!(error = %e, "Connection failed");
                self.reporter
                    .report(Channel::Wallet, Severity::Error, &format!("Failed: {e}"));
                return Err(e);
            }
        };

        self.refresh_username().await;
        self.reporter.report(
            Channel::Wallet,
            Severity::Success,
            &format!("Wallet Connected ({short})"),
        );
        Ok(())
    }

    /// Connect without prompting if the wallet already exposes an account.
    ///
    /// Returns whether a session was established.
    pub async fn restore(&mut self) -> Result<bool> {
        let restored = self.negotiator.restore().await.map(|session| session.is_some());
        match restored {
            Ok(true) => {
                self.refresh_username().await;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.reporter
                    .report(Channel::Wallet, Severity::Error, &format!("Failed: {e}"));
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.negotiator.disconnect();
        self.username = None;
        self.reporter
            .report(Channel::Wallet, Severity::Success, "Disconnected");
    }

    /// Register a username, then reload it from the contract.
    pub async fn register(&mut self, username: &str) -> Result<TransactionOutcome> {
        let outcome = register_username(
            self.negotiator.session(),
            &self.submitter,
            self.reporter.as_ref(),
            username,
        )
        .await?;

        if outcome.is_confirmed() {
            self.refresh_username().await;
        }
        Ok(outcome)
    }

    /// Approve if needed, then pay.
    pub async fn pay(&self, request: &PaymentRequest) -> PaymentReport {
        send_payment(
            self.negotiator.session(),
            &self.submitter,
            self.reporter.as_ref(),
            &self.config.contracts,
            request,
        )
        .await
    }

    /// Username of the connected account, re-read from the contract.
    pub async fn own_username(&self) -> Result<Option<String>> {
        lookup::own_username(self.require_session()?).await
    }

    pub async fn lookup_address(&self, username: &str) -> Result<Option<Address>> {
        lookup::lookup_address(self.require_session()?, username).await
    }

    pub async fn lookup_username(&self, account: Address) -> Result<Option<String>> {
        lookup::lookup_username(self.require_session()?, account).await
    }

    pub async fn is_available(&self, username: &str) -> Result<bool> {
        lookup::is_available(self.require_session()?, username).await
    }

    /// Token balance of the connected account, formatted with the token's decimals.
    pub async fn token_balance(&self) -> Result<String> {
        lookup::token_balance(self.require_session()?, self.config.contracts.token_decimals).await
    }

    async fn refresh_username(&mut self) {
        match self.own_username().await {
            Ok(username) => self.username = username,
            Err(e) => tracing::warn!(error = %e, "Could not load username"),
        }
    }

    /// Any wallet notification invalidates the session: tear it down and,
    /// unless the wallet went away, acquire a new one.
    ///
    /// A `ChainChanged` to the chain the session is already on is the echo
    /// of our own switch back to the target network and is ignored.
    pub async fn handle_wallet_event(&mut self, event: WalletEvent) {
        if let WalletEvent::ChainChanged(chain_id) = &event {
            if self.session().is_some_and(|s| s.chain_id() == *chain_id) {
                tracing::debug!(chain_id = *chain_id, "Session already on this chain");
                return;
            }
        }
        tracing::info!(?event, "Wallet changed, reloading session");
        self.negotiator.disconnect();
        self.username = None;

        let gone = match &event {
            WalletEvent::Disconnected => true,
            WalletEvent::AccountsChanged(accounts) => accounts.is_empty(),
            WalletEvent::ChainChanged(_) => false,
        };
        if gone {
            self.reporter
                .report(Channel::Wallet, Severity::Success, "Disconnected");
            return;
        }

        // Failure is already reported; the app stays disconnected.
        let _ = self.connect().await;
    }

    /// Follow wallet notifications until `shutdown` resolves.
    pub async fn run_events<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut events = self.negotiator.subscribe().ok_or(Error::NoWalletFound)?;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Stopping wallet event loop");
                    break;
                }
                received = events.recv() => match received {
                    Ok(event) => self.handle_wallet_event(event).await,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Missed wallet events, reloading session");
                        self.negotiator.disconnect();
                        let _ = self.connect().await;
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Wallet event stream closed");
                        break;
                    }
                },
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for UsernamePayApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsernamePayApp")
            .field("session", &self.negotiator.session())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
