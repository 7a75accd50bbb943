//! Approve-then-pay workflow.
//!
//! # States
//! ```text
//! Idle → AllowanceCheck → [Approving] → Paying → Done
//!                                   ↘           ↘ Failed
//!                                    Unconfirmed (timed out, may still land)
//! ```
//!
//! The payment is never sent before a required approval has confirmed.
//! Validation failures end in `Failed` without touching the network.

use alloy::primitives::U256;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::schema::ContractsConfig;
use crate::contracts::IUsernamePay;
use crate::error::{Error, Result};
use crate::payments::amount::to_smallest_unit;
use crate::session::negotiator::Session;
use crate::status::{Channel, Severity, StatusReporter};
use crate::transactions::allowance::{ensure_allowance_with, AllowanceStatus};
use crate::transactions::outcome::TransactionOutcome;
use crate::transactions::submitter::TransactionSubmitter;

/// Message attached to a payment when the user leaves it blank.
pub const DEFAULT_MESSAGE: &str = "Payment";

/// What the user asked for, as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentRequest {
    pub recipient: String,
    pub amount: String,
    pub message: String,
}

impl PaymentRequest {
    pub fn new(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn message_or_default(&self) -> &str {
        match self.message.trim() {
            "" => DEFAULT_MESSAGE,
            message => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Idle,
    AllowanceCheck,
    Approving,
    Paying,
    Done,
    Failed,
    /// A transaction timed out; its fate is unknown.
    Unconfirmed,
}

impl PaymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentState::Done | PaymentState::Failed | PaymentState::Unconfirmed
        )
    }
}

/// How a payment attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReport {
    /// Terminal state.
    pub state: PaymentState,
    /// Every state visited, in order, starting with `Idle`.
    pub trail: Vec<PaymentState>,
    /// Amount in token smallest units, once validated.
    pub amount: Option<U256>,
    /// Outcome of the last transaction submitted, if any.
    pub outcome: Option<TransactionOutcome>,
    /// `PaymentSent` decoded from the confirmed payment receipt.
    pub event: Option<IUsernamePay::PaymentSent>,
    /// Final message sent to the reporter.
    pub message: String,
}

impl PaymentReport {
    pub fn is_done(&self) -> bool {
        self.state == PaymentState::Done
    }
}

struct Progress<'a> {
    reporter: &'a dyn StatusReporter,
    trail: Vec<PaymentState>,
    amount: Option<U256>,
}

impl<'a> Progress<'a> {
    fn new(reporter: &'a dyn StatusReporter) -> Self {
        Self {
            reporter,
            trail: vec![PaymentState::Idle],
            amount: None,
        }
    }

    fn enter(&mut self, state: PaymentState) {
        tracing::debug!(?state, "Payment state");
        self.trail.push(state);
    }

    fn loading(&self, message: &str) {
        self.reporter.report(Channel::Send, Severity::Loading, message);
    }

    fn finish(
        mut self,
        state: PaymentState,
        outcome: Option<TransactionOutcome>,
        message: String,
    ) -> PaymentReport {
        let severity = match state {
            PaymentState::Done => Severity::Success,
            PaymentState::Unconfirmed => Severity::Loading,
            _ => Severity::Error,
        };
        self.enter(state);
        self.reporter.report(Channel::Send, severity, &message);
        PaymentReport {
            state,
            trail: self.trail,
            amount: self.amount,
            outcome,
            event: None,
            message,
        }
    }

    fn fail(self, err: &Error) -> PaymentReport {
        self.finish(PaymentState::Failed, None, err.to_string())
    }

    /// Terminal report for a non-confirmed outcome.
    fn settle(self, outcome: TransactionOutcome) -> PaymentReport {
        let state = match outcome {
            TransactionOutcome::TimedOut { .. } => PaymentState::Unconfirmed,
            _ => PaymentState::Failed,
        };
        let message = outcome.describe();
        self.finish(state, Some(outcome), message)
    }
}

fn preflight<'s>(
    session: Option<&'s Session>,
    request: &PaymentRequest,
    decimals: u8,
) -> Result<(&'s Session, U256)> {
    if request.recipient.trim().is_empty() {
        return Err(Error::Validation("Recipient username is required".to_string()));
    }
    let amount = to_smallest_unit(&request.amount, decimals)?;
    let session = session.ok_or_else(|| Error::Validation("Wallet not connected".to_string()))?;
    Ok((session, amount))
}

/// Run one payment attempt to a terminal state.
///
/// Never returns an error: every failure ends up in the report and in a
/// status message.
pub async fn send_payment(
    session: Option<&Session>,
    submitter: &TransactionSubmitter,
    reporter: &dyn StatusReporter,
    token: &ContractsConfig,
    request: &PaymentRequest,
) -> PaymentReport {
    let span = tracing::info_span!(
        "payment",
        op_id = %Uuid::new_v4(),
        recipient = %request.recipient.trim()
    );
    run(session, submitter, reporter, token, request)
        .instrument(span)
        .await
}

async fn run(
    session: Option<&Session>,
    submitter: &TransactionSubmitter,
    reporter: &dyn StatusReporter,
    token: &ContractsConfig,
    request: &PaymentRequest,
) -> PaymentReport {
    let mut progress = Progress::new(reporter);

    let (session, amount) = match preflight(session, request, token.token_decimals) {
        Ok(checked) => checked,
        Err(e) => return progress.fail(&e),
    };
    progress.amount = Some(amount);
    let recipient = request.recipient.trim();
    let handles = session.handles();

    progress.enter(PaymentState::AllowanceCheck);
    let approving_message = format!("Step 1/2: Approving {}...", token.token_symbol);
    let status = ensure_allowance_with(
        submitter,
        &handles.token,
        handles.payment.address(),
        amount,
        || {
            progress.enter(PaymentState::Approving);
            progress.loading(&approving_message);
        },
    )
    .await;

    match status {
        Ok(AllowanceStatus::AlreadySufficient) => {}
        Ok(AllowanceStatus::Approved(TransactionOutcome::Confirmed(receipt))) => {
            tracing::info!(tx_hash = %receipt.tx_hash, "Approval confirmed");
        }
        Ok(AllowanceStatus::Approved(outcome)) => return progress.settle(outcome),
        Err(e) => return progress.fail(&e),
    }

    progress.enter(PaymentState::Paying);
    progress.loading("Step 2/2: Confirming Payment...");

    let intent = handles
        .payment
        .pay_by_username(recipient, amount, request.message_or_default());
    let result = submitter
        .submit_with(session.signer().as_ref(), intent, |_, explorer_url| {
            progress.loading(&format!(
                "Payment sent! View on explorer: {explorer_url}. Waiting..."
            ));
        })
        .await;

    match result {
        Ok(TransactionOutcome::Confirmed(receipt)) => {
            let event = handles.payment.payments_in(&receipt).into_iter().next();
            match &event {
                Some(sent) => tracing::info!(
                    tx_hash = %receipt.tx_hash,
                    from = %sent.fromUsername,
                    to = %sent.toUsername,
                    amount = %sent.amount,
                    message = %sent.message,
                    "Payment confirmed"
                ),
                None => tracing::warn!(
                    tx_hash = %receipt.tx_hash,
                    %amount,
                    "Payment confirmed without a PaymentSent event"
                ),
            }
            let message = format!("Sent ${} to @{recipient}", request.amount.trim());
            let mut report = progress.finish(
                PaymentState::Done,
                Some(TransactionOutcome::Confirmed(receipt)),
                message,
            );
            report.event = event;
            report
        }
        Ok(outcome) => progress.settle(outcome),
        Err(e) => progress.fail(&e),
    }
}
