//! Username registration.

use tracing::Instrument;
use uuid::Uuid;

use crate::contracts::abi::MAX_USERNAME_BYTES;
use crate::error::{Error, Result};
use crate::session::negotiator::Session;
use crate::status::{Channel, Severity, StatusReporter};
use crate::transactions::outcome::TransactionOutcome;
use crate::transactions::submitter::TransactionSubmitter;

/// Trimmed username, or a validation error. Never touches the network.
pub fn validate_username(username: &str) -> Result<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Validation("Username is required".to_string()));
    }
    if username.len() > MAX_USERNAME_BYTES {
        return Err(Error::Validation(format!(
            "Username must be at most {MAX_USERNAME_BYTES} bytes"
        )));
    }
    Ok(username)
}

/// Register `username` for the session's account and wait for it.
///
/// Every update, including the final one, goes to `reporter` on the
/// register channel. Only a confirmed registration returns `Ok(Confirmed)`;
/// a timeout returns `Ok(TimedOut)` and is reported as still pending.
pub async fn register_username(
    session: Option<&Session>,
    submitter: &TransactionSubmitter,
    reporter: &dyn StatusReporter,
    username: &str,
) -> Result<TransactionOutcome> {
    let span = tracing::info_span!("registration", op_id = %Uuid::new_v4());
    let result = run(session, submitter, reporter, username)
        .instrument(span)
        .await;

    match &result {
        Ok(TransactionOutcome::Confirmed(_)) => {}
        Ok(outcome @ TransactionOutcome::TimedOut { .. }) => {
            reporter.report(Channel::Register, Severity::Loading, &outcome.describe())
        }
        Ok(outcome) => reporter.report(Channel::Register, Severity::Error, &outcome.describe()),
        Err(e) => reporter.report(Channel::Register, Severity::Error, &e.to_string()),
    }
    result
}

async fn run(
    session: Option<&Session>,
    submitter: &TransactionSubmitter,
    reporter: &dyn StatusReporter,
    username: &str,
) -> Result<TransactionOutcome> {
    let username = validate_username(username)?;
    let session = session.ok_or_else(|| Error::Validation("Wallet not connected".to_string()))?;

    reporter.report(
        Channel::Register,
        Severity::Loading,
        "Registering... please confirm in wallet",
    );

    let payment = &session.handles().payment;
    let intent = payment.register_username(username);
    let outcome = submitter
        .submit_with(session.signer().as_ref(), intent, |_, explorer_url| {
            reporter.report(
                Channel::Register,
                Severity::Loading,
                &format!("Transaction sent! View on explorer: {explorer_url}. Waiting..."),
            );
        })
        .await?;

    if let TransactionOutcome::Confirmed(receipt) = &outcome {
        for event in payment.registrations_in(receipt) {
            tracing::info!(
                username = %event.username,
                account = %event.userAddress,
                "Username registered"
            );
        }
        reporter.report(
            Channel::Register,
            Severity::Success,
            &format!("Registered @{username}"),
        );
    }
    Ok(outcome)
}
