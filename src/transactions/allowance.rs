//! Allowance guard: make sure a spender may move enough tokens before paying.

use alloy::primitives::{Address, U256};

use crate::contracts::handles::TokenContract;
use crate::error::Result;
use crate::transactions::outcome::TransactionOutcome;
use crate::transactions::submitter::TransactionSubmitter;

/// Result of [`ensure_allowance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowanceStatus {
    /// Current allowance already covers the amount; nothing was sent.
    AlreadySufficient,
    /// An approval for `U256::MAX` was submitted; this is how it ended.
    Approved(TransactionOutcome),
}

/// Raise `spender`'s allowance to the maximum if it is below `minimum`.
///
/// Reads with `eth_call` first and only submits when needed, waiting for the
/// approval's outcome before returning.
pub async fn ensure_allowance(
    submitter: &TransactionSubmitter,
    token: &TokenContract,
    spender: Address,
    minimum: U256,
) -> Result<AllowanceStatus> {
    ensure_allowance_with(submitter, token, spender, minimum, || {}).await
}

/// Like [`ensure_allowance`], calling `on_approving` right before an approval is sent.
pub async fn ensure_allowance_with<F>(
    submitter: &TransactionSubmitter,
    token: &TokenContract,
    spender: Address,
    minimum: U256,
    on_approving: F,
) -> Result<AllowanceStatus>
where
    F: FnOnce(),
{
    let current = token.allowance(token.owner(), spender).await?;
    if current >= minimum {
        tracing::debug!(%current, %minimum, "Allowance already sufficient");
        return Ok(AllowanceStatus::AlreadySufficient);
    }

    tracing::info!(
        %current,
        %minimum,
        spender = %spender,
        "Allowance insufficient, approving maximum"
    );
    on_approving();
    let intent = token
        .approve(spender, U256::MAX)
        .with_gas_limit(submitter.approval_gas_limit());
    let outcome = submitter.submit(token.signer().as_ref(), intent).await?;
    Ok(AllowanceStatus::Approved(outcome))
}
