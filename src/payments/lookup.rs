//! Read-only registry and balance queries.
//!
//! Nothing is cached; every call re-queries the contract.

use alloy::primitives::Address;

use crate::error::Result;
use crate::payments::amount::format_amount;
use crate::payments::registration::validate_username;
use crate::session::negotiator::Session;

/// Username registered by the session's own account.
pub async fn own_username(session: &Session) -> Result<Option<String>> {
    lookup_username(session, session.account()).await
}

/// Owner of `username`, `None` when it is not registered.
pub async fn lookup_address(session: &Session, username: &str) -> Result<Option<Address>> {
    let username = validate_username(username)?;
    let address = session.handles().payment.get_address(username).await?;
    Ok((!address.is_zero()).then_some(address))
}

/// Username registered by `account`, `None` when it has none.
pub async fn lookup_username(session: &Session, account: Address) -> Result<Option<String>> {
    let username = session.handles().payment.get_username(account).await?;
    Ok((!username.is_empty()).then_some(username))
}

pub async fn is_available(session: &Session, username: &str) -> Result<bool> {
    let username = validate_username(username)?;
    session.handles().payment.is_username_available(username).await
}

/// The session account's token balance as a decimal string.
pub async fn token_balance(session: &Session, decimals: u8) -> Result<String> {
    let token = &session.handles().token;
    let raw = token.balance_of(session.account()).await?;
    Ok(format_amount(raw, decimals))
}
