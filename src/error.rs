//! Error taxonomy shared by every subsystem.
//!
//! # Propagation
//! - `Validation` is raised before any network access
//! - Wallet and node failures are classified once, at the point they leave
//!   alloy or the wallet provider, and carried unchanged afterwards
//! - Nothing is retried; every variant renders as a message a user can act on

use alloy::primitives::TxHash;
use alloy::sol_types::decode_revert_reason;
use alloy::transports::TransportError;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::session::provider::WalletError;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC code for an internal node error.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Hint attached to node errors that match a known signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcHint {
    /// Internal node error, almost always too little gas or a congested network.
    InsufficientGasOrCongestion,
}

impl std::fmt::Display for RpcHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcHint::InsufficientGasOrCongestion => write!(
                f,
                "network error or insufficient gas; the network requires a high base fee"
            ),
        }
    }
}

/// Errors surfaced by sessions, transactions and workflows.
#[derive(Debug, Error)]
pub enum Error {
    /// No wallet provider is available in this environment.
    #[error("No Web3 wallet found")]
    NoWalletFound,

    /// The user declined a wallet request.
    #[error("Request rejected in wallet")]
    UserRejected,

    /// The wallet stayed on the wrong network after recovery was attempted.
    #[error("Wallet is on chain {actual}, expected chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    /// Local pre-flight check failed.
    #[error("{0}")]
    Validation(String),

    /// Node-level failure.
    #[error("{}", render_rpc(.message, .hint))]
    Rpc { message: String, hint: Option<RpcHint> },

    /// The contract reverted.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Confirmation did not arrive in time; the transaction may still land.
    #[error("Transaction taking too long. Please check explorer: {explorer_url}")]
    TimedOut { tx_hash: TxHash, explorer_url: String },

    /// Wallet provider failure that has no more specific classification.
    #[error("Wallet error: {0}")]
    Wallet(WalletError),

    /// Contract return data could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn render_rpc(message: &str, hint: &Option<RpcHint>) -> String {
    match hint {
        Some(hint) => format!("Error: {hint} ({message})"),
        None => format!("RPC error: {message}"),
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify a raw failure reported by a node or a wallet.
    ///
    /// `revert_reason` is the decoded revert string when the payload carried one.
    pub fn classify(code: Option<i64>, message: &str, revert_reason: Option<String>) -> Self {
        let lower = message.to_lowercase();

        if code == Some(USER_REJECTED_CODE)
            || lower.contains("user rejected")
            || lower.contains("user denied")
        {
            return Error::UserRejected;
        }

        if let Some(reason) = revert_reason {
            return Error::Reverted(reason);
        }
        if let Some(idx) = message.find("execution reverted") {
            let rest = message[idx + "execution reverted".len()..]
                .trim_start_matches(':')
                .trim();
            let reason = if rest.is_empty() { "execution reverted" } else { rest };
            return Error::Reverted(reason.to_string());
        }

        let hint = (code == Some(INTERNAL_ERROR_CODE)
            || message.contains("Internal JSON-RPC error"))
        .then_some(RpcHint::InsufficientGasOrCongestion);

        Error::Rpc {
            message: message.to_string(),
            hint,
        }
    }

    /// Classify an alloy transport error.
    pub fn from_transport(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => {
                let reason = payload
                    .as_revert_data()
                    .and_then(|data| decode_revert_reason(&data));
                Self::classify(Some(payload.code), &payload.message, reason)
            }
            None => Self::classify(None, &err.to_string(), None),
        }
    }

    /// Whether this error leaves the transaction state unknown rather than failed.
    pub fn is_pending(&self) -> bool {
        matches!(self, Error::TimedOut { .. })
    }
}

impl From<WalletError> for Error {
    fn from(err: WalletError) -> Self {
        match err.code {
            USER_REJECTED_CODE => Error::UserRejected,
            _ => Error::Wallet(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_by_code_and_message() {
        assert!(matches!(
            Error::classify(Some(4001), "whatever", None),
            Error::UserRejected
        ));
        assert!(matches!(
            Error::classify(None, "MetaMask Tx Signature: User denied transaction signature.", None),
            Error::UserRejected
        ));
    }

    #[test]
    fn test_internal_error_gets_gas_hint() {
        let err = Error::classify(Some(-32603), "Internal JSON-RPC error.", None);
        match &err {
            Error::Rpc { hint, .. } => {
                assert_eq!(*hint, Some(RpcHint::InsufficientGasOrCongestion))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("insufficient gas"));
    }

    #[test]
    fn test_revert_reason_extraction() {
        let err = Error::classify(Some(3), "execution reverted: Username not found", None);
        assert!(matches!(err, Error::Reverted(ref r) if r == "Username not found"));

        let err = Error::classify(Some(3), "execution reverted", None);
        assert!(matches!(err, Error::Reverted(ref r) if r == "execution reverted"));

        let err = Error::classify(Some(3), "anything", Some("Username already taken".into()));
        assert!(matches!(err, Error::Reverted(ref r) if r == "Username already taken"));
    }

    #[test]
    fn test_plain_rpc_error() {
        let err = Error::classify(Some(-32000), "nonce too low", None);
        assert!(matches!(err, Error::Rpc { hint: None, .. }));
        assert_eq!(err.to_string(), "RPC error: nonce too low");
    }

    #[test]
    fn test_wallet_error_conversion() {
        let rejected: Error = WalletError::new(4001, "User rejected the request.").into();
        assert!(matches!(rejected, Error::UserRejected));

        let other: Error = WalletError::new(-32002, "Request already pending").into();
        assert!(matches!(other, Error::Wallet(_)));
    }

    #[test]
    fn test_timed_out_is_pending() {
        let err = Error::TimedOut {
            tx_hash: TxHash::ZERO,
            explorer_url: "https://testnet.arcscan.app/tx/0x00".into(),
        };
        assert!(err.is_pending());
        assert!(err.to_string().contains("check explorer"));
    }
}
