//! Classified results of a submitted transaction.

use alloy::primitives::TxHash;

use crate::error::Error;
use crate::session::signer::Receipt;

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Mined successfully.
    Confirmed(Receipt),
    /// The wait was abandoned; the transaction may still land.
    TimedOut { tx_hash: TxHash, explorer_url: String },
    /// The contract reverted.
    Reverted(String),
    /// The user declined to sign.
    Rejected,
}

impl TransactionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransactionOutcome::Confirmed(_))
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionOutcome::Confirmed(_) => "confirmed",
            TransactionOutcome::TimedOut { .. } => "timed_out",
            TransactionOutcome::Reverted(_) => "reverted",
            TransactionOutcome::Rejected => "rejected",
        }
    }

    /// Message for the status reporter.
    pub fn describe(&self) -> String {
        match self {
            TransactionOutcome::Confirmed(receipt) => match receipt.block_number {
                Some(block) => format!("Transaction confirmed in block {block}"),
                None => "Transaction confirmed".to_string(),
            },
            TransactionOutcome::TimedOut { explorer_url, .. } => format!(
                "Transaction taking too long. It may still confirm, please check explorer: {explorer_url}"
            ),
            TransactionOutcome::Reverted(reason) => format!("Transaction reverted: {reason}"),
            TransactionOutcome::Rejected => "Transaction rejected in wallet".to_string(),
        }
    }

    /// The receipt on success, the matching [`Error`] otherwise.
    pub fn into_result(self) -> Result<Receipt, Error> {
        match self {
            TransactionOutcome::Confirmed(receipt) => Ok(receipt),
            TransactionOutcome::TimedOut {
                tx_hash,
                explorer_url,
            } => Err(Error::TimedOut {
                tx_hash,
                explorer_url,
            }),
            TransactionOutcome::Reverted(reason) => Err(Error::Reverted(reason)),
            TransactionOutcome::Rejected => Err(Error::UserRejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_out_points_to_explorer() {
        let outcome = TransactionOutcome::TimedOut {
            tx_hash: TxHash::ZERO,
            explorer_url: "https://testnet.arcscan.app/tx/0xabc".into(),
        };
        assert!(!outcome.is_confirmed());
        assert_eq!(outcome.label(), "timed_out");
        let message = outcome.describe();
        assert!(message.contains("https://testnet.arcscan.app/tx/0xabc"));
        assert!(!message.to_lowercase().contains("failed"));
    }

    #[test]
    fn test_reverted_forwards_reason() {
        let outcome = TransactionOutcome::Reverted("Username not found".into());
        assert_eq!(outcome.describe(), "Transaction reverted: Username not found");
    }

    #[test]
    fn test_into_result() {
        let err = TransactionOutcome::TimedOut {
            tx_hash: TxHash::ZERO,
            explorer_url: "https://testnet.arcscan.app/tx/0x0".into(),
        }
        .into_result()
        .unwrap_err();
        assert!(err.is_pending());
        assert!(err.to_string().contains("check explorer"));

        let err = TransactionOutcome::Rejected.into_result().unwrap_err();
        assert!(matches!(err, Error::UserRejected));
        assert!(!err.is_pending());
    }
}
