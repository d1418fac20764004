//! Error types for desk reads and writes.

use alloy_primitives::U256;

use crate::{tx::TxKind, units::UnitsError};

/// Failures surfaced to the user, scoped to the operation that triggered them.
///
/// None of these are retried automatically. A failed write leaves its
/// [`TxTracker`](crate::tx::TxTracker) in the `Failed` state and a new user
/// action is needed to try again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeskError {
    /// The wallet declined the signature request.
    #[error("request rejected in wallet")]
    UserRejected,
    /// The node refused the transaction before it was mined.
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),
    /// The transaction reverted, or its receipt could not be obtained.
    #[error("transaction failed: {0}")]
    ConfirmationFailed(String),
    /// A view call failed or returned data that could not be decoded.
    #[error("read failed: {0}")]
    ReadFailed(String),
    /// No wallet is connected.
    #[error("no wallet connected")]
    NoWallet,
    /// The request targets a different chain than the one the client is connected to.
    #[error("wrong network: expected chain {expected}, connected to {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Units(#[from] UnitsError),
}

/// A guarded action was triggered while it should have been disabled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The operation already left `Idle`; a fresh instance is needed.
    #[error("{0} was already submitted")]
    AlreadySubmitted(TxKind),
    #[error("approval has not been confirmed yet")]
    NotApproved,
    #[error("approved amount {approved} is below the requested {required}")]
    InsufficientApproval { approved: U256, required: U256 },
    #[error("only the seller can cancel this offer")]
    NotSeller,
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("no locked CRX to offer")]
    NothingLocked,
    /// Creating an offer moves ALL CRX into escrow, unlocked included.
    #[error(
        "creating an offer will transfer ALL of your locked and unlocked CRX to the escrow; \
         stake or transfer your unlocked CRX first"
    )]
    UnlockedBalanceTooHigh,
}
