//! Lifecycle of a single wallet-signed transaction.

use std::fmt;

use alloy_primitives::TxHash;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    chain::{CallRequest, ChainClient, Receipt},
    error::{ActionError, DeskError},
};

/// The write operations the desk can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    Approve,
    Fill,
    Cancel,
    CreateOffer,
    TransferAll,
}

impl TxKind {
    /// Status text shown next to the control that triggered the operation.
    ///
    /// `None` while nothing has been submitted.
    pub fn status_line(&self, state: &TxState) -> Option<String> {
        let line = match (self, state) {
            (_, TxState::Idle) => return None,

            (Self::Approve, TxState::WalletPending | TxState::ChainPending(_)) => "Approving…",
            (Self::Approve, TxState::Confirmed(_)) => {
                "Approval confirmed. You can now fill the offer."
            }
            (Self::Approve, TxState::Failed(_)) => "Error approving payment token",

            (Self::Fill, TxState::WalletPending | TxState::ChainPending(_)) => "Filling…",
            (Self::Fill, TxState::Confirmed(_)) => "Offer filled successfully",
            (Self::Fill, TxState::Failed(_)) => "Error filling offer",

            (Self::Cancel, TxState::WalletPending | TxState::ChainPending(_)) => "Canceling…",
            (Self::Cancel, TxState::Confirmed(_)) => "Offer cancelled",
            (Self::Cancel, TxState::Failed(_)) => "Error canceling offer",

            (Self::CreateOffer, TxState::WalletPending) => "Creating offer...",
            (Self::CreateOffer, TxState::ChainPending(_)) => {
                "Waiting for transaction confirmation..."
            }
            (Self::CreateOffer, TxState::Confirmed(_)) => "Offer created",
            (Self::CreateOffer, TxState::Failed(_)) => "Error creating offer. Please try again.",

            (Self::TransferAll, TxState::WalletPending | TxState::ChainPending(_)) => {
                "Processing..."
            }
            (Self::TransferAll, TxState::Confirmed(_)) => "Offer funded successfully!",
            (Self::TransferAll, TxState::Failed(err)) => {
                return Some(match err {
                    DeskError::ConfirmationFailed(_) => format!("Tx error: {err}"),
                    _ => format!("Wallet error: {err}"),
                });
            }
        };
        Some(line.to_string())
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Fill => "fill",
            Self::Cancel => "cancel",
            Self::CreateOffer => "create offer",
            Self::TransferAll => "transfer all",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TxState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Waiting for the wallet to sign.
    WalletPending,
    /// Submitted, waiting to be mined.
    ChainPending(TxHash),
    Confirmed(Receipt),
    Failed(DeskError),
}

impl TxState {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::WalletPending | Self::ChainPending(_))
    }

    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::ChainPending(hash) => Some(*hash),
            Self::Confirmed(receipt) => Some(receipt.transaction_hash),
            _ => None,
        }
    }

    pub const fn error(&self) -> Option<&DeskError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Drives one user-initiated write from `Idle` to `Confirmed` or `Failed`.
///
/// A tracker is single use: once it left `Idle` every further submission is
/// rejected, so a pending or finished operation can never be sent twice.
/// Retrying means creating a new tracker.
#[derive(Debug)]
pub struct TxTracker {
    kind: TxKind,
    state: watch::Sender<TxState>,
}

impl TxTracker {
    pub fn new(kind: TxKind) -> Self {
        let (state, _) = watch::channel(TxState::Idle);
        Self { kind, state }
    }

    pub const fn kind(&self) -> TxKind {
        self.kind
    }

    pub fn state(&self) -> TxState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TxState> {
        self.state.subscribe()
    }

    /// True while waiting on the wallet or the chain.
    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub fn status_line(&self) -> Option<String> {
        self.kind.status_line(&self.state.borrow())
    }

    /// Submits `request` and waits for it to be mined.
    pub async fn submit(
        &self,
        client: &dyn ChainClient,
        request: CallRequest,
    ) -> Result<Receipt, DeskError> {
        self.submit_and_then(client, request, |receipt| Ok(receipt.clone()))
            .await
    }

    /// Like [`Self::submit`], but the operation only counts as confirmed once
    /// `then` accepted the receipt.
    pub async fn submit_and_then<T>(
        &self,
        client: &dyn ChainClient,
        request: CallRequest,
        then: impl FnOnce(&Receipt) -> Result<T, DeskError>,
    ) -> Result<T, DeskError> {
        let claimed = self.state.send_if_modified(|state| {
            if state.is_idle() {
                *state = TxState::WalletPending;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(ActionError::AlreadySubmitted(self.kind).into());
        }
        debug!(kind = %self.kind, to = %request.to, "awaiting wallet signature");

        match self.drive(client, request, then).await {
            Ok((receipt, value)) => {
                info!(
                    kind = %self.kind,
                    tx_hash = %receipt.transaction_hash,
                    block = ?receipt.block_number,
                    "transaction confirmed"
                );
                self.state.send_replace(TxState::Confirmed(receipt));
                Ok(value)
            }
            Err(err) => {
                warn!(kind = %self.kind, %err, "transaction failed");
                self.state.send_replace(TxState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    async fn drive<T>(
        &self,
        client: &dyn ChainClient,
        request: CallRequest,
        then: impl FnOnce(&Receipt) -> Result<T, DeskError>,
    ) -> Result<(Receipt, T), DeskError> {
        let tx_hash = client.write(request).await?;
        info!(kind = %self.kind, %tx_hash, "transaction submitted");
        self.state.send_replace(TxState::ChainPending(tx_hash));

        let receipt = client.wait_for_confirmation(tx_hash).await?;
        if !receipt.success {
            return Err(DeskError::ConfirmationFailed(format!(
                "transaction {tx_hash} reverted"
            )));
        }
        let value = then(&receipt)?;
        Ok((receipt, value))
    }
}
