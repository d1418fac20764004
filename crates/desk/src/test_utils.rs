//! In-memory [`ChainClient`] for tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use alloy_primitives::{Address, B256, Bytes, Log, LogData, TxHash};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    chain::{CallRequest, ChainClient, Receipt},
    error::DeskError,
};

/// How a scripted write ends.
#[derive(Debug, Clone)]
pub(crate) enum WriteOutcome {
    Reject(DeskError),
    Revert,
    ConfirmError(DeskError),
    Mined(Vec<Log>),
}

#[derive(Default)]
pub(crate) struct MockChainClient {
    account: Mutex<Option<Address>>,
    reads: Mutex<HashMap<(Address, [u8; 4]), Result<Bytes, DeskError>>>,
    read_count: AtomicU64,
    outcomes: Mutex<HashMap<[u8; 4], WriteOutcome>>,
    writes: Mutex<Vec<CallRequest>>,
    pending: Mutex<HashMap<TxHash, WriteOutcome>>,
    nonce: AtomicU64,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockChainClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_wallet(account: Address) -> Self {
        let client = Self::new();
        client.set_wallet(Some(account));
        client
    }

    pub(crate) fn set_wallet(&self, account: Option<Address>) {
        *self.account.lock().unwrap() = account;
    }

    /// Answers calls of `C` on `to` with already ABI-encoded return data.
    pub(crate) fn on_read<C: SolCall>(&self, to: Address, output: impl Into<Bytes>) {
        self.reads
            .lock()
            .unwrap()
            .insert((to, C::SELECTOR), Ok(output.into()));
    }

    pub(crate) fn fail_read<C: SolCall>(&self, to: Address, error: DeskError) {
        self.reads
            .lock()
            .unwrap()
            .insert((to, C::SELECTOR), Err(error));
    }

    pub(crate) fn on_write<C: SolCall>(&self, outcome: WriteOutcome) {
        self.outcomes.lock().unwrap().insert(C::SELECTOR, outcome);
    }

    /// Makes every confirmation wait until the returned handle is notified.
    pub(crate) fn hold_confirmations(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub(crate) fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> Vec<CallRequest> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn current_address(&self) -> Option<Address> {
        *self.account.lock().unwrap()
    }

    async fn read(&self, request: CallRequest) -> Result<Bytes, DeskError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        let selector = request.selector().unwrap_or_default();
        self.reads
            .lock()
            .unwrap()
            .get(&(request.to, selector))
            .cloned()
            .unwrap_or_else(|| Err(DeskError::ReadFailed("execution reverted".into())))
    }

    async fn write(&self, request: CallRequest) -> Result<TxHash, DeskError> {
        let outcome = request
            .selector()
            .and_then(|selector| self.outcomes.lock().unwrap().get(&selector).cloned())
            .unwrap_or(WriteOutcome::Mined(Vec::new()));
        self.writes.lock().unwrap().push(request);

        if let WriteOutcome::Reject(error) = outcome {
            return Err(error);
        }
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_hash = B256::left_padding_from(&nonce.to_be_bytes());
        self.pending.lock().unwrap().insert(tx_hash, outcome);
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Receipt, DeskError> {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let outcome = self
            .pending
            .lock()
            .unwrap()
            .remove(&tx_hash)
            .ok_or_else(|| DeskError::ConfirmationFailed("transaction not found".into()))?;
        let receipt = |success, logs| Receipt {
            transaction_hash: tx_hash,
            block_number: Some(1),
            success,
            logs,
        };
        match outcome {
            WriteOutcome::Mined(logs) => Ok(receipt(true, logs)),
            WriteOutcome::Revert => Ok(receipt(false, Vec::new())),
            WriteOutcome::ConfirmError(error) | WriteOutcome::Reject(error) => Err(error),
        }
    }
}

/// Builds a log as emitted by `emitter`.
pub(crate) fn event_log<E: SolEvent>(emitter: Address, event: &E) -> Log {
    Log {
        address: emitter,
        data: event.encode_log_data(),
    }
}

/// A log no desk event decoder understands.
pub(crate) fn foreign_log(emitter: Address) -> Log {
    Log {
        address: emitter,
        data: LogData::new_unchecked(vec![B256::repeat_byte(0xee)], Bytes::from_static(b"junk")),
    }
}
