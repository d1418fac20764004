//! JSON-RPC implementation of [`ChainClient`].

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::{RpcError, TransportErrorKind},
};
use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    chain::{CallRequest, ChainClient, Receipt},
    error::DeskError,
    session::WalletSession,
};

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;

/// Asked before every write. Returning `false` declines the signature.
pub type SignaturePrompt = Box<dyn Fn(&CallRequest) -> bool + Send + Sync>;

/// Talks to a node over HTTP, signing writes with a local key if one is set.
pub struct RpcChainClient {
    provider: DynProvider,
    chain_id: u64,
    session: WalletSession,
    confirmations: u64,
    prompt: Option<SignaturePrompt>,
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("chain_id", &self.chain_id)
            .field("account", &self.session.current_address())
            .field("confirmations", &self.confirmations)
            .field("prompt", &self.prompt.is_some())
            .finish_non_exhaustive()
    }
}

impl RpcChainClient {
    /// Read-only client. Writes fail with [`DeskError::NoWallet`].
    pub async fn connect(rpc_url: &str, chain_id: u64) -> Result<Self, DeskError> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|err| DeskError::ReadFailed(err.to_string()))?
            .erased();
        Self::verified(provider, chain_id, WalletSession::new()).await
    }

    /// Client signing with `signer`, whose address becomes the connected wallet.
    pub async fn connect_with_signer(
        rpc_url: &str,
        chain_id: u64,
        signer: PrivateKeySigner,
    ) -> Result<Self, DeskError> {
        let session = WalletSession::connected(signer.address());
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(rpc_url)
            .await
            .map_err(|err| DeskError::ReadFailed(err.to_string()))?
            .erased();
        Self::verified(provider, chain_id, session).await
    }

    async fn verified(
        provider: DynProvider,
        chain_id: u64,
        session: WalletSession,
    ) -> Result<Self, DeskError> {
        let actual = provider
            .get_chain_id()
            .await
            .map_err(|err| DeskError::ReadFailed(err.to_string()))?;
        if actual != chain_id {
            return Err(DeskError::ChainMismatch {
                expected: chain_id,
                actual,
            });
        }
        info!(chain_id, account = ?session.current_address(), "connected to node");

        Ok(Self {
            provider,
            chain_id,
            session,
            confirmations: 1,
            prompt: None,
        })
    }

    /// Blocks to wait for before a receipt counts, at least one.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn with_prompt(
        mut self,
        prompt: impl Fn(&CallRequest) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    fn check_chain(&self, request: &CallRequest) -> Result<(), DeskError> {
        if request.chain_id != self.chain_id {
            return Err(DeskError::ChainMismatch {
                expected: request.chain_id,
                actual: self.chain_id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn current_address(&self) -> Option<Address> {
        self.session.current_address()
    }

    async fn read(&self, request: CallRequest) -> Result<Bytes, DeskError> {
        self.check_chain(&request)?;
        let tx = TransactionRequest::default()
            .to(request.to)
            .input(request.input.into());

        self.provider
            .call(tx)
            .await
            .map_err(|err| DeskError::ReadFailed(err.to_string()))
    }

    async fn write(&self, request: CallRequest) -> Result<TxHash, DeskError> {
        self.check_chain(&request)?;
        let from = self.current_address().ok_or(DeskError::NoWallet)?;

        if let Some(prompt) = &self.prompt
            && !prompt(&request)
        {
            debug!(to = %request.to, "signature declined");
            return Err(DeskError::UserRejected);
        }

        let tx = TransactionRequest::default()
            .from(from)
            .to(request.to)
            .input(request.input.into())
            .with_chain_id(request.chain_id);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(submission_error)?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Receipt, DeskError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|err| DeskError::ConfirmationFailed(err.to_string()))?;

        if !receipt.status() {
            warn!(%tx_hash, "transaction reverted");
        }
        Ok(Receipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }
}

fn submission_error(err: RpcError<TransportErrorKind>) -> DeskError {
    match err.as_error_resp() {
        Some(payload) if payload.code == USER_REJECTED_CODE => DeskError::UserRejected,
        _ => DeskError::SubmissionFailed(err.to_string()),
    }
}
