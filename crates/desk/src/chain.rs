//! The boundary to the blockchain.
//!
//! Everything the desk knows about the chain goes through [`ChainClient`]: view
//! calls, wallet-signed writes, and waiting for receipts. The production
//! implementation lives in [`crate::provider`].

use alloy_primitives::{Address, Bytes, Log, TxHash};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use crate::error::DeskError;

/// A contract call aimed at a specific chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub input: Bytes,
    pub chain_id: u64,
}

impl CallRequest {
    pub fn new<C: SolCall>(to: Address, call: &C, chain_id: u64) -> Self {
        Self {
            to,
            input: call.abi_encode().into(),
            chain_id,
        }
    }

    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// What the desk keeps from a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// `false` if the transaction reverted.
    pub success: bool,
    pub logs: Vec<Log>,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The connected wallet, if any.
    fn current_address(&self) -> Option<Address>;

    /// Executes a view call and returns the raw return data.
    async fn read(&self, request: CallRequest) -> Result<Bytes, DeskError>;

    /// Asks the wallet to sign and submits a state-changing call.
    async fn write(&self, request: CallRequest) -> Result<TxHash, DeskError>;

    /// Resolves once the transaction is mined.
    ///
    /// There is no timeout: callers that stop caring simply drop the future.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Receipt, DeskError>;
}

/// Returns the connected account or [`DeskError::NoWallet`].
pub fn require_wallet(client: &dyn ChainClient) -> Result<Address, DeskError> {
    client.current_address().ok_or(DeskError::NoWallet)
}

/// Performs a typed view call.
pub async fn read_call<C>(
    client: &dyn ChainClient,
    to: Address,
    call: C,
    chain_id: u64,
) -> Result<C::Return, DeskError>
where
    C: SolCall + Send,
{
    let request = CallRequest::new(to, &call, chain_id);
    debug!(%to, function = C::SIGNATURE, chain_id, "reading contract");

    let output = client.read(request).await?;
    C::abi_decode_returns(&output).map_err(|err| {
        DeskError::ReadFailed(format!("failed to decode `{}` output: {err}", C::SIGNATURE))
    })
}
