//! The user-facing write operations: approve and fill, cancel, create an offer
//! and fund it.
//!
//! Every flow owns one [`TxTracker`] per write, so two flows on different
//! offers never share state, and each flow checks the connected wallet before
//! anything is sent.

use alloy_primitives::{Address, Log, U256};
use alloy_sol_types::SolEvent;
use otcrx_contracts::{IERC20, ILockedCortex, ILockedCortexOffer, IOfferFactory};
use tracing::{debug, info, warn};

use crate::{
    balance::UserBalances,
    chain::{CallRequest, ChainClient, Receipt, require_wallet},
    error::{ActionError, DeskError},
    offers::{Offer, fetch_seller, is_seller},
    tx::{TxKind, TxTracker},
};

/// Largest amount an offer may ask for: one billion USDC.
pub const DEFAULT_MAX_AMOUNT_WANTED: U256 =
    U256::from_limbs([1_000_000_000_000_000, 0, 0, 0]);

/// Approve the offer to pull the wanted token, then fill it.
#[derive(Debug)]
pub struct FillFlow {
    offer_address: Address,
    token_wanted: Address,
    amount_wanted: U256,
    approval_amount: U256,
    chain_id: u64,
    approve: TxTracker,
    fill: TxTracker,
}

impl FillFlow {
    /// Approves exactly what the offer asks for.
    pub fn new(offer: &Offer, chain_id: u64) -> Self {
        Self {
            offer_address: offer.offer_address,
            token_wanted: offer.token_wanted,
            amount_wanted: offer.amount_wanted.raw(),
            approval_amount: offer.amount_wanted.raw(),
            chain_id,
            approve: TxTracker::new(TxKind::Approve),
            fill: TxTracker::new(TxKind::Fill),
        }
    }

    /// Overrides the approved amount. Fill is refused if it ends up below the
    /// offer's price.
    pub fn with_approval_amount(mut self, amount: U256) -> Self {
        self.approval_amount = amount;
        self
    }

    pub const fn approval(&self) -> &TxTracker {
        &self.approve
    }

    pub const fn filling(&self) -> &TxTracker {
        &self.fill
    }

    pub fn approve_enabled(&self) -> bool {
        self.approve.state().is_idle()
    }

    pub fn fill_enabled(&self) -> bool {
        self.approve.state().is_confirmed()
            && self.approval_amount >= self.amount_wanted
            && self.fill.state().is_idle()
    }

    pub async fn approve(&self, client: &dyn ChainClient) -> Result<Receipt, DeskError> {
        require_wallet(client)?;
        let call = IERC20::approveCall {
            spender: self.offer_address,
            amount: self.approval_amount,
        };
        debug!(
            offer = %self.offer_address,
            token = %self.token_wanted,
            amount = %self.approval_amount,
            "approving offer"
        );
        self.approve
            .submit(client, CallRequest::new(self.token_wanted, &call, self.chain_id))
            .await
    }

    pub async fn fill(&self, client: &dyn ChainClient) -> Result<Receipt, DeskError> {
        require_wallet(client)?;
        if !self.approve.state().is_confirmed() {
            return Err(ActionError::NotApproved.into());
        }
        if self.approval_amount < self.amount_wanted {
            return Err(ActionError::InsufficientApproval {
                approved: self.approval_amount,
                required: self.amount_wanted,
            }
            .into());
        }
        self.fill
            .submit(
                client,
                CallRequest::new(self.offer_address, &ILockedCortexOffer::fillCall {}, self.chain_id),
            )
            .await
    }
}

/// Cancel an offer. Only its seller may do so.
#[derive(Debug)]
pub struct CancelFlow {
    offer_address: Address,
    seller: Address,
    chain_id: u64,
    cancel: TxTracker,
}

impl CancelFlow {
    pub fn new(offer_address: Address, seller: Address, chain_id: u64) -> Self {
        Self {
            offer_address,
            seller,
            chain_id,
            cancel: TxTracker::new(TxKind::Cancel),
        }
    }

    /// Reads the offer's seller first.
    pub async fn load(
        client: &dyn ChainClient,
        offer_address: Address,
        chain_id: u64,
    ) -> Result<Self, DeskError> {
        let seller = fetch_seller(client, offer_address, chain_id).await?;
        Ok(Self::new(offer_address, seller, chain_id))
    }

    pub const fn seller(&self) -> Address {
        self.seller
    }

    pub const fn tracker(&self) -> &TxTracker {
        &self.cancel
    }

    pub fn cancel_enabled(&self, account: Option<Address>) -> bool {
        is_seller(self.seller, account) && self.cancel.state().is_idle()
    }

    /// The connected account, if it may cancel. A missing wallet is reported
    /// before the seller check.
    fn authorize(&self, client: &dyn ChainClient) -> Result<Address, DeskError> {
        let account = require_wallet(client)?;
        if !is_seller(self.seller, Some(account)) {
            return Err(ActionError::NotSeller.into());
        }
        Ok(account)
    }

    pub async fn cancel(&self, client: &dyn ChainClient) -> Result<Receipt, DeskError> {
        self.authorize(client)?;
        self.cancel
            .submit(
                client,
                CallRequest::new(
                    self.offer_address,
                    &ILockedCortexOffer::cancelCall {},
                    self.chain_id,
                ),
            )
            .await
    }
}

/// Deploy a new offer escrow through the factory.
#[derive(Debug)]
pub struct CreateOfferFlow {
    factory: Address,
    chain_id: u64,
    max_amount_wanted: U256,
    create: TxTracker,
}

impl CreateOfferFlow {
    pub fn new(factory: Address, chain_id: u64) -> Self {
        Self {
            factory,
            chain_id,
            max_amount_wanted: DEFAULT_MAX_AMOUNT_WANTED,
            create: TxTracker::new(TxKind::CreateOffer),
        }
    }

    pub fn with_max_amount_wanted(mut self, max: U256) -> Self {
        self.max_amount_wanted = max;
        self
    }

    pub const fn tracker(&self) -> &TxTracker {
        &self.create
    }

    /// The amount that will actually be requested.
    pub fn clamp(&self, amount_wanted: U256) -> U256 {
        amount_wanted.min(self.max_amount_wanted)
    }

    /// Creates the offer and returns the new escrow's address, taken from the
    /// factory's `OfferCreated` event.
    ///
    /// `balances` must be fresh: creating is refused when the escrow would
    /// also sweep unlocked CRX, or when nothing is locked.
    pub async fn create_offer(
        &self,
        client: &dyn ChainClient,
        balances: &UserBalances,
        token_wanted: Address,
        amount_wanted: U256,
    ) -> Result<Address, DeskError> {
        require_wallet(client)?;
        balances.offer_readiness()?;
        if amount_wanted.is_zero() {
            return Err(ActionError::ZeroAmount.into());
        }

        let amount = self.clamp(amount_wanted);
        if amount != amount_wanted {
            warn!(requested = %amount_wanted, max = %amount, "clamping amount wanted");
        }

        let call = IOfferFactory::createOfferCall {
            tokenWanted: token_wanted,
            amountWanted: amount,
        };
        let factory = self.factory;
        let offer = self
            .create
            .submit_and_then(
                client,
                CallRequest::new(factory, &call, self.chain_id),
                |receipt| {
                    extract_offer_address(&receipt.logs, factory).ok_or_else(|| {
                        DeskError::ConfirmationFailed(
                            "receipt has no OfferCreated event from the factory".into(),
                        )
                    })
                },
            )
            .await?;
        info!(%offer, %token_wanted, %amount, "offer created");
        Ok(offer)
    }
}

/// Finds the address of the offer deployed by `factory` among receipt logs.
///
/// Logs from other contracts, with another signature, or that fail to decode
/// are skipped.
pub fn extract_offer_address(logs: &[Log], factory: Address) -> Option<Address> {
    logs.iter()
        .filter(|log| {
            log.address == factory
                && log.topics().first() == Some(&IOfferFactory::OfferCreated::SIGNATURE_HASH)
        })
        .find_map(
            |log| match IOfferFactory::OfferCreated::decode_log(log) {
                Ok(event) => Some(event.offerAddress),
                Err(err) => {
                    debug!(%err, "skipping malformed OfferCreated log");
                    None
                }
            },
        )
}

/// Move every CRX of the connected account, locked included, into an escrow.
#[derive(Debug)]
pub struct TransferAllFlow {
    cortex: Address,
    chain_id: u64,
    transfer: TxTracker,
}

impl TransferAllFlow {
    pub fn new(cortex: Address, chain_id: u64) -> Self {
        Self {
            cortex,
            chain_id,
            transfer: TxTracker::new(TxKind::TransferAll),
        }
    }

    pub const fn tracker(&self) -> &TxTracker {
        &self.transfer
    }

    pub async fn transfer_all(
        &self,
        client: &dyn ChainClient,
        escrow: Address,
    ) -> Result<Receipt, DeskError> {
        let from = require_wallet(client)?;
        if escrow.is_zero() {
            return Err(DeskError::SubmissionFailed(
                "refusing to transfer to the zero address".into(),
            ));
        }
        debug!(%from, %escrow, "transferring all CRX");
        self.transfer
            .submit(
                client,
                CallRequest::new(
                    self.cortex,
                    &ILockedCortex::transferAllCall { to: escrow },
                    self.chain_id,
                ),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{MockChainClient, WriteOutcome, event_log, foreign_log},
        tx::TxState,
    };
    use alloy_primitives::LogData;
    use alloy_sol_types::{SolCall, SolValue};

    const CHAIN: u64 = 42161;

    fn crx(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18))
    }

    fn usdc(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000u64)
    }

    fn offer() -> Offer {
        Offer::new(
            0,
            Address::repeat_byte(0x0f),
            crx(100),
            Address::repeat_byte(0xdd),
            usdc(250),
        )
    }

    fn ready_balances() -> UserBalances {
        UserBalances::new(U256::ZERO, crx(100))
    }

    #[tokio::test]
    async fn fill_is_gated_on_exact_approval() {
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        let flow = FillFlow::new(&offer(), CHAIN);
        assert!(flow.approve_enabled());
        assert!(!flow.fill_enabled());

        let err = flow.fill(&client).await.unwrap_err();
        assert_eq!(err, DeskError::Action(ActionError::NotApproved));

        flow.approve(&client).await.unwrap();
        assert!(flow.fill_enabled());
        assert!(!flow.approve_enabled());

        flow.fill(&client).await.unwrap();
        assert!(flow.filling().state().is_confirmed());

        let writes = client.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].to, Address::repeat_byte(0xdd));
        let approve = IERC20::approveCall::abi_decode(&writes[0].input).unwrap();
        assert_eq!(approve.spender, Address::repeat_byte(0x0f));
        assert_eq!(approve.amount, usdc(250));
        assert_eq!(writes[1].to, Address::repeat_byte(0x0f));
        assert!(writes.iter().all(|w| w.chain_id == CHAIN));
    }

    #[tokio::test]
    async fn failed_approval_keeps_fill_disabled() {
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        client.on_write::<IERC20::approveCall>(WriteOutcome::ConfirmError(
            DeskError::ConfirmationFailed("dropped".into()),
        ));
        let flow = FillFlow::new(&offer(), CHAIN);

        assert!(flow.approve(&client).await.is_err());
        assert!(!flow.fill_enabled());
        assert_eq!(
            flow.approval().status_line().as_deref(),
            Some("Error approving payment token")
        );
        assert_eq!(
            flow.fill(&client).await.unwrap_err(),
            DeskError::Action(ActionError::NotApproved)
        );
        assert_eq!(client.writes().len(), 1);
    }

    #[tokio::test]
    async fn short_approval_refuses_fill() {
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        let flow = FillFlow::new(&offer(), CHAIN).with_approval_amount(usdc(100));

        flow.approve(&client).await.unwrap();
        assert!(!flow.fill_enabled());
        assert!(matches!(
            flow.fill(&client).await,
            Err(DeskError::Action(ActionError::InsufficientApproval { .. }))
        ));
    }

    #[tokio::test]
    async fn independent_offers_have_independent_state() {
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        let first = FillFlow::new(&offer(), CHAIN);
        let mut other = offer();
        other.offer_address = Address::repeat_byte(0x1f);
        let second = FillFlow::new(&other, CHAIN);

        first.approve(&client).await.unwrap();
        assert!(first.fill_enabled());
        assert!(second.approve_enabled());
        assert!(!second.fill_enabled());
    }

    #[tokio::test]
    async fn every_flow_requires_a_wallet() {
        let client = MockChainClient::new();
        let flow = FillFlow::new(&offer(), CHAIN);
        assert_eq!(flow.approve(&client).await.unwrap_err(), DeskError::NoWallet);
        assert!(flow.approval().state().is_idle());

        let cancel = CancelFlow::new(Address::repeat_byte(0x0f), Address::repeat_byte(0xaa), CHAIN);
        assert_eq!(cancel.cancel(&client).await.unwrap_err(), DeskError::NoWallet);

        let create = CreateOfferFlow::new(Address::repeat_byte(0xfa), CHAIN);
        assert_eq!(
            create
                .create_offer(&client, &ready_balances(), Address::repeat_byte(0xdd), usdc(1))
                .await
                .unwrap_err(),
            DeskError::NoWallet
        );

        let transfer = TransferAllFlow::new(Address::repeat_byte(0xc0), CHAIN);
        assert_eq!(
            transfer
                .transfer_all(&client, Address::repeat_byte(0x0f))
                .await
                .unwrap_err(),
            DeskError::NoWallet
        );
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn only_the_seller_can_cancel() {
        let seller = Address::repeat_byte(0xaa);
        let offer_address = Address::repeat_byte(0x0f);
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xbb));
        client.on_read::<ILockedCortexOffer::sellerCall>(offer_address, seller.abi_encode());

        let flow = CancelFlow::load(&client, offer_address, CHAIN).await.unwrap();
        assert_eq!(flow.seller(), seller);
        assert!(!flow.cancel_enabled(client.current_address()));
        assert_eq!(
            flow.cancel(&client).await.unwrap_err(),
            DeskError::Action(ActionError::NotSeller)
        );

        client.set_wallet(None);
        assert_eq!(flow.authorize(&client).unwrap_err(), DeskError::NoWallet);

        client.set_wallet(Some(seller));
        assert!(flow.cancel_enabled(client.current_address()));
        assert_eq!(flow.authorize(&client), Ok(seller));
        flow.cancel(&client).await.unwrap();
        assert_eq!(flow.tracker().status_line().as_deref(), Some("Offer cancelled"));
    }

    #[tokio::test]
    async fn create_offer_recovers_address_among_unrelated_logs() {
        let factory = Address::repeat_byte(0xfa);
        let usdc_token = Address::repeat_byte(0xdd);
        let new_offer = Address::repeat_byte(0x42);
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        client.on_write::<IOfferFactory::createOfferCall>(WriteOutcome::Mined(vec![
            foreign_log(factory),
            event_log(
                Address::repeat_byte(0x99),
                &IOfferFactory::OfferCreated {
                    offerAddress: Address::repeat_byte(0x66),
                    tokenWanted: usdc_token,
                    amountWanted: usdc(1),
                },
            ),
            event_log(
                factory,
                &IOfferFactory::OfferCreated {
                    offerAddress: new_offer,
                    tokenWanted: usdc_token,
                    amountWanted: usdc(250),
                },
            ),
        ]));

        let flow = CreateOfferFlow::new(factory, CHAIN);
        let created = flow
            .create_offer(&client, &ready_balances(), usdc_token, usdc(250))
            .await
            .unwrap();
        assert_eq!(created, new_offer);
        assert!(flow.tracker().state().is_confirmed());
    }

    #[tokio::test]
    async fn create_offer_without_event_fails() {
        let factory = Address::repeat_byte(0xfa);
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        client.on_write::<IOfferFactory::createOfferCall>(WriteOutcome::Mined(vec![
            foreign_log(factory),
        ]));

        let flow = CreateOfferFlow::new(factory, CHAIN);
        let err = flow
            .create_offer(&client, &ready_balances(), Address::repeat_byte(0xdd), usdc(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::ConfirmationFailed(_)));
        assert!(matches!(flow.tracker().state(), TxState::Failed(_)));
    }

    #[tokio::test]
    async fn create_offer_guards_and_clamps() {
        let factory = Address::repeat_byte(0xfa);
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        let flow = CreateOfferFlow::new(factory, CHAIN).with_max_amount_wanted(usdc(1_000));

        let zero = flow
            .create_offer(&client, &ready_balances(), Address::repeat_byte(0xdd), U256::ZERO)
            .await;
        assert_eq!(zero.unwrap_err(), DeskError::Action(ActionError::ZeroAmount));

        let unlocked = UserBalances::new(crx(5), crx(100));
        let blocked = flow
            .create_offer(&client, &unlocked, Address::repeat_byte(0xdd), usdc(1))
            .await;
        assert_eq!(
            blocked.unwrap_err(),
            DeskError::Action(ActionError::UnlockedBalanceTooHigh)
        );
        assert!(client.writes().is_empty());
        assert!(flow.tracker().state().is_idle());

        assert_eq!(flow.clamp(usdc(5_000)), usdc(1_000));
        // no OfferCreated event scripted, so the call itself fails after submission
        let _ = flow
            .create_offer(&client, &ready_balances(), Address::repeat_byte(0xdd), usdc(5_000))
            .await;
        let sent = IOfferFactory::createOfferCall::abi_decode(&client.writes()[0].input).unwrap();
        assert_eq!(sent.amountWanted, usdc(1_000));
    }

    #[test]
    fn malformed_offer_created_log_is_skipped() {
        let factory = Address::repeat_byte(0xfa);
        let truncated = Log {
            address: factory,
            data: LogData::new_unchecked(
                vec![IOfferFactory::OfferCreated::SIGNATURE_HASH],
                vec![0u8; 10].into(),
            ),
        };
        assert_eq!(extract_offer_address(&[truncated], factory), None);
        assert_eq!(DEFAULT_MAX_AMOUNT_WANTED, usdc(1_000_000_000));
    }

    #[tokio::test]
    async fn transfer_all_cannot_be_repeated() {
        let cortex = Address::repeat_byte(0xc0);
        let escrow = Address::repeat_byte(0x42);
        let client = MockChainClient::with_wallet(Address::repeat_byte(0xaa));
        let flow = TransferAllFlow::new(cortex, CHAIN);

        flow.transfer_all(&client, escrow).await.unwrap();
        assert_eq!(
            flow.tracker().status_line().as_deref(),
            Some("Offer funded successfully!")
        );
        assert!(matches!(
            flow.transfer_all(&client, escrow).await,
            Err(DeskError::Action(ActionError::AlreadySubmitted(TxKind::TransferAll)))
        ));

        let writes = client.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].to, cortex);
        let call = ILockedCortex::transferAllCall::abi_decode(&writes[0].input).unwrap();
        assert_eq!(call.to, escrow);
    }
}
