//! The active offer book.
//!
//! The lens contract returns every active offer in one call as four
//! index-aligned arrays. [`OfferBook::from_parts`] turns them into [`Offer`]
//! records, prices each one in USDC per CRX and sorts cheapest first.

use std::{cmp::Ordering, fmt};

use alloy_primitives::{Address, U256, U512};
use otcrx_contracts::{ILockedCortexOffer, IOfferFactory, IOfferLens};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::{
    chain::{ChainClient, read_call},
    error::DeskError,
    units::{CRX_DECIMALS, TokenAmount, USDC_DECIMALS},
};

/// Price of one CRX in the wanted token.
///
/// Kept as the exact ratio of the two on-chain amounts. An offer holding no CRX
/// has an infinite price and sorts after every finite one.
#[derive(Debug, Clone, Copy)]
pub enum Price {
    Finite {
        amount_wanted: U256,
        cortex_balance: U256,
    },
    Infinite,
}

impl Price {
    /// Prices `amount_wanted` (6 decimals) for `cortex_balance` (18 decimals).
    pub fn new(amount_wanted: U256, cortex_balance: U256) -> Self {
        if cortex_balance.is_zero() {
            Self::Infinite
        } else {
            Self::Finite {
                amount_wanted,
                cortex_balance,
            }
        }
    }

    /// Human price with exactly `precision` fractional digits, truncated.
    ///
    /// Returns `None` for an infinite price.
    pub fn to_decimal_string(&self, precision: u8) -> Option<String> {
        let Self::Finite {
            amount_wanted,
            cortex_balance,
        } = *self
        else {
            return None;
        };

        let shift = (CRX_DECIMALS - USDC_DECIMALS + precision) as u64;
        let scaled = U512::from(amount_wanted) * U512::from(10u64).pow(U512::from(shift))
            / U512::from(cortex_balance);

        let precision = precision as usize;
        let digits = format!("{:0>width$}", scaled.to_string(), width = precision + 1);
        let (int, frac) = digits.split_at(digits.len() - precision);
        Some(if precision == 0 {
            int.to_string()
        } else {
            format!("{int}.{frac}")
        })
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Infinite, Self::Infinite) => Ordering::Equal,
            (Self::Infinite, Self::Finite { .. }) => Ordering::Greater,
            (Self::Finite { .. }, Self::Infinite) => Ordering::Less,
            (
                Self::Finite {
                    amount_wanted: a1,
                    cortex_balance: c1,
                },
                Self::Finite {
                    amount_wanted: a2,
                    cortex_balance: c2,
                },
            ) => (U512::from(*a1) * U512::from(*c2)).cmp(&(U512::from(*a2) * U512::from(*c1))),
        }
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Price {}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal_string(3) {
            Some(price) => write!(f, "${price}"),
            None => f.write_str("∞"),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_decimal_string(USDC_DECIMALS) {
            Some(price) => serializer.serialize_str(&price),
            None => serializer.serialize_str("inf"),
        }
    }
}

/// Snapshot of one active offer. Re-read rather than updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    /// Position in the lens response.
    pub index: usize,
    pub offer_address: Address,
    pub cortex_balance: TokenAmount,
    pub token_wanted: Address,
    pub amount_wanted: TokenAmount,
    pub price: Price,
}

impl Offer {
    pub fn new(
        index: usize,
        offer_address: Address,
        cortex_balance: U256,
        token_wanted: Address,
        amount_wanted: U256,
    ) -> Self {
        Self {
            index,
            offer_address,
            cortex_balance: TokenAmount::crx(cortex_balance),
            token_wanted,
            amount_wanted: TokenAmount::usdc(amount_wanted),
            price: Price::new(amount_wanted, cortex_balance),
        }
    }

    pub fn pays_in(&self, token: Address) -> bool {
        self.token_wanted == token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferBook {
    /// The factory has no active offers.
    Empty,
    /// Sorted by ascending price.
    Offers(Vec<Offer>),
}

impl OfferBook {
    /// Builds the sorted book from the lens' parallel arrays.
    pub fn from_parts(
        offer_addresses: Vec<Address>,
        cortex_balances: Vec<U256>,
        tokens_wanted: Vec<Address>,
        amounts_wanted: Vec<U256>,
    ) -> Result<Self, DeskError> {
        let len = offer_addresses.len();
        if cortex_balances.len() != len || tokens_wanted.len() != len || amounts_wanted.len() != len
        {
            return Err(DeskError::ReadFailed(format!(
                "offer arrays are misaligned: {len} addresses, {} balances, {} tokens, {} amounts",
                cortex_balances.len(),
                tokens_wanted.len(),
                amounts_wanted.len(),
            )));
        }
        if len == 0 {
            return Ok(Self::Empty);
        }

        let mut offers: Vec<Offer> = offer_addresses
            .into_iter()
            .zip(cortex_balances)
            .zip(tokens_wanted.into_iter().zip(amounts_wanted))
            .enumerate()
            .map(|(index, ((address, balance), (token, amount)))| {
                Offer::new(index, address, balance, token, amount)
            })
            .collect();
        // stable: equal prices keep lens order
        offers.sort_by(|a, b| a.price.cmp(&b.price));

        Ok(Self::Offers(offers))
    }

    pub fn offers(&self) -> &[Offer] {
        match self {
            Self::Empty => &[],
            Self::Offers(offers) => offers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offers().is_empty()
    }

    pub fn len(&self) -> usize {
        self.offers().len()
    }
}

/// Fetches and sorts every active offer of `factory` in a single lens read.
pub async fn fetch_active_offers(
    client: &dyn ChainClient,
    lens: Address,
    factory: Address,
    chain_id: u64,
) -> Result<OfferBook, DeskError> {
    let info = read_call(
        client,
        lens,
        IOfferLens::getAllActiveOfferInfoCall { factory },
        chain_id,
    )
    .await?;

    let book = OfferBook::from_parts(
        info.offerAddresses,
        info.cortexBalances,
        info.tokenWanted,
        info.amountWanted,
    )?;
    info!(%factory, offers = book.len(), "fetched active offers");
    Ok(book)
}

/// Reads a single offer through the lens.
pub async fn fetch_offer(
    client: &dyn ChainClient,
    lens: Address,
    offer_address: Address,
    chain_id: u64,
) -> Result<Offer, DeskError> {
    let info = read_call(
        client,
        lens,
        IOfferLens::getOfferInfoCall {
            offer: offer_address,
        },
        chain_id,
    )
    .await?;
    Ok(Offer::new(
        0,
        offer_address,
        info.cortexBalance,
        info.tokenWanted,
        info.amountWanted,
    ))
}

/// Reads the seller recorded in an offer's escrow.
pub async fn fetch_seller(
    client: &dyn ChainClient,
    offer_address: Address,
    chain_id: u64,
) -> Result<Address, DeskError> {
    let seller = read_call(
        client,
        offer_address,
        ILockedCortexOffer::sellerCall {},
        chain_id,
    )
    .await?;
    debug!(offer = %offer_address, %seller, "read offer seller");
    Ok(seller)
}

/// Whether `account` is the seller of an offer.
///
/// Addresses are compared as bytes, so checksum casing never matters.
pub fn is_seller(seller: Address, account: Option<Address>) -> bool {
    account.is_some_and(|account| !account.is_zero() && account == seller)
}

/// Active offers created by `owner`.
pub async fn fetch_offers_by_owner(
    client: &dyn ChainClient,
    factory: Address,
    owner: Address,
    chain_id: u64,
) -> Result<Vec<Address>, DeskError> {
    read_call(
        client,
        factory,
        IOfferFactory::getActiveOffersByOwnerCall { owner },
        chain_id,
    )
    .await
}

/// Total USDC volume filled through `factory`.
pub async fn fetch_volume(
    client: &dyn ChainClient,
    lens: Address,
    factory: Address,
    chain_id: u64,
) -> Result<TokenAmount, DeskError> {
    let sum = read_call(
        client,
        lens,
        IOfferLens::getVolumeCall { factory },
        chain_id,
    )
    .await?;
    Ok(TokenAmount::usdc(sum))
}

/// The factory's raw fee setting.
pub async fn fetch_factory_fee(
    client: &dyn ChainClient,
    factory: Address,
    chain_id: u64,
) -> Result<U256, DeskError> {
    read_call(client, factory, IOfferFactory::feeCall {}, chain_id).await
}
