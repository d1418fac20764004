//! Core of the locked CRX OTC desk.
//!
//! Sellers with locked CRX create an offer: a factory deploys an escrow, the
//! seller moves all of their CRX into it with `transferAll`, and a buyer fills
//! it by paying the requested USDC. This crate reads the offer book and
//! balances, and drives the approve, fill, cancel, create and transfer-all
//! transactions through a [`ChainClient`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod actions;
pub mod balance;
pub mod chain;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fees;
pub mod inputs;
pub mod offers;
pub mod provider;
pub mod session;
pub mod tx;
pub mod units;

#[cfg(test)]
mod test_utils;

pub use actions::{CancelFlow, CreateOfferFlow, FillFlow, TransferAllFlow};
pub use balance::{UserBalances, read_balances};
pub use chain::{CallRequest, ChainClient, Receipt};
pub use config::{DeskConfig, Network};
pub use error::{ActionError, DeskError};
pub use offers::{Offer, OfferBook, Price, fetch_active_offers};
pub use provider::RpcChainClient;
pub use session::WalletSession;
pub use tx::{TxKind, TxState, TxTracker};
pub use units::TokenAmount;
