//! Terminal rendering of offers, balances and transaction progress.

use std::{
    future::Future,
    io::{self, Write},
};

use alloy_primitives::Address;
use otcrx_contracts::{IERC20, ILockedCortex, ILockedCortexOffer, IOfferFactory};
use otcrx_desk::{
    CallRequest, DeskConfig, DeskError, Offer, OfferBook, TxKind, TxState, TxTracker,
    UserBalances,
};
use serde::Serialize;

/// Human name of the contract function a request calls.
pub(crate) fn describe_call(request: &CallRequest) -> &'static str {
    use alloy::sol_types::SolCall;

    match request.selector() {
        Some(IERC20::approveCall::SELECTOR) => "approve",
        Some(ILockedCortexOffer::fillCall::SELECTOR) => "fill",
        Some(ILockedCortexOffer::cancelCall::SELECTOR) => "cancel",
        Some(IOfferFactory::createOfferCall::SELECTOR) => "createOffer",
        Some(ILockedCortex::transferAllCall::SELECTOR) => "transferAll",
        _ => "unknown call",
    }
}

pub(crate) fn token_label(token: Address, config: &DeskConfig) -> String {
    if token == config.contracts.usdc {
        "USDC".to_string()
    } else {
        token.to_string()
    }
}

/// An offer as printed with `--json`.
#[derive(Serialize)]
pub(crate) struct OfferRow<'a> {
    #[serde(flatten)]
    pub(crate) offer: &'a Offer,
    pub(crate) mine: bool,
    pub(crate) explorer_url: String,
}

pub(crate) fn offer_rows<'a>(
    book: &'a OfferBook,
    config: &DeskConfig,
    is_mine: impl Fn(&Offer) -> bool,
) -> Vec<OfferRow<'a>> {
    book.offers()
        .iter()
        .map(|offer| OfferRow {
            offer,
            mine: is_mine(offer),
            explorer_url: config.address_url(offer.offer_address),
        })
        .collect()
}

pub(crate) fn print_offer_table(rows: &[OfferRow<'_>], config: &DeskConfig) {
    if rows.is_empty() {
        println!("No active offers");
        return;
    }

    println!(
        "{:>3}  {:<42}  {:>16}  {:>14}  {:<6}  {:>10}",
        "#", "Offer", "CRX", "Wants", "Token", "$/CRX"
    );
    println!("{}", "-".repeat(104));
    for (position, row) in rows.iter().enumerate() {
        let offer = row.offer;
        let token = token_label(offer.token_wanted, config);
        println!(
            "{:>3}  {:<42}  {:>16}  {:>14}  {:<6}  {:>10}{}",
            position + 1,
            offer.offer_address,
            offer.cortex_balance,
            offer.amount_wanted,
            if token.len() > 6 { "other" } else { token.as_str() },
            offer.price.to_string(),
            if row.mine { "  (yours)" } else { "" },
        );
        if !offer.pays_in(config.contracts.usdc) {
            println!("     wants token {}", offer.token_wanted);
        }
    }
    println!();
    println!("Total: {} active offer(s)", rows.len());
    println!("Explorer: {}", config.address_url(config.contracts.factory));
}

pub(crate) fn print_balances(balances: Option<&UserBalances>) -> io::Result<()> {
    write_balances(&mut io::stdout().lock(), balances)
}

/// Without a wallet nothing numeric is written, not even zeros.
fn write_balances(out: &mut impl Write, balances: Option<&UserBalances>) -> io::Result<()> {
    let Some(balances) = balances else {
        return writeln!(out, "No wallet connected. Pass --private-key to see your balances.");
    };
    writeln!(out, "Locked CRX:   {}", balances.locked)?;
    writeln!(out, "Unlocked CRX: {}", balances.unlocked)?;
    writeln!(out, "Total CRX:    {}", balances.total)?;
    if let Err(reason) = balances.offer_readiness() {
        writeln!(out)?;
        writeln!(out, "Cannot create an offer: {reason}")?;
    }
    Ok(())
}

fn print_state(kind: TxKind, state: &TxState, config: &DeskConfig) {
    let Some(line) = kind.status_line(state) else {
        return;
    };
    match state {
        TxState::ChainPending(tx_hash) => println!("{line} {}", config.tx_url(*tx_hash)),
        TxState::Failed(err) if !line.contains(&err.to_string()) => println!("{line}: {err}"),
        _ => println!("{line}"),
    }
}

/// Runs `op`, printing every state change of `tracker` while it is in flight.
pub(crate) async fn with_status<T>(
    tracker: &TxTracker,
    config: &DeskConfig,
    op: impl Future<Output = Result<T, DeskError>>,
) -> Result<T, DeskError> {
    let kind = tracker.kind();
    let mut states = tracker.subscribe();
    tokio::pin!(op);

    loop {
        tokio::select! {
            result = &mut op => {
                // the final state is published before `op` resolves
                if states.has_changed().unwrap_or(false) {
                    print_state(kind, &states.borrow_and_update(), config);
                }
                return result;
            }
            Ok(()) = states.changed() => {
                print_state(kind, &states.borrow_and_update(), config);
            }
        }
    }
}
