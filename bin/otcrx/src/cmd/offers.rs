use std::collections::HashSet;

use alloy_primitives::Address;
use clap::Parser;
use eyre::Result;
use otcrx_desk::{
    ChainClient, DeskConfig, OfferBook, fetch_active_offers, offers::fetch_offers_by_owner,
};
use tracing::warn;

use super::DeskArgs;
use crate::display::{offer_rows, print_offer_table};

#[derive(Parser, Debug)]
pub(crate) struct OffersArgs {
    #[command(flatten)]
    desk: DeskArgs,

    /// Print the offers as JSON.
    #[arg(long)]
    json: bool,

    /// Only show offers created by the connected wallet.
    #[arg(long)]
    mine: bool,
}

impl OffersArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        let client = self.desk.connect(&config).await?;
        if self.mine && client.current_address().is_none() {
            eyre::bail!("--mine needs a wallet, pass --private-key");
        }

        let book = fetch_active_offers(
            &client,
            config.contracts.lens,
            config.contracts.factory,
            config.chain_id,
        )
        .await?;
        let owned = owned_offers(&client, &config).await;

        let mut rows = offer_rows(&book, &config, |offer| owned.contains(&offer.offer_address));
        if self.mine {
            rows.retain(|row| row.mine);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            print_offer_table(&rows, &config);
        }
        Ok(())
    }
}

/// Offers the connected wallet created. Empty without a wallet or on error,
/// since ownership only decorates the listing.
pub(super) async fn owned_offers(client: &dyn ChainClient, config: &DeskConfig) -> HashSet<Address> {
    let Some(owner) = client.current_address() else {
        return HashSet::new();
    };
    match fetch_offers_by_owner(client, config.contracts.factory, owner, config.chain_id).await {
        Ok(offers) => offers.into_iter().collect(),
        Err(err) => {
            warn!(%err, "failed to read own offers");
            HashSet::new()
        }
    }
}

pub(super) fn render(book: &OfferBook, owned: &HashSet<Address>, config: &DeskConfig) {
    let rows = offer_rows(book, config, |offer| owned.contains(&offer.offer_address));
    print_offer_table(&rows, config);
}
