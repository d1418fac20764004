use alloy_primitives::Address;
use clap::Parser;
use eyre::{Result, bail};
use otcrx_desk::{FillFlow, chain::require_wallet, offers::fetch_offer};

use super::DeskArgs;
use crate::display::{token_label, with_status};

#[derive(Parser, Debug)]
pub(crate) struct FillArgs {
    #[command(flatten)]
    desk: DeskArgs,

    /// Offer escrow to fill.
    offer: Address,
}

impl FillArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        let client = self.desk.connect(&config).await?;
        require_wallet(&client)?;

        let offer = fetch_offer(&client, config.contracts.lens, self.offer, config.chain_id).await?;
        if offer.cortex_balance.is_zero() {
            bail!("offer {} holds no CRX", offer.offer_address);
        }
        println!(
            "Buying {} CRX for {} {} ({} per CRX)",
            offer.cortex_balance,
            offer.amount_wanted,
            token_label(offer.token_wanted, &config),
            offer.price,
        );

        let flow = FillFlow::new(&offer, config.chain_id);
        with_status(flow.approval(), &config, flow.approve(&client)).await?;
        if !flow.fill_enabled() {
            bail!("approval did not go through, not filling");
        }
        with_status(flow.filling(), &config, flow.fill(&client)).await?;
        Ok(())
    }
}
