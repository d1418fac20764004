use alloy_primitives::Address;
use clap::Parser;
use eyre::{Result, bail};
use otcrx_desk::{TransferAllFlow, chain::require_wallet, offers::fetch_offers_by_owner};

use super::DeskArgs;
use crate::display::with_status;

#[derive(Parser, Debug)]
pub(crate) struct TransferAllArgs {
    #[command(flatten)]
    desk: DeskArgs,

    /// Offer escrow receiving the CRX.
    escrow: Address,

    /// Transfer even if the escrow is not one of your active offers.
    #[arg(long)]
    force: bool,
}

impl TransferAllArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        let client = self.desk.connect(&config).await?;
        let owner = require_wallet(&client)?;

        if !self.force {
            let owned =
                fetch_offers_by_owner(&client, config.contracts.factory, owner, config.chain_id)
                    .await?;
            if !owned.contains(&self.escrow) {
                bail!(
                    "{} is not one of your active offers, pass --force to transfer anyway",
                    self.escrow
                );
            }
        }

        let flow = TransferAllFlow::new(config.contracts.cortex, config.chain_id);
        with_status(flow.tracker(), &config, flow.transfer_all(&client, self.escrow)).await?;
        println!("{}", config.address_url(self.escrow));
        Ok(())
    }
}
