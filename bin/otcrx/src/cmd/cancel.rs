use alloy_primitives::Address;
use clap::Parser;
use eyre::Result;
use otcrx_desk::{ActionError, CancelFlow, ChainClient, chain::require_wallet};

use super::DeskArgs;
use crate::display::with_status;

#[derive(Parser, Debug)]
pub(crate) struct CancelArgs {
    #[command(flatten)]
    desk: DeskArgs,

    /// Offer escrow to cancel.
    offer: Address,
}

impl CancelArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        let client = self.desk.connect(&config).await?;
        require_wallet(&client)?;

        let flow = CancelFlow::load(&client, self.offer, config.chain_id).await?;
        if !flow.cancel_enabled(client.current_address()) {
            return Err(ActionError::NotSeller.into());
        }
        with_status(flow.tracker(), &config, flow.cancel(&client)).await?;
        Ok(())
    }
}
