use std::time::Duration;

use clap::Parser;
use eyre::Result;
use otcrx_desk::fetch_active_offers;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use super::{
    DeskArgs,
    offers::{owned_offers, render},
};

#[derive(Parser, Debug)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    desk: DeskArgs,

    /// Seconds between refreshes.
    #[arg(long, default_value_t = 15)]
    interval_secs: u64,
}

impl WatchArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        let client = self.desk.connect(&config).await?;

        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }

            let book = match fetch_active_offers(
                &client,
                config.contracts.lens,
                config.contracts.factory,
                config.chain_id,
            )
            .await
            {
                Ok(book) => book,
                Err(err) => {
                    // keep the last rendering, try again next tick
                    warn!(%err, "failed to refresh offers");
                    continue;
                }
            };
            let owned = owned_offers(&client, &config).await;

            print!("\x1B[2J\x1B[H");
            render(&book, &owned, &config);
        }
    }
}
