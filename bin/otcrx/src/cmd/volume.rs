use clap::Parser;
use eyre::Result;
use otcrx_desk::offers::{fetch_factory_fee, fetch_volume};

use super::DeskArgs;

#[derive(Parser, Debug)]
pub(crate) struct VolumeArgs {
    #[command(flatten)]
    desk: DeskArgs,
}

impl VolumeArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        let client = self.desk.connect(&config).await?;
        let factory = config.contracts.factory;

        let (volume, fee) = futures::try_join!(
            fetch_volume(&client, config.contracts.lens, factory, config.chain_id),
            fetch_factory_fee(&client, factory, config.chain_id),
        )?;

        println!("Total volume: {volume} USDC");
        println!("Factory fee setting: {fee}");
        println!(
            "Sellers receive the amount wanted minus {}% (at most {} USDC)",
            rust_decimal::Decimal::new(config.fee.bps.into(), 2),
            config.fee.cap
        );
        Ok(())
    }
}
