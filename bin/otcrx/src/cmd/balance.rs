use clap::Parser;
use eyre::Result;
use otcrx_desk::read_balances;

use super::DeskArgs;
use crate::display::print_balances;

#[derive(Parser, Debug)]
pub(crate) struct BalanceArgs {
    #[command(flatten)]
    desk: DeskArgs,

    /// Print the balances as JSON.
    #[arg(long)]
    json: bool,
}

impl BalanceArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        let client = self.desk.connect(&config).await?;

        let balances = read_balances(&client, config.contracts.cortex, config.chain_id).await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&balances)?);
        } else {
            print_balances(balances.as_ref())?;
        }
        Ok(())
    }
}
