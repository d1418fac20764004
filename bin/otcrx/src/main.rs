//! Command line front end for the locked CRX OTC desk.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::opts::{Otcrx, OtcrxSubcommand};

mod cmd;
mod display;
mod opts;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Otcrx::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.cmd {
        OtcrxSubcommand::Offers(cmd) => cmd.run().await,
        OtcrxSubcommand::Balance(cmd) => cmd.run().await,
        OtcrxSubcommand::Create(cmd) => cmd.run().await,
        OtcrxSubcommand::Fill(cmd) => cmd.run().await,
        OtcrxSubcommand::Cancel(cmd) => cmd.run().await,
        OtcrxSubcommand::TransferAll(cmd) => cmd.run().await,
        OtcrxSubcommand::Volume(cmd) => cmd.run().await,
        OtcrxSubcommand::Watch(cmd) => cmd.run().await,
    }
}
