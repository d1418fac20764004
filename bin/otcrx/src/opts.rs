use crate::cmd::{
    balance::BalanceArgs, cancel::CancelArgs, create::CreateArgs, fill::FillArgs,
    offers::OffersArgs, transfer_all::TransferAllArgs, volume::VolumeArgs, watch::WatchArgs,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "otcrx", version, about = "OTC desk for locked CRX", long_about = None)]
pub struct Otcrx {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: OtcrxSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum OtcrxSubcommand {
    /// List active offers, cheapest first.
    Offers(OffersArgs),
    /// Show the locked and unlocked CRX of the wallet.
    Balance(BalanceArgs),
    /// Create an offer for all of your locked CRX and fund it.
    Create(CreateArgs),
    /// Approve payment for an offer and fill it.
    Fill(FillArgs),
    /// Cancel one of your offers.
    Cancel(CancelArgs),
    /// Move all of your CRX into an offer escrow.
    TransferAll(TransferAllArgs),
    /// Show the total volume filled through the desk.
    Volume(VolumeArgs),
    /// Keep the offer book on screen, refreshing on an interval.
    Watch(WatchArgs),
}
