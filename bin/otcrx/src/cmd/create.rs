use std::str::FromStr;

use alloy_primitives::Address;
use clap::{ArgGroup, Parser};
use eyre::{ContextCompat, Result, bail, eyre};
use otcrx_desk::{
    ChainClient, CreateOfferFlow, DeskConfig, TokenAmount, TransferAllFlow, UserBalances,
    debounce::Debouncer, fees::FeeSchedule, inputs::LinkedAmounts, read_balances,
    units::USDC_DECIMALS,
};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::DeskArgs;
use crate::display::with_status;

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("ask").required(true).args(["amount", "price", "interactive"])))]
pub(crate) struct CreateArgs {
    #[command(flatten)]
    desk: DeskArgs,

    /// Total USDC wanted for all of your locked CRX.
    #[arg(long)]
    amount: Option<Decimal>,

    /// USDC wanted per locked CRX.
    #[arg(long)]
    price: Option<Decimal>,

    /// Edit amount and price from stdin before submitting.
    #[arg(long)]
    interactive: bool,

    /// Token the offer is paid in. Defaults to the configured USDC.
    #[arg(long)]
    token: Option<Address>,

    /// Only create the offer, do not move your CRX into it.
    #[arg(long)]
    no_transfer: bool,
}

impl CreateArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.desk.load_config()?;
        // typing `submit` is the confirmation in interactive mode
        let client = if self.interactive {
            self.desk.connect_unprompted(&config).await?
        } else {
            self.desk.connect(&config).await?
        };

        let balances = read_balances(&client, config.contracts.cortex, config.chain_id)
            .await?
            .ok_or_else(|| eyre!("creating an offer needs a wallet, pass --private-key"))?;
        balances.offer_readiness()?;
        let locked = balances
            .locked
            .to_decimal()
            .wrap_err("locked balance is too large to price")?;
        println!("Locked CRX: {}", balances.locked);

        let amounts = if self.interactive {
            match edit_interactively(locked, &config).await? {
                Some(amounts) => amounts,
                None => return Ok(()),
            }
        } else {
            let mut amounts = LinkedAmounts::new();
            let linked = match (self.amount, self.price) {
                (Some(amount), _) => amounts.set_amount_wanted(amount, locked),
                (None, Some(price)) => amounts.set_price_per_unit(price, locked),
                (None, None) => false,
            };
            if !linked {
                bail!("amount and price must be non-negative");
            }
            print_preview(&amounts, &config.fee);
            amounts
        };

        let amount_wanted = amounts
            .amount_wanted
            .wrap_err("no amount wanted was entered")?;
        let amount_wanted = TokenAmount::from_decimal(amount_wanted, USDC_DECIMALS)?;
        let token_wanted = self.token.unwrap_or(config.contracts.usdc);

        create_and_fund(
            &client,
            &config,
            &balances,
            token_wanted,
            amount_wanted,
            !self.no_transfer,
        )
        .await
    }
}

async fn create_and_fund(
    client: &dyn ChainClient,
    config: &DeskConfig,
    balances: &UserBalances,
    token_wanted: Address,
    amount_wanted: TokenAmount,
    transfer: bool,
) -> Result<()> {
    let create = CreateOfferFlow::new(config.contracts.factory, config.chain_id)
        .with_max_amount_wanted(config.max_amount_wanted_raw()?);
    let requested = create.clamp(amount_wanted.raw());
    if requested != amount_wanted.raw() {
        println!(
            "Amount wanted capped at {} USDC",
            TokenAmount::usdc(requested)
        );
    }

    let offer = with_status(
        create.tracker(),
        config,
        create.create_offer(client, balances, token_wanted, amount_wanted.raw()),
    )
    .await?;
    println!("Offer: {}", config.address_url(offer));

    if !transfer {
        println!("Fund it later with `otcrx transfer-all {offer}`");
        return Ok(());
    }

    let fund = TransferAllFlow::new(config.contracts.cortex, config.chain_id);
    with_status(fund.tracker(), config, fund.transfer_all(client, offer)).await?;
    info!(%offer, "offer created and funded");
    Ok(())
}

fn print_preview(amounts: &LinkedAmounts, fees: &FeeSchedule) {
    let (Some(amount), Some(price)) = (amounts.amount_wanted, amounts.price_per_unit) else {
        return;
    };
    println!("Amount wanted:    {amount} USDC");
    println!("Price per CRX:    {} USDC", price.round_dp(6));
    match fees.net_proceeds(amount) {
        Some(net) => println!("You will receive: {} USDC", net.round_dp(6)),
        None => println!("You will receive: amount too large to compute"),
    }
}

/// One line typed in interactive mode.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Amount(Decimal),
    Price(Decimal),
    Submit,
    Quit,
}

impl FromStr for Edit {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let value = words.next();
        if words.next().is_some() {
            return Err(format!("unexpected input `{line}`"));
        }

        let number = |value: Option<&str>| {
            let value = value.ok_or_else(|| format!("`{command}` needs a value"))?;
            Decimal::from_str(value).map_err(|err| format!("invalid number `{value}`: {err}"))
        };
        match command {
            "amount" | "a" => number(value).map(Self::Amount),
            "price" | "p" => number(value).map(Self::Price),
            "submit" | "s" if value.is_none() => Ok(Self::Submit),
            "quit" | "q" if value.is_none() => Ok(Self::Quit),
            _ => Err(format!("unknown command `{line}`")),
        }
    }
}

/// Reads edits until `submit`, previewing the proceeds once the input has
/// settled. Returns `None` if the user quit.
async fn edit_interactively(locked: Decimal, config: &DeskConfig) -> Result<Option<LinkedAmounts>> {
    println!("Commands: `amount <usdc>`, `price <usdc per crx>`, `submit`, `quit`");

    let debouncer = Debouncer::new(config.debounce());
    let mut settled = debouncer.subscribe();
    let mut amounts = LinkedAmounts::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(None);
                };
                if line.trim().is_empty() {
                    continue;
                }
                let edit = match line.parse::<Edit>() {
                    Ok(edit) => edit,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                debug!(?edit, "interactive edit");

                let changed = match edit {
                    Edit::Amount(amount) => amounts.set_amount_wanted(amount, locked),
                    Edit::Price(price) => amounts.set_price_per_unit(price, locked),
                    Edit::Quit => return Ok(None),
                    Edit::Submit => {
                        if amounts.amount_wanted.is_none() {
                            println!("enter an amount or a price first");
                            continue;
                        }
                        let target = Some(amounts);
                        let ready = settled.wait_for(|value| *value == target).await?.clone();
                        return Ok(ready);
                    }
                };
                if changed {
                    debouncer.set(amounts);
                } else {
                    println!("ignored: values must be non-negative");
                }
            }
            Ok(()) = settled.changed() => {
                if let Some(amounts) = *settled.borrow_and_update() {
                    print_preview(&amounts, &config.fee);
                }
            }
        }
    }
}
