use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use alloy::signers::local::PrivateKeySigner;
use clap::Args;
use eyre::{Context, Result};
use otcrx_desk::{CallRequest, DeskConfig, Network, RpcChainClient};
use tracing::debug;
use url::Url;

use crate::display::describe_call;

pub(crate) mod balance;
pub(crate) mod cancel;
pub(crate) mod create;
pub(crate) mod fill;
pub(crate) mod offers;
pub(crate) mod transfer_all;
pub(crate) mod volume;
pub(crate) mod watch;

/// Connection options shared by every command.
#[derive(Args, Debug, Clone)]
pub(crate) struct DeskArgs {
    /// Desk config file. Replaces the built-in network preset.
    #[arg(long, env = "OTCRX_CONFIG")]
    config: Option<PathBuf>,

    /// Built-in deployment to use without a config file.
    #[arg(long, default_value_t = Network::Arbitrum)]
    network: Network,

    /// JSON-RPC endpoint, overriding the configured one.
    #[arg(long, env = "OTCRX_RPC_URL")]
    rpc_url: Option<Url>,

    /// Key used to sign transactions. Without it the desk is read-only.
    #[arg(long, env = "OTCRX_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Sign without asking for confirmation.
    #[arg(short, long)]
    yes: bool,
}

impl DeskArgs {
    pub(crate) fn load_config(&self) -> Result<DeskConfig> {
        let mut config = match &self.config {
            Some(path) => DeskConfig::load(path)
                .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
            None => DeskConfig::for_network(self.network)?,
        };
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.to_string();
        }
        debug!(chain_id = config.chain_id, rpc_url = %config.rpc_url, "loaded desk config");
        Ok(config)
    }

    /// Connects to the node, asking on the terminal before each signature
    /// unless `--yes` was passed.
    pub(crate) async fn connect(&self, config: &DeskConfig) -> Result<RpcChainClient> {
        let client = self.connect_unprompted(config).await?;
        Ok(if self.yes {
            client
        } else {
            client.with_prompt(confirm_on_terminal)
        })
    }

    /// Connects without a signature prompt, for callers that already got the
    /// user's consent.
    pub(crate) async fn connect_unprompted(&self, config: &DeskConfig) -> Result<RpcChainClient> {
        let client = match &self.private_key {
            Some(key) => {
                let signer: PrivateKeySigner = key
                    .trim()
                    .parse()
                    .wrap_err("failed to parse private key")?;
                RpcChainClient::connect_with_signer(&config.rpc_url, config.chain_id, signer).await
            }
            None => RpcChainClient::connect(&config.rpc_url, config.chain_id).await,
        }
        .wrap_err_with(|| format!("failed to connect to {}", config.rpc_url))?;

        Ok(client.with_confirmations(config.confirmations))
    }
}

fn confirm_on_terminal(request: &CallRequest) -> bool {
    eprint!(
        "Sign `{}` on {} (chain {})? [y/N] ",
        describe_call(request),
        request.to,
        request.chain_id
    );
    let _ = std::io::stderr().flush();

    // called from `ChainClient::write` on a runtime worker
    tokio::task::block_in_place(|| read_confirmation(std::io::stdin().lock()))
}

fn read_confirmation(mut input: impl BufRead) -> bool {
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
