//! Desk configuration from TOML.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use alloy_primitives::{Address, TxHash, U256};
use otcrx_contracts::{
    ARBITRUM_ONE_CHAIN_ID, ARBITRUM_SEPOLIA_CHAIN_ID, CORTEX_ADDRESS, FACTORY_ADDRESS,
    LENS_ADDRESS, USDC_ADDRESS,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    fees::FeeSchedule,
    units::{TokenAmount, USDC_DECIMALS, UnitsError},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Toml(#[from] toml::de::Error),
    #[error("no built-in deployment for {0}, pass a config file")]
    NoDeployment(Network),
    #[error("unknown network `{0}`, expected `arbitrum` or `arbitrum-sepolia`")]
    UnknownNetwork(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Chains the desk knows about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    #[default]
    Arbitrum,
    ArbitrumSepolia,
}

impl Network {
    pub const fn chain_id(&self) -> u64 {
        match self {
            Self::Arbitrum => ARBITRUM_ONE_CHAIN_ID,
            Self::ArbitrumSepolia => ARBITRUM_SEPOLIA_CHAIN_ID,
        }
    }

    pub const fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Arbitrum => "https://arb1.arbitrum.io/rpc",
            Self::ArbitrumSepolia => "https://sepolia-rollup.arbitrum.io/rpc",
        }
    }

    pub const fn explorer_url(&self) -> &'static str {
        match self {
            Self::Arbitrum => "https://arbiscan.io",
            Self::ArbitrumSepolia => "https://sepolia.arbiscan.io",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Arbitrum => "arbitrum",
            Self::ArbitrumSepolia => "arbitrum-sepolia",
        })
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arbitrum" | "arbitrum-one" | "42161" => Ok(Self::Arbitrum),
            "arbitrum-sepolia" | "sepolia" | "421614" => Ok(Self::ArbitrumSepolia),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Addresses of the deployed contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractAddresses {
    /// Locked CRX token
    pub cortex: Address,
    /// Token offers are paid in
    pub usdc: Address,
    /// Batched offer reader
    pub lens: Address,
    /// Offer factory
    pub factory: Address,
}

impl ContractAddresses {
    pub const ARBITRUM: Self = Self {
        cortex: CORTEX_ADDRESS,
        usdc: USDC_ADDRESS,
        lens: LENS_ADDRESS,
        factory: FACTORY_ADDRESS,
    };
}

/// Desk configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Chain every request is sent to
    pub chain_id: u64,

    /// JSON-RPC endpoint
    pub rpc_url: String,

    pub contracts: ContractAddresses,

    /// Block explorer base URL, used for address and transaction links
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// Quiet period before an edited amount is acted on, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Blocks to wait for after a transaction is mined
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    #[serde(default)]
    pub fee: FeeSchedule,

    /// Upper bound for the amount an offer asks for, in USDC
    #[serde(default = "default_max_amount_wanted")]
    pub max_amount_wanted: Decimal,
}

fn default_explorer_url() -> String {
    Network::Arbitrum.explorer_url().to_string()
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_confirmations() -> u64 {
    1
}

fn default_max_amount_wanted() -> Decimal {
    Decimal::from(1_000_000_000u64)
}

impl DeskConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in configuration of a known deployment.
    pub fn for_network(network: Network) -> Result<Self, ConfigError> {
        let contracts = match network {
            Network::Arbitrum => ContractAddresses::ARBITRUM,
            Network::ArbitrumSepolia => return Err(ConfigError::NoDeployment(network)),
        };
        Ok(Self {
            chain_id: network.chain_id(),
            rpc_url: network.default_rpc_url().to_string(),
            contracts,
            explorer_url: network.explorer_url().to_string(),
            debounce_ms: default_debounce_ms(),
            confirmations: default_confirmations(),
            fee: FeeSchedule::default(),
            max_amount_wanted: default_max_amount_wanted(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::Invalid("chain_id must not be zero".into()));
        }
        let ContractAddresses {
            cortex,
            usdc,
            lens,
            factory,
        } = self.contracts;
        for (name, address) in [
            ("cortex", cortex),
            ("usdc", usdc),
            ("lens", lens),
            ("factory", factory),
        ] {
            if address.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "contracts.{name} must not be the zero address"
                )));
            }
        }
        if self.max_amount_wanted <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "max_amount_wanted must be positive".into(),
            ));
        }
        if self.fee.bps > 10_000 {
            return Err(ConfigError::Invalid("fee.bps must be at most 10000".into()));
        }
        Ok(())
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// [`Self::max_amount_wanted`] in USDC base units.
    pub fn max_amount_wanted_raw(&self) -> Result<U256, UnitsError> {
        TokenAmount::from_decimal(self.max_amount_wanted, USDC_DECIMALS).map(|a| a.raw())
    }

    pub fn address_url(&self, address: Address) -> String {
        format!("{}/address/{address}", self.explorer_url.trim_end_matches('/'))
    }

    pub fn tx_url(&self, tx_hash: TxHash) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEPOLIA: &str = r#"
chain_id = 421614
rpc_url = "http://localhost:8547"
explorer_url = "https://sepolia.arbiscan.io/"
debounce_ms = 250

[contracts]
cortex = "0x1000000000000000000000000000000000000001"
usdc = "0x1000000000000000000000000000000000000002"
lens = "0x1000000000000000000000000000000000000003"
factory = "0x1000000000000000000000000000000000000004"

[fee]
bps = 100
cap = 500
"#;

    #[test]
    fn test_parse_config() {
        let config: DeskConfig = toml::from_str(SEPOLIA).unwrap();
        config.validate().unwrap();
        assert_eq!(config.chain_id, ARBITRUM_SEPOLIA_CHAIN_ID);
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.fee.bps, 100);
        assert_eq!(config.fee.cap, Decimal::from(500));

        // defaults
        assert_eq!(config.confirmations, 1);
        assert_eq!(config.max_amount_wanted, Decimal::from(1_000_000_000u64));
        assert_eq!(
            config.max_amount_wanted_raw().unwrap(),
            U256::from(1_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_explorer_links() {
        let config: DeskConfig = toml::from_str(SEPOLIA).unwrap();
        let address = Address::repeat_byte(0xab);
        assert_eq!(
            config.address_url(address),
            format!("https://sepolia.arbiscan.io/address/{address}")
        );
        assert!(
            config
                .tx_url(TxHash::ZERO)
                .starts_with("https://sepolia.arbiscan.io/tx/0x")
        );
    }

    #[test]
    fn test_builtin_networks() {
        let config = DeskConfig::for_network(Network::Arbitrum).unwrap();
        assert_eq!(config.chain_id, 42161);
        assert_eq!(config.contracts, ContractAddresses::ARBITRUM);
        assert_eq!(config.fee, FeeSchedule::default());
        config.validate().unwrap();

        assert!(matches!(
            DeskConfig::for_network(Network::ArbitrumSepolia),
            Err(ConfigError::NoDeployment(Network::ArbitrumSepolia))
        ));
        assert_eq!(
            "Arbitrum-Sepolia".parse::<Network>().unwrap(),
            Network::ArbitrumSepolia
        );
        assert!("mainnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_rejects_zero_address() {
        let toml = SEPOLIA.replace(
            "0x1000000000000000000000000000000000000003",
            "0x0000000000000000000000000000000000000000",
        );
        let config: DeskConfig = toml::from_str(&toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEPOLIA.as_bytes()).unwrap();

        let config = DeskConfig::load(file.path()).unwrap();
        assert_eq!(
            config.contracts.factory,
            "0x1000000000000000000000000000000000000004"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeskConfig::load(dir.path().join("desk.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
