use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The factory's cut of a filled offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeeSchedule {
    /// Fee in basis points of the amount wanted.
    #[serde(default = "default_bps")]
    pub bps: u16,
    /// Upper bound on the fee, in USDC.
    #[serde(default = "default_cap")]
    pub cap: Decimal,
}

const fn default_bps() -> u16 {
    250
}

fn default_cap() -> Decimal {
    Decimal::from(25_000)
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            bps: default_bps(),
            cap: default_cap(),
        }
    }
}

impl FeeSchedule {
    /// The fee charged on `amount`, capped. `None` if `amount` is too large
    /// for `Decimal` arithmetic.
    pub fn fee_on(&self, amount: Decimal) -> Option<Decimal> {
        let fee = amount
            .checked_mul(Decimal::from(self.bps))?
            .checked_div(Decimal::from(10_000))?;
        Some(fee.min(self.cap).max(Decimal::ZERO))
    }

    /// What the seller receives once the offer is filled.
    pub fn net_proceeds(&self, amount: Decimal) -> Option<Decimal> {
        let fee = self.fee_on(amount)?;
        amount.checked_sub(fee).map(|net| net.normalize())
    }
}
