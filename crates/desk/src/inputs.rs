//! The two linked fields of the create-offer form.
//!
//! Editing the total amount wanted updates the price per CRX and vice versa,
//! both against the currently locked balance.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkedAmounts {
    /// Total USDC asked for the whole locked balance.
    pub amount_wanted: Option<Decimal>,
    /// USDC per CRX.
    pub price_per_unit: Option<Decimal>,
}

impl LinkedAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total and derives the unit price.
    ///
    /// Returns `false` and leaves both fields untouched when `locked` is zero,
    /// the amount is negative, or the division overflows.
    pub fn set_amount_wanted(&mut self, amount: Decimal, locked: Decimal) -> bool {
        if locked.is_zero() || amount.is_sign_negative() || locked.is_sign_negative() {
            return false;
        }
        let Some(price) = amount.checked_div(locked) else {
            return false;
        };
        trace!(%amount, %price, "amount wanted edited");
        self.amount_wanted = Some(amount);
        self.price_per_unit = Some(price.normalize());
        true
    }

    /// Sets the unit price and derives the total.
    pub fn set_price_per_unit(&mut self, price: Decimal, locked: Decimal) -> bool {
        if locked.is_zero() || price.is_sign_negative() || locked.is_sign_negative() {
            return false;
        }
        let Some(amount) = price.checked_mul(locked) else {
            return false;
        };
        trace!(%price, %amount, "price per unit edited");
        self.price_per_unit = Some(price);
        self.amount_wanted = Some(amount.normalize());
        true
    }
}
