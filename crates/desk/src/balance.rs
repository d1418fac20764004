//! Locked and unlocked CRX balances of the connected account.

use alloy_primitives::{Address, U256};
use otcrx_contracts::ILockedCortex;
use serde::Serialize;
use tracing::debug;

use crate::{
    chain::{ChainClient, read_call},
    error::{ActionError, DeskError},
    units::{CRX_DECIMALS, TokenAmount},
};

/// Unlocked CRX above this amount blocks offer creation, since `transferAll`
/// would sweep it into the escrow too.
pub const MAX_UNLOCKED_FOR_OFFER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserBalances {
    pub unlocked: TokenAmount,
    pub total: TokenAmount,
    pub locked: TokenAmount,
}

impl UserBalances {
    /// Derives the locked part as `total - unlocked`, floored at zero.
    pub fn new(unlocked: U256, total: U256) -> Self {
        let unlocked = TokenAmount::crx(unlocked);
        let total = TokenAmount::crx(total);
        Self {
            unlocked,
            total,
            locked: total.saturating_sub(unlocked),
        }
    }

    /// Checks whether an offer can be created from these balances.
    pub fn offer_readiness(&self) -> Result<(), ActionError> {
        if self.unlocked.raw() > MAX_UNLOCKED_FOR_OFFER {
            return Err(ActionError::UnlockedBalanceTooHigh);
        }
        if self.locked.is_zero() {
            return Err(ActionError::NothingLocked);
        }
        Ok(())
    }
}

/// Reads the balances of the connected wallet.
///
/// Returns `Ok(None)` without touching the chain when no wallet is connected,
/// so callers never display a zero balance for an unknown account.
pub async fn read_balances(
    client: &dyn ChainClient,
    cortex: Address,
    chain_id: u64,
) -> Result<Option<UserBalances>, DeskError> {
    let Some(holder) = client.current_address() else {
        debug!("no wallet connected, skipping balance read");
        return Ok(None);
    };
    read_balances_of(client, cortex, holder, chain_id)
        .await
        .map(Some)
}

/// Reads the balances of an arbitrary holder.
pub async fn read_balances_of(
    client: &dyn ChainClient,
    cortex: Address,
    holder: Address,
    chain_id: u64,
) -> Result<UserBalances, DeskError> {
    let (unlocked, total) = futures::try_join!(
        read_call(
            client,
            cortex,
            ILockedCortex::balanceOfCall { account: holder },
            chain_id,
        ),
        read_call(
            client,
            cortex,
            ILockedCortex::totalBalanceOfCall { account: holder },
            chain_id,
        ),
    )?;

    let balances = UserBalances::new(unlocked, total);
    debug!(
        %holder,
        unlocked = %balances.unlocked,
        locked = %balances.locked,
        decimals = CRX_DECIMALS,
        "read CRX balances"
    );
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChainClient;
    use alloy_sol_types::SolValue;
    use proptest::prelude::*;

    fn crx(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18))
    }

    #[test]
    fn one_crx_threshold() {
        assert_eq!(MAX_UNLOCKED_FOR_OFFER, crx(1));
    }

    #[tokio::test]
    async fn no_wallet_means_no_data() {
        let client = MockChainClient::new();
        let cortex = Address::repeat_byte(0xc0);
        client.on_read::<ILockedCortex::balanceOfCall>(cortex, U256::ZERO.abi_encode());

        let balances = read_balances(&client, cortex, 42161).await.unwrap();
        assert_eq!(balances, None);
        assert_eq!(client.read_count(), 0);
    }

    #[tokio::test]
    async fn reads_locked_and_unlocked() {
        let holder = Address::repeat_byte(0xaa);
        let cortex = Address::repeat_byte(0xc0);
        let client = MockChainClient::with_wallet(holder);
        client.on_read::<ILockedCortex::balanceOfCall>(cortex, crx(3).abi_encode());
        client.on_read::<ILockedCortex::totalBalanceOfCall>(cortex, crx(10).abi_encode());

        let balances = read_balances(&client, cortex, 42161)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balances.unlocked.to_string(), "3");
        assert_eq!(balances.total.to_string(), "10");
        assert_eq!(balances.locked.to_string(), "7");
    }

    #[tokio::test]
    async fn read_failure_is_surfaced() {
        let holder = Address::repeat_byte(0xaa);
        let cortex = Address::repeat_byte(0xc0);
        let client = MockChainClient::with_wallet(holder);
        client.on_read::<ILockedCortex::balanceOfCall>(cortex, crx(3).abi_encode());

        let err = read_balances(&client, cortex, 42161).await.unwrap_err();
        assert!(matches!(err, DeskError::ReadFailed(_)));
    }

    #[test]
    fn offer_readiness() {
        assert_eq!(
            UserBalances::new(U256::ZERO, U256::ZERO).offer_readiness(),
            Err(ActionError::NothingLocked)
        );
        assert_eq!(
            UserBalances::new(crx(2), crx(10)).offer_readiness(),
            Err(ActionError::UnlockedBalanceTooHigh)
        );
        assert_eq!(UserBalances::new(crx(1), crx(10)).offer_readiness(), Ok(()));
    }

    proptest! {
        #[test]
        fn locked_is_never_negative(unlocked in any::<u128>(), total in any::<u128>()) {
            let balances = UserBalances::new(U256::from(unlocked), U256::from(total));
            let expected = U256::from(total.saturating_sub(unlocked));
            prop_assert_eq!(balances.locked.raw(), expected);
        }
    }
}
