//! Bindings for the contracts behind the locked CRX OTC desk.
//!
//! None of these contracts live in this repository. The desk only needs their
//! ABIs: the CRX token (with its locked/unlocked split and `transferAll`), the
//! stablecoin, the offer factory, the per-offer escrow, and the lens contract
//! that batches offer reads.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

use alloy_primitives::{Address, address};

pub mod escrow;
pub mod token;

pub use escrow::{ILockedCortexOffer, IOfferFactory, IOfferLens, OfferFactoryEvent};
pub use token::{IERC20, ILockedCortex};

/// Arbitrum One.
pub const ARBITRUM_ONE_CHAIN_ID: u64 = 42161;
/// Arbitrum Sepolia.
pub const ARBITRUM_SEPOLIA_CHAIN_ID: u64 = 421614;

/// Bridged USDC on Arbitrum One.
pub const USDC_ADDRESS: Address = address!("0xFF970A61A04b1cA14834A43f5dE4533eBDDB5CC8");
/// Cortex (CRX) token on Arbitrum One.
pub const CORTEX_ADDRESS: Address = address!("0xb21Be1Caf592A5DC1e75e418704d1B6d50B0d083");
/// Offer lens on Arbitrum One.
pub const LENS_ADDRESS: Address = address!("0xA8029f0AECf2d085C00eBdEc19431f0A6Ab496F2");
/// Verified offer factory on Arbitrum One.
pub const FACTORY_ADDRESS: Address = address!("0x86fff0Cf8C6F272F7c83837B448B2f7c45fB4F1D");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_addresses_are_distinct() {
        let all = [USDC_ADDRESS, CORTEX_ADDRESS, LENS_ADDRESS, FACTORY_ADDRESS];
        for (i, a) in all.iter().enumerate() {
            assert!(!a.is_zero());
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
