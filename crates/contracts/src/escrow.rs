use alloy_sol_types::sol;

pub use IOfferFactory::IOfferFactoryEvents as OfferFactoryEvent;

sol! {
    /// Deploys one escrow per offer and keeps track of which ones are active.
    #[derive(Debug, PartialEq, Eq)]
    interface IOfferFactory {
        function createOffer(address tokenWanted, uint256 amountWanted) external returns (address);
        function fee() external view returns (uint256);
        function getActiveOffers() external view returns (address[]);
        function getActiveOffersByOwner(address owner) external view returns (address[]);
        function getActiveOffersByRange(uint256 start, uint256 end) external view returns (address[]);

        event OfferCreated(address offerAddress, address tokenWanted, uint256 amountWanted);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
    }
}

sol! {
    /// A single escrow holding the seller's CRX until it is filled or cancelled.
    #[derive(Debug, PartialEq, Eq)]
    interface ILockedCortexOffer {
        function seller() external view returns (address);
        function fill() external;
        function cancel() external;
    }
}

sol! {
    /// Read-only helper batching the factory's offer state into one call.
    #[derive(Debug, PartialEq, Eq)]
    interface IOfferLens {
        function getAllActiveOfferInfo(address factory)
            external
            view
            returns (
                address[] offerAddresses,
                uint256[] cortexBalances,
                address[] tokenWanted,
                uint256[] amountWanted
            );
        function getOfferInfo(address offer)
            external
            view
            returns (uint256 cortexBalance, address tokenWanted, uint256 amountWanted);
        function getVolume(address factory) external view returns (uint256 sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256, keccak256};
    use alloy_sol_types::SolEvent;

    #[test]
    fn offer_created_signature() {
        assert_eq!(
            IOfferFactory::OfferCreated::SIGNATURE,
            "OfferCreated(address,address,uint256)"
        );
        assert_eq!(
            IOfferFactory::OfferCreated::SIGNATURE_HASH,
            keccak256("OfferCreated(address,address,uint256)")
        );
    }

    #[test]
    fn offer_created_fields_are_not_indexed() {
        let event = IOfferFactory::OfferCreated {
            offerAddress: Address::repeat_byte(0x11),
            tokenWanted: Address::repeat_byte(0x22),
            amountWanted: U256::from(1_000_000u64),
        };
        let data = event.encode_log_data();

        assert_eq!(data.topics().len(), 1);
        assert_eq!(data.data.len(), 96);
    }
}
