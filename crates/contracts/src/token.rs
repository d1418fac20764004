use alloy_sol_types::sol;

sol! {
    /// Minimal ERC20 surface used to pay for offers.
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);

        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

sol! {
    /// The Cortex token.
    ///
    /// `balanceOf` only reports the unlocked (freely transferable) part of a
    /// holder's balance, while `totalBalanceOf` includes the locked part.
    /// Locked CRX can only leave an account through `transferAll`, which moves
    /// the whole balance at once.
    #[derive(Debug, PartialEq, Eq)]
    interface ILockedCortex {
        function balanceOf(address account) external view returns (uint256);
        function totalBalanceOf(address account) external view returns (uint256);
        function transferAll(address to) external;
    }
}
