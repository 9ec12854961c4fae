//! ERC-20 token contract bindings
//!
//! Only the ABI is generated here; calls are encoded with [`SolCall`] and
//! routed through the wallet provider rather than a contract instance.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Standard ERC-20 interface
    interface IERC20 {
        /// Human-readable token name
        function name() external view returns (string memory);

        /// Ticker symbol
        function symbol() external view returns (string memory);

        /// Number of decimals used for display
        function decimals() external view returns (uint8);

        /// Total tokens in existence, in base units
        function totalSupply() external view returns (uint256);

        /// Tokens held by `account`, in base units
        function balanceOf(address account) external view returns (uint256);

        /// Remaining amount `spender` may move on behalf of `owner`
        function allowance(address owner, address spender) external view returns (uint256);

        /// Let `spender` move up to `amount` of the caller's tokens
        function approve(address spender, uint256 amount) external returns (bool);

        /// Move `amount` from the caller to `to`
        function transfer(address to, uint256 amount) external returns (bool);

        /// Move `amount` from `from` to `to` using the caller's allowance
        function transferFrom(address from, address to, uint256 amount) external returns (bool);

        /// Tokens moved between accounts (including mints and burns)
        event Transfer(address indexed from, address indexed to, uint256 value);

        /// Allowance set through `approve`
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

/// Calldata for `transfer(to, amount)`
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    Bytes::from(IERC20::transferCall { to, amount }.abi_encode())
}

/// Calldata for `balanceOf(account)`
pub fn balance_of_calldata(account: Address) -> Bytes {
    Bytes::from(IERC20::balanceOfCall { account }.abi_encode())
}
