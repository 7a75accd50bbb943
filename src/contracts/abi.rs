//! ABI definitions for the username registry and the token.

use alloy::sol;

sol! {
    /// Username registry that routes token payments by name.
    #[sol(all_derives)]
    interface IUsernamePay {
        /// Emitted when an address claims a username.
        event UsernameRegistered(string username, address indexed userAddress);

        /// Emitted for every payment. Indexed strings are stored as hashes.
        event PaymentSent(string indexed fromUsername, string indexed toUsername, uint256 amount, string message);

        function registerUsername(string calldata username) external;
        function payByUsername(string calldata toUsername, uint256 amount, string calldata message) external;
        function isUsernameAvailable(string calldata username) external view returns (bool);
        function getAddress(string calldata username) external view returns (address);
        function getUsername(address userAddress) external view returns (string memory);
        function usernameToAddress(string calldata username) external view returns (address);
        function addressToUsername(address userAddress) external view returns (string memory);
    }

    /// Minimal ERC-20 surface.
    #[sol(all_derives)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Longest username the registry accepts, in bytes.
pub const MAX_USERNAME_BYTES: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn test_selectors() {
        // keccak("approve(address,uint256)")[..4]
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        // keccak("balanceOf(address)")[..4]
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(
            IUsernamePay::payByUsernameCall::SIGNATURE,
            "payByUsername(string,uint256,string)"
        );
    }
}
