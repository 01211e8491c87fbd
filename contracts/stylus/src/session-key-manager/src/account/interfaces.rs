//! Solidity ABI interfaces used to build and decode account call data.

use alloy_sol_types::sol;

sol! {
    /// Execution entrypoints of the smart account.
    interface ISmartAccount {
        function execute(address dest, uint256 value, bytes func) external;
        function execute_ncC(address dest, uint256 value, bytes func) external;
        function executeBatch(address[] dest, uint256[] value, bytes[] func) external;
        function executeBatch_y6U(address[] dest, uint256[] value, bytes[] func) external;
        function enableModule(address module) external;
    }

    interface ISessionKeyManager {
        function setMerkleRoot(bytes32 root) external;
    }

    interface IERC721 {
        function setApprovalForAll(address operator, bool approved) external;
        function isApprovedForAll(address owner, address operator) external view returns (bool);
    }

    interface IERC1155MintTo {
        function mintTo(address to, uint256 id, uint256 amount) external;
    }
}
