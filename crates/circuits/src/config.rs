//! Protocol constants and runtime configuration.
//!
//! Bit widths here are part of the pubdata wire format consumed on layer 1,
//! so changing any of them changes the commitment of every block.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Account slots touched by every transaction.
pub const NUM_ACCOUNTS_PER_TX: usize = 5;

/// Asset slots authenticated per touched account.
pub const NUM_ASSETS_PER_ACCOUNT: usize = 4;

/// Field elements of pubdata emitted per transaction.
pub const PUBDATA_ELEMENTS: usize = 6;

/// Usable bits of one pubdata element.
pub const CHUNK_BITS: usize = 248;

/// Fixed-point base for fee and treasury rates (10000 = 100%).
pub const RATE_BASE: u64 = 10_000;

/// Offer slots per asset leaf bitmap.
pub const OFFER_SLOTS: usize = 128;

/// Low bits of an offer id addressing the bitmap slot.
pub const OFFER_SLOT_BITS: usize = 7;

pub const PUBKEY_BYTES: usize = 32;
pub const SIGNATURE_BYTES: usize = 65;

/// Number of payload fields absorbed into the transaction hash.
pub const TX_HASH_FIELDS: usize = 16;

/// Reserve and amount width accepted by the AMM checks. Keeps every product
/// compared in Swap and liquidity operations below 2^252.
pub const AMM_AMOUNT_BITS: usize = 100;

/// Widest difference `assert_less_or_equal_if_active` can range-check.
pub const MAX_COMPARISON_BITS: usize = 252;

/// Deepest tree the native sparse Merkle tree can index with `u64`.
pub const MAX_TREE_DEPTH: usize = 62;

pub const TX_TYPE_BITS: usize = 8;
pub const ACCOUNT_INDEX_BITS: usize = 32;
pub const ASSET_ID_BITS: usize = 16;
pub const PAIR_INDEX_BITS: usize = 16;
pub const NFT_INDEX_BITS: usize = 40;
pub const COLLECTION_ID_BITS: usize = 16;
pub const OFFER_ID_BITS: usize = 24;
pub const OFFER_TYPE_BITS: usize = 8;
pub const PACKED_AMOUNT_BITS: usize = 40;
pub const PACKED_FEE_BITS: usize = 16;
pub const BALANCE_BITS: usize = 128;
pub const RATE_BITS: usize = 16;
pub const TIMESTAMP_BITS: usize = 64;
pub const NONCE_BITS: usize = 64;
pub const ADDRESS_BITS: usize = 160;

/// Depths of the four authenticated trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDepths {
    pub account: usize,
    pub asset: usize,
    pub liquidity: usize,
    pub nft: usize,
}

impl Default for TreeDepths {
    fn default() -> Self {
        Self {
            account: 32,
            asset: 16,
            liquidity: 16,
            nft: 40,
        }
    }
}

impl TreeDepths {
    /// Shallow trees for unit tests.
    pub fn testing() -> Self {
        Self {
            account: 4,
            asset: 3,
            liquidity: 3,
            nft: 4,
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        let checks = [
            ("account", self.account, ACCOUNT_INDEX_BITS),
            ("asset", self.asset, ASSET_ID_BITS),
            ("liquidity", self.liquidity, PAIR_INDEX_BITS),
            ("nft", self.nft, NFT_INDEX_BITS),
        ];
        for (tree, depth, index_bits) in checks {
            if depth == 0 || depth > MAX_TREE_DEPTH || depth > index_bits {
                return Err(BuildError::TreeDepth {
                    tree,
                    depth,
                    max: index_bits.min(MAX_TREE_DEPTH),
                });
            }
        }
        Ok(())
    }
}

/// EIP-712 domain used for layer-1 compatible signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: [u8; 20],
}

impl Default for Eip712Domain {
    fn default() -> Self {
        Self {
            name: "ZkRollup".to_string(),
            version: "1".to_string(),
            chain_id: 1,
            verifying_contract: [0u8; 20],
        }
    }
}

/// Everything that fixes the shape of a block circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub depths: TreeDepths,
    pub block_size: usize,
    pub domain: Eip712Domain,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            depths: TreeDepths::default(),
            block_size: 1,
            domain: Eip712Domain::default(),
        }
    }
}

impl CircuitConfig {
    pub fn testing(block_size: usize) -> Self {
        Self {
            depths: TreeDepths::testing(),
            block_size,
            domain: Eip712Domain::default(),
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        self.depths.validate()?;
        if self.block_size == 0 {
            return Err(BuildError::EmptyBlock);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_depths_are_valid() {
        assert!(TreeDepths::default().validate().is_ok());
        assert!(TreeDepths::testing().validate().is_ok());
    }

    #[test]
    fn test_depth_wider_than_index_rejected() {
        let depths = TreeDepths {
            asset: 17,
            ..TreeDepths::default()
        };
        assert!(matches!(
            depths.validate(),
            Err(BuildError::TreeDepth { tree: "asset", .. })
        ));
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let config = CircuitConfig::testing(0);
        assert!(matches!(config.validate(), Err(BuildError::EmptyBlock)));
    }
}
