//! Error types for circuit construction and witness preparation.
//!
//! A witness that violates a transaction rule is not an error: it simply
//! leaves the constraint system unsatisfied. These types cover inputs that
//! cannot be turned into a circuit at all.

use thiserror::Error;

use crate::tx::TxType;

/// Faults detected before any constraint is generated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("{what}: expected {expected} entries, got {actual}")]
    ArrayLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{tree} tree depth {depth} outside 1..={max}")]
    TreeDepth {
        tree: &'static str,
        depth: usize,
        max: usize,
    },
    #[error("unknown transaction type tag {0}")]
    UnknownTxType(u8),
    #[error("block must contain at least one transaction")]
    EmptyBlock,
}

impl BuildError {
    pub(crate) fn check_len(
        what: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), BuildError> {
        if expected == actual {
            Ok(())
        } else {
            Err(BuildError::ArrayLength {
                what,
                expected,
                actual,
            })
        }
    }
}

/// Failures of the out-of-circuit auxiliary computations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HintError {
    #[error("malformed signature: {0}")]
    MalformedSignature(&'static str),
    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),
    #[error("{tx_type:?} encodes {actual} ABI words but its type string declares {expected}")]
    AbiLayout {
        tx_type: TxType,
        expected: usize,
        actual: usize,
    },
}

/// Failures of the native witness builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WitnessError {
    #[error("{tree} index {index} exceeds capacity of depth {depth}")]
    IndexOutOfRange {
        tree: &'static str,
        index: u64,
        depth: usize,
    },
    #[error("account {account} asset {asset_id}: {field} underflow")]
    BalanceUnderflow {
        account: u32,
        asset_id: u16,
        field: &'static str,
    },
    #[error("pair {pair_index}: {field} underflow")]
    PoolUnderflow {
        pair_index: u16,
        field: &'static str,
    },
    #[error("pair {pair_index}: {field} exceeds the AMM amount width")]
    AmmRange {
        pair_index: u16,
        field: &'static str,
    },
    #[error("amount {0} is not representable in packed form")]
    Unpackable(u128),
    #[error("packed value {0:#x} overflows when unpacked")]
    PackedOverflow(u64),
    #[error("amount {0} exceeds the signed delta range")]
    AmountOverflow(u128),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Hint(#[from] HintError),
}
