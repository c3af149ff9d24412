//! Transaction and block verifiers.

mod block;
mod tx;

pub use block::BlockCircuit;
pub use tx::{verify_transaction, TxVerifierOutput};
