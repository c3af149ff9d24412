//! Block verifier: chains N transaction verifiers root to root and exposes the
//! block commitment as the single public input.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use tracing::debug;

use super::tx::verify_transaction;
use crate::comparators::assert_equal_if_active;
use crate::config::CircuitConfig;
use crate::field::witness;
use crate::poseidon::poseidon_hash_many_var;
use crate::witness::Block;

/// Proves that `block.txs`, applied in order, move the state from
/// `old_state_root` to `new_state_root`, and that `commitment` hashes the
/// header, every transaction's pubdata and the on-chain operation count.
///
/// Public input: the block commitment.
#[derive(Clone)]
pub struct BlockCircuit {
    pub config: CircuitConfig,
    pub block: Block,
}

impl BlockCircuit {
    pub fn new(config: CircuitConfig, block: Block) -> Self {
        Self { config, block }
    }

    /// Circuit of the right shape with placeholder values, for key generation.
    pub fn empty(config: CircuitConfig) -> Self {
        let block = Block::placeholder(&config);
        Self { config, block }
    }

    /// Commitment the circuit exposes as its public input.
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![self.block.commitment]
    }
}

impl ConstraintSynthesizer<Fr> for BlockCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let block = &self.block;
        if block.validate(&self.config).is_err() {
            return Err(SynthesisError::Unsatisfiable);
        }

        let commitment = FpVar::new_input(cs.clone(), || Ok(block.commitment))?;
        let block_number = witness(&cs, Fr::from(block.block_number))?;
        let created_at = witness(&cs, Fr::from(block.created_at))?;
        let old_root = witness(&cs, block.old_state_root)?;
        let new_root = witness(&cs, block.new_state_root)?;

        let mut buffer = vec![block_number, created_at.clone(), old_root.clone(), new_root.clone()];
        let mut on_chain_ops = FpVar::zero();
        let mut current_root = old_root.clone();
        for (i, tx) in block.txs.iter().enumerate() {
            let out = verify_transaction(&cs, &self.config.depths, tx, &created_at)?;
            if i == 0 {
                out.root_before.enforce_equal(&old_root)?;
            } else {
                assert_equal_if_active(&out.is_empty.not(), &out.root_before, &current_root)?;
            }
            current_root = out.is_empty.select(&current_root, &out.root_after)?;
            on_chain_ops += &out.on_chain_op;
            buffer.extend(out.pubdata);
            debug!(
                tx = i,
                tx_type = ?tx.tx_type(),
                constraints = cs.num_constraints(),
                "transaction synthesized"
            );
        }
        current_root.enforce_equal(&new_root)?;

        buffer.push(on_chain_ops);
        let computed = poseidon_hash_many_var(cs.clone(), &buffer)?;
        computed.enforce_equal(&commitment)
    }
}
