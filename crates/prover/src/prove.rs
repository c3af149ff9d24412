//! Proof generation for block circuits.

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::info;

use rollup_circuits::{Block, BlockCircuit, CircuitConfig};

/// Errors during proof generation
#[derive(Error, Debug)]
pub enum ProveError {
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// A proof with its public inputs
#[derive(Clone)]
pub struct ProofWithInputs {
    pub proof: Proof<Bn254>,
    pub public_inputs: Vec<Fr>,
}

impl ProofWithInputs {
    /// Serialize proof to bytes
    pub fn serialize_proof(&self) -> Result<Vec<u8>, ProveError> {
        let mut bytes = Vec::new();
        self.proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProveError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize public inputs to bytes (each Fr is 32 bytes)
    pub fn serialize_public_inputs(&self) -> Result<Vec<u8>, ProveError> {
        let mut bytes = Vec::new();
        for input in &self.public_inputs {
            input
                .serialize_compressed(&mut bytes)
                .map_err(|e| ProveError::Serialization(e.to_string()))?;
        }
        Ok(bytes)
    }

    pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProveError> {
        Proof::deserialize_compressed(bytes).map_err(|e| ProveError::Serialization(e.to_string()))
    }
}

/// Cheap native checks run before proving: shape and commitment.
pub fn check_block(config: &CircuitConfig, block: &Block) -> Result<(), ProveError> {
    block
        .validate(config)
        .map_err(|e| ProveError::InvalidBlock(e.to_string()))?;
    if block.commitment != block.compute_commitment() {
        return Err(ProveError::InvalidBlock("commitment does not match block contents".into()));
    }
    Ok(())
}

/// Synthesize the block in full and report the first failing constraint.
/// As slow as proving; meant for debugging rejected blocks.
pub fn check_satisfied(config: &CircuitConfig, block: &Block) -> Result<(), ProveError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    BlockCircuit::new(config.clone(), block.clone())
        .generate_constraints(cs.clone())
        .map_err(|e| ProveError::InvalidBlock(e.to_string()))?;
    match cs.which_is_unsatisfied() {
        Ok(None) => Ok(()),
        Ok(Some(name)) => Err(ProveError::InvalidBlock(format!("unsatisfied constraint {name}"))),
        Err(e) => Err(ProveError::InvalidBlock(e.to_string())),
    }
}

/// Generate a proof for one block
pub fn prove_block(
    pk: &ProvingKey<Bn254>,
    config: &CircuitConfig,
    block: &Block,
) -> Result<ProofWithInputs, ProveError> {
    check_block(config, block)?;

    let start = Instant::now();
    let circuit = BlockCircuit::new(config.clone(), block.clone());
    let public_inputs = circuit.public_inputs();

    let mut rng = StdRng::from_entropy();
    let proof = Groth16::<Bn254>::prove(pk, circuit, &mut rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;
    info!(
        block_number = block.block_number,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "block proof generated"
    );

    Ok(ProofWithInputs {
        proof,
        public_inputs,
    })
}
