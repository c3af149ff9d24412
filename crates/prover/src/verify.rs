//! Local proof verification.

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;
use thiserror::Error;
use tracing::info;

use crate::prove::ProofWithInputs;

/// Errors during verification
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Invalid public inputs")]
    InvalidInputs,
}

/// Verify a block proof against its commitment, the single public input.
pub fn verify_block(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    commitment: Fr,
) -> Result<bool, VerifyError> {
    let start = Instant::now();
    let valid = Groth16::<Bn254>::verify(vk, &[commitment], proof)
        .map_err(|e| VerifyError::Verification(e.to_string()))?;
    info!(valid, elapsed_ms = start.elapsed().as_millis() as u64, "block proof verified");
    Ok(valid)
}

pub fn verify_proof(vk: &VerifyingKey<Bn254>, proof: &ProofWithInputs) -> Result<bool, VerifyError> {
    match proof.public_inputs.as_slice() {
        [commitment] => verify_block(vk, &proof.proof, *commitment),
        _ => Err(VerifyError::InvalidInputs),
    }
}

#[cfg(test)]
mod tests {
    use ark_ff::One;
    use k256::ecdsa::SigningKey;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::prove::prove_block;
    use crate::setup::setup_with_seed;
    use rollup_circuits::packed::pack_amount;
    use rollup_circuits::signature::{public_key_of, sign_digest};
    use rollup_circuits::tx::{DepositTx, GasFee, NativeTx, RegisterZnsTx, TransferTx};
    use rollup_circuits::{CircuitConfig, EcdsaOracle, RollupState, SigningDomain, TxPayload, TxRequest};

    #[test]
    fn test_wrong_input_count_rejected() {
        let proof = ProofWithInputs {
            proof: Proof::default(),
            public_inputs: vec![Fr::one(), Fr::one()],
        };
        assert!(matches!(
            verify_proof(&VerifyingKey::default(), &proof),
            Err(VerifyError::InvalidInputs)
        ));
    }

    /// Registers two accounts, funds one, then proves a signed transfer.
    #[test]
    #[ignore = "slow: runs a full trusted setup and two proofs"]
    fn test_prove_and_verify_transfer_block() {
        let config = CircuitConfig::testing(2);
        let keys = setup_with_seed(&config, 42).unwrap();
        let mut state = RollupState::new(config.clone()).unwrap();

        let alice = SigningKey::random(&mut StdRng::seed_from_u64(1));
        let genesis = [
            TxRequest::new(TxPayload::RegisterZns(RegisterZnsTx {
                account_index: 1,
                account_name: Fr::from(1100u64),
                account_name_hash: Fr::from(11u64),
                public_key: public_key_of(alice.verifying_key()),
            })),
            TxRequest::new(TxPayload::Deposit(DepositTx {
                account_index: 1,
                account_name_hash: Fr::from(11u64),
                asset_id: 0,
                asset_amount: 5000,
            })),
        ];
        let first = state.build_block(&EcdsaOracle, 1, 100, &genesis).unwrap();

        let payload = TxPayload::Transfer(TransferTx {
            from_account_index: 1,
            to_account_index: 2,
            to_account_name_hash: Fr::from(0u64),
            asset_id: 0,
            asset_amount: pack_amount(1000).unwrap(),
            gas: GasFee {
                gas_account_index: 3,
                gas_fee_asset_id: 0,
                gas_fee_asset_amount: 0,
            },
            call_data_hash: Fr::from(0u64),
        });
        let digest = SigningDomain::new(&config.domain)
            .tx_digest(payload.tx_type(), &payload.native().hash_fields(), 0, 1000)
            .unwrap();
        let transfer = TxRequest {
            payload,
            nonce: 0,
            expired_at: 1000,
            signature: sign_digest(&alice, &digest).unwrap(),
        };
        let second = state.build_block(&EcdsaOracle, 2, 200, &[transfer]).unwrap();

        for block in [first, second] {
            let proof = prove_block(&keys.keys.proving_key, &config, &block).unwrap();
            assert!(verify_proof(&keys.keys.verifying_key, &proof).unwrap());
            assert!(!verify_block(&keys.keys.verifying_key, &proof.proof, block.commitment + Fr::one()).unwrap());
        }
    }
}
