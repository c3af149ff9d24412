//! Trusted setup for the block circuit and key persistence.

use std::path::Path;
use std::time::Instant;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::info;

use rollup_circuits::{BlockCircuit, BuildError, CircuitConfig};

const PROVING_KEY_FILE: &str = "block.pk";
const VERIFYING_KEY_FILE: &str = "block.vk";
const CONFIG_FILE: &str = "config.json";

/// Errors that can occur during setup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Circuit setup failed: {0}")]
    CircuitSetup(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("Invalid circuit config: {0}")]
    Config(#[from] BuildError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keys for one block circuit shape
#[derive(Clone)]
pub struct CircuitKeyPair {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl CircuitKeyPair {
    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, SetupError> {
        ProvingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, SetupError> {
        VerifyingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }
}

/// Keys together with the circuit shape they were generated for.
#[derive(Clone)]
pub struct BlockKeys {
    pub config: CircuitConfig,
    pub keys: CircuitKeyPair,
}

impl BlockKeys {
    /// Save keys and config to a directory
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), SetupError> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(PROVING_KEY_FILE), self.keys.serialize_pk()?)?;
        std::fs::write(dir.join(VERIFYING_KEY_FILE), self.keys.serialize_vk()?)?;
        save_config(&self.config, &dir.join(CONFIG_FILE))
    }

    /// Load keys and config from a directory
    pub fn load_from_directory(dir: &Path) -> Result<Self, SetupError> {
        let config = load_config(&dir.join(CONFIG_FILE))?;
        let keys = CircuitKeyPair {
            proving_key: CircuitKeyPair::deserialize_pk(&std::fs::read(dir.join(PROVING_KEY_FILE))?)?,
            verifying_key: CircuitKeyPair::deserialize_vk(&std::fs::read(dir.join(VERIFYING_KEY_FILE))?)?,
        };
        Ok(Self { config, keys })
    }
}

/// Read a JSON circuit config and check it.
pub fn load_config(path: &Path) -> Result<CircuitConfig, SetupError> {
    let bytes = std::fs::read(path)?;
    let config: CircuitConfig =
        serde_json::from_slice(&bytes).map_err(|e| SetupError::Deserialization(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(config: &CircuitConfig, path: &Path) -> Result<(), SetupError> {
    let json = serde_json::to_string_pretty(config).map_err(|e| SetupError::Serialization(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Run circuit-specific setup for blocks of the given shape.
pub fn setup_block_circuit(config: &CircuitConfig, rng: &mut StdRng) -> Result<CircuitKeyPair, SetupError> {
    config.validate()?;
    let start = Instant::now();
    let circuit = BlockCircuit::empty(config.clone());
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
        .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;
    info!(
        block_size = config.block_size,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "block circuit setup complete"
    );
    Ok(CircuitKeyPair {
        proving_key: pk,
        verifying_key: vk,
    })
}

/// Setup from a fixed seed. Reproducible, so only fit for testing and
/// local deployments.
pub fn setup_with_seed(config: &CircuitConfig, seed: u64) -> Result<BlockKeys, SetupError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let keys = setup_block_circuit(config, &mut rng)?;
    Ok(BlockKeys {
        config: config.clone(),
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = CircuitConfig::testing(2);
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        save_config(&CircuitConfig::testing(0), &path).unwrap();
        assert!(matches!(
            load_config(&path),
            Err(SetupError::Config(BuildError::EmptyBlock))
        ));
    }

    #[test]
    fn test_missing_keys_reported() {
        let dir = tempfile::tempdir().unwrap();
        save_config(&CircuitConfig::testing(1), &dir.path().join(CONFIG_FILE)).unwrap();
        assert!(matches!(
            BlockKeys::load_from_directory(dir.path()),
            Err(SetupError::Io(_))
        ));
    }

    #[test]
    fn test_garbage_key_rejected() {
        assert!(matches!(
            CircuitKeyPair::deserialize_vk(&[1, 2, 3]),
            Err(SetupError::Deserialization(_))
        ));
    }

    #[test]
    #[ignore = "slow: runs a full trusted setup"]
    fn test_keys_survive_directory_round_trip() {
        let config = CircuitConfig::testing(1);
        let keys = setup_with_seed(&config, 42).unwrap();
        let dir = tempfile::tempdir().unwrap();
        keys.save_to_directory(dir.path()).unwrap();

        let loaded = BlockKeys::load_from_directory(dir.path()).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.keys.serialize_vk().unwrap(), keys.keys.serialize_vk().unwrap());
    }
}
