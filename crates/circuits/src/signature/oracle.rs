//! Out-of-circuit ECDSA verification over secp256k1.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use super::eip712::keccak256;
use crate::error::HintError;
use crate::model::{PublicKey, SignatureBytes};

/// Verifies a recoverable signature over a 32-byte digest against a stored
/// public key. The answer is untrusted by the circuit: it only enters as a
/// witness bit that is then asserted.
pub trait SignatureOracle {
    /// `Ok(false)` for a well-formed signature by a different key; `Err` for
    /// bytes that are not a canonical signature at all.
    fn verify(&self, digest: &[u8; 32], signature: &SignatureBytes, public_key: &PublicKey)
        -> Result<bool, HintError>;
}

/// Recover-and-compare, the way layer-1 `ecrecover` checks a signer.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaOracle;

impl EcdsaOracle {
    pub fn recover(&self, digest: &[u8; 32], signature: &SignatureBytes) -> Result<PublicKey, HintError> {
        let bytes = &signature.0;
        let v = bytes[64];
        if v != 27 && v != 28 {
            return Err(HintError::MalformedSignature("recovery byte must be 27 or 28"));
        }
        let sig = Signature::from_slice(&bytes[..64])
            .map_err(|_| HintError::MalformedSignature("r or s out of range"))?;
        if sig.normalize_s().is_some() {
            return Err(HintError::MalformedSignature("s is not in the lower half order"));
        }
        let recovery_id =
            RecoveryId::from_byte(v - 27).ok_or(HintError::MalformedSignature("invalid recovery id"))?;
        let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
            .map_err(|e| HintError::RecoveryFailed(e.to_string()))?;
        Ok(public_key_of(&key))
    }
}

impl SignatureOracle for EcdsaOracle {
    fn verify(
        &self,
        digest: &[u8; 32],
        signature: &SignatureBytes,
        public_key: &PublicKey,
    ) -> Result<bool, HintError> {
        Ok(&self.recover(digest, signature)? == public_key)
    }
}

/// `keccak256(X || Y)` of the uncompressed point.
pub fn public_key_of(key: &VerifyingKey) -> PublicKey {
    let point = key.to_encoded_point(false);
    keccak256(&point.as_bytes()[1..])
}

/// Sign a digest, producing `r || s || v` with `v` in {27, 28}.
pub fn sign_digest(key: &SigningKey, digest: &[u8; 32]) -> Result<SignatureBytes, HintError> {
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| HintError::RecoveryFailed(e.to_string()))?;
    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&sig.to_bytes());
    bytes[64] = 27 + recovery_id.to_byte();
    Ok(SignatureBytes(bytes))
}
