//! Conversions between integers, byte strings and field elements.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;

/// Signed integer into the field (negative values wrap to `p - |v|`).
pub fn fr_from_i128(value: i128) -> Fr {
    if value >= 0 {
        Fr::from(value as u128)
    } else {
        -Fr::from(value.unsigned_abs())
    }
}

/// Canonical 32-byte big-endian encoding.
pub fn fr_to_bytes_be(value: &Fr) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Big-endian bytes reduced modulo the field order.
pub fn fr_from_bytes_be(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

pub fn fr_to_biguint(value: &Fr) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// `None` when the element does not fit in 128 bits.
pub fn fr_to_u128(value: &Fr) -> Option<u128> {
    let bytes = fr_to_bytes_be(value);
    if bytes[..16].iter().any(|b| *b != 0) {
        return None;
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&bytes[16..]);
    Some(u128::from_be_bytes(low))
}

/// Split 32 bytes into big-endian (high, low) 128-bit halves.
pub fn bytes32_to_halves(bytes: &[u8; 32]) -> (Fr, Fr) {
    (fr_from_bytes_be(&bytes[..16]), fr_from_bytes_be(&bytes[16..]))
}

pub fn address_to_fr(address: &[u8; 20]) -> Fr {
    fr_from_bytes_be(address)
}

/// Allocate a private witness from a native value.
pub fn witness(cs: &ConstraintSystemRef<Fr>, value: Fr) -> Result<FpVar<Fr>, SynthesisError> {
    FpVar::new_witness(cs.clone(), || Ok(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_i128_wraps() {
        assert_eq!(fr_from_i128(-5) + Fr::from(5u64), Fr::from(0u64));
        assert_eq!(fr_from_i128(7), Fr::from(7u64));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let value = Fr::from(0xdead_beefu64);
        assert_eq!(fr_from_bytes_be(&fr_to_bytes_be(&value)), value);
        assert_eq!(fr_to_bytes_be(&value)[28..], [0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_fr_to_u128_bounds() {
        assert_eq!(fr_to_u128(&Fr::from(u128::MAX)), Some(u128::MAX));
        assert_eq!(fr_to_u128(&(Fr::from(u128::MAX) + Fr::from(1u64))), None);
    }

    #[test]
    fn test_halves_recompose() {
        let mut bytes = [0u8; 32];
        bytes[15] = 1;
        bytes[31] = 2;
        let (hi, lo) = bytes32_to_halves(&bytes);
        assert_eq!(hi, Fr::from(1u64));
        assert_eq!(lo, Fr::from(2u64));
    }
}
