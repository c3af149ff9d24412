//! Floating-point-like amount encoding used to shrink pubdata.
//!
//! A packed value stores the exponent in its low 5 bits and the mantissa above
//! it: `value = mantissa * 10^exponent`. Amounts use 40 bits (35-bit mantissa),
//! fees 16 bits (11-bit mantissa).

use ark_bn254::Fr;
use ark_r1cs_std::prelude::*;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;

use crate::comparators::{enforce_bit_length, gate};
use crate::config::{PACKED_AMOUNT_BITS, PACKED_FEE_BITS};
use crate::error::WitnessError;

pub const EXPONENT_BITS: usize = 5;
pub const AMOUNT_MANTISSA_BITS: usize = PACKED_AMOUNT_BITS - EXPONENT_BITS;
pub const FEE_MANTISSA_BITS: usize = PACKED_FEE_BITS - EXPONENT_BITS;

const MAX_EXPONENT: u32 = (1 << EXPONENT_BITS) - 1;

fn pack(value: u128, mantissa_bits: usize) -> Result<u64, WitnessError> {
    let mut mantissa = value;
    let mut exponent = 0u32;
    while mantissa >> mantissa_bits != 0 {
        if mantissa % 10 != 0 || exponent == MAX_EXPONENT {
            return Err(WitnessError::Unpackable(value));
        }
        mantissa /= 10;
        exponent += 1;
    }
    Ok(((mantissa as u64) << EXPONENT_BITS) | exponent as u64)
}

fn unpack(packed: u64, total_bits: usize) -> Result<u128, WitnessError> {
    if packed >> total_bits != 0 {
        return Err(WitnessError::PackedOverflow(packed));
    }
    let exponent = (packed as u32) & MAX_EXPONENT;
    let mantissa = (packed >> EXPONENT_BITS) as u128;
    10u128
        .checked_pow(exponent)
        .and_then(|scale| mantissa.checked_mul(scale))
        .ok_or(WitnessError::PackedOverflow(packed))
}

/// Pack an amount, stripping trailing decimal zeros only as far as needed.
pub fn pack_amount(value: u128) -> Result<u64, WitnessError> {
    pack(value, AMOUNT_MANTISSA_BITS)
}

pub fn pack_fee(value: u128) -> Result<u64, WitnessError> {
    pack(value, FEE_MANTISSA_BITS)
}

pub fn unpack_amount(packed: u64) -> Result<u128, WitnessError> {
    unpack(packed, PACKED_AMOUNT_BITS)
}

pub fn unpack_fee(packed: u64) -> Result<u128, WitnessError> {
    unpack(packed, PACKED_FEE_BITS)
}

fn unpack_var(
    active: &Boolean<Fr>,
    packed: &FpVar<Fr>,
    total_bits: usize,
) -> Result<FpVar<Fr>, SynthesisError> {
    let bits = enforce_bit_length(&gate(active, packed)?, total_bits)?;

    let mut scale = FpVar::one();
    let mut power = Fr::from(10u64);
    for bit in &bits[..EXPONENT_BITS] {
        scale *= bit.select(&FpVar::constant(power), &FpVar::one())?;
        power = power * power;
    }
    let mantissa = Boolean::le_bits_to_fp_var(&bits[EXPONENT_BITS..])?;
    Ok(mantissa * scale)
}

/// Unpack a 40-bit amount in-circuit. Zero when `active` is false.
pub fn unpack_amount_var(active: &Boolean<Fr>, packed: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    unpack_var(active, packed, PACKED_AMOUNT_BITS)
}

/// Unpack a 16-bit fee in-circuit. Zero when `active` is false.
pub fn unpack_fee_var(active: &Boolean<Fr>, packed: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    unpack_var(active, packed, PACKED_FEE_BITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use proptest::prelude::*;

    #[test]
    fn test_small_values_have_zero_exponent() {
        assert_eq!(pack_amount(100).unwrap(), 100 << 5);
        assert_eq!(pack_fee(1).unwrap(), 1 << 5);
        assert_eq!(unpack_amount(100 << 5).unwrap(), 100);
    }

    #[test]
    fn test_large_round_amount() {
        let value = 12_345u128 * 10u128.pow(20);
        let packed = pack_amount(value).unwrap();
        // zeros are stripped only until the mantissa fits 35 bits
        assert_eq!(packed & 0x1f, 14);
        assert_eq!(packed >> EXPONENT_BITS, 12_345 * 10u64.pow(6));
        assert_eq!(unpack_amount(packed).unwrap(), value);
    }

    #[test]
    fn test_unpackable_amount() {
        // 2^35 + 1 needs 36 mantissa bits and has no trailing zero to strip
        let value = (1u128 << 35) + 1;
        assert_eq!(pack_amount(value), Err(WitnessError::Unpackable(value)));
        assert!(pack_fee(2049).is_err());
    }

    #[test]
    fn test_packed_width_enforced() {
        assert!(matches!(unpack_fee(1 << 16), Err(WitnessError::PackedOverflow(_))));
    }

    #[test]
    fn test_gadget_matches_native() {
        let packed = pack_amount(987_000_000_000).unwrap();
        let cs = ConstraintSystem::<Fr>::new_ref();
        let active = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let packed_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(packed))).unwrap();
        let amount = unpack_amount_var(&active, &packed_var).unwrap();
        amount
            .enforce_equal(&FpVar::constant(Fr::from(987_000_000_000u128)))
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
        println!("Packed amount unpack constraints: {}", cs.num_constraints());
    }

    #[test]
    fn test_inactive_oversized_packed_is_ignored() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let active = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        let packed_var = FpVar::new_witness(cs.clone(), || Ok(-Fr::from(1u64))).unwrap();
        let amount = unpack_fee_var(&active, &packed_var).unwrap();
        amount.enforce_equal(&FpVar::zero()).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_active_oversized_packed_fails() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let active = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let packed_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(1u64 << 16))).unwrap();
        unpack_fee_var(&active, &packed_var).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    proptest! {
        #[test]
        fn prop_pack_roundtrip(mantissa in 0u128..(1 << 35), exponent in 0u32..=20) {
            let value = mantissa * 10u128.pow(exponent);
            let packed = pack_amount(value).unwrap();
            prop_assert!(packed >> PACKED_AMOUNT_BITS == 0);
            prop_assert_eq!(unpack_amount(packed).unwrap(), value);
        }
    }
}
