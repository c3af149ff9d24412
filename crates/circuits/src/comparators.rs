//! Flag-gated assertions and range checks.
//!
//! Circuits cannot branch, so every transaction type's checks are always
//! synthesized. A check that belongs to an inactive type is neutralized by
//! selecting both operands to zero, which keeps the constraint count and shape
//! independent of the witness.
//!
//! Ordering checks rely on a range check of the difference: `a <= b` holds iff
//! `b - a` fits in `num_bits`. Both operands must themselves be below
//! `2^num_bits` for this to be sound, which every caller guarantees through the
//! fixed widths in [`crate::config`].

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::alloc::{AllocVar, AllocationMode};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use crate::config::MAX_COMPARISON_BITS;

/// Decompose `value` into `num_bits` little-endian witness bits and enforce the
/// recomposition. Unsatisfiable when `value >= 2^num_bits`.
///
/// Costs `num_bits + 1` constraints, far fewer than a full `to_bits_le`.
pub fn enforce_bit_length<F: PrimeField>(
    value: &FpVar<F>,
    num_bits: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    let cs = value.cs();
    let mode = if value.is_constant() {
        AllocationMode::Constant
    } else {
        AllocationMode::Witness
    };
    let native_bits = value.value().ok().map(|v| v.into_bigint().to_bits_le());

    let bits = (0..num_bits)
        .map(|i| {
            Boolean::new_variable(
                cs.clone(),
                || {
                    native_bits
                        .as_ref()
                        .map(|b| b.get(i).copied().unwrap_or(false))
                        .ok_or(SynthesisError::AssignmentMissing)
                },
                mode,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Boolean::le_bits_to_fp_var(&bits)?.enforce_equal(value)?;
    Ok(bits)
}

/// Enforce `value < 2^num_bits`.
pub fn enforce_range<F: PrimeField>(value: &FpVar<F>, num_bits: usize) -> Result<(), SynthesisError> {
    enforce_bit_length(value, num_bits).map(|_| ())
}

/// `value` when `active`, zero otherwise.
pub fn gate<F: PrimeField>(active: &Boolean<F>, value: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    active.select(value, &FpVar::zero())
}

/// Range check that only binds when `active`.
pub fn enforce_range_if_active<F: PrimeField>(
    active: &Boolean<F>,
    value: &FpVar<F>,
    num_bits: usize,
) -> Result<(), SynthesisError> {
    enforce_range(&gate(active, value)?, num_bits)
}

/// `a == b` when `active`; otherwise compares zero with zero.
pub fn assert_equal_if_active<F: PrimeField>(
    active: &Boolean<F>,
    a: &FpVar<F>,
    b: &FpVar<F>,
) -> Result<(), SynthesisError> {
    gate(active, a)?.enforce_equal(&gate(active, b)?)
}

/// Boolean flavour of [`assert_equal_if_active`].
pub fn assert_true_if_active<F: PrimeField>(
    active: &Boolean<F>,
    condition: &Boolean<F>,
) -> Result<(), SynthesisError> {
    assert_equal_if_active(active, &FpVar::from(condition.clone()), &FpVar::one())
}

/// `a <= b` when `active`, for operands below `2^num_bits`.
pub fn assert_less_or_equal_if_active<F: PrimeField>(
    active: &Boolean<F>,
    a: &FpVar<F>,
    b: &FpVar<F>,
    num_bits: usize,
) -> Result<(), SynthesisError> {
    debug_assert!(num_bits <= MAX_COMPARISON_BITS);
    let a = gate(active, a)?;
    let b = gate(active, b)?;
    enforce_range(&(b - a), num_bits)
}

/// `a < b` when `active`, for operands below `2^num_bits`.
pub fn assert_less_if_active<F: PrimeField>(
    active: &Boolean<F>,
    a: &FpVar<F>,
    b: &FpVar<F>,
    num_bits: usize,
) -> Result<(), SynthesisError> {
    assert_less_or_equal_if_active(active, &(a + F::one()), b, num_bits)
}

/// `quotient == floor(numerator / divisor)` when `active`, i.e.
/// `quotient * divisor <= numerator < (quotient + 1) * divisor`.
pub fn assert_floor_div_if_active<F: PrimeField>(
    active: &Boolean<F>,
    quotient: &FpVar<F>,
    numerator: &FpVar<F>,
    divisor: &FpVar<F>,
    num_bits: usize,
) -> Result<(), SynthesisError> {
    let low = quotient * divisor;
    assert_less_or_equal_if_active(active, &low, numerator, num_bits)?;
    assert_less_if_active(active, numerator, &(low + divisor), num_bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn alloc(cs: &ark_relations::r1cs::ConstraintSystemRef<Fr>, v: Fr) -> FpVar<Fr> {
        FpVar::new_witness(cs.clone(), || Ok(v)).unwrap()
    }

    fn flag(cs: &ark_relations::r1cs::ConstraintSystemRef<Fr>, v: bool) -> Boolean<Fr> {
        Boolean::new_witness(cs.clone(), || Ok(v)).unwrap()
    }

    #[test]
    fn test_range_check_max_value() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let value = alloc(&cs, Fr::from(u32::MAX as u64));
        enforce_range(&value, 32).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_range_check_exceeds() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let value = alloc(&cs, Fr::from(1u64 << 32));
        enforce_range(&value, 32).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_range_check_wrapped_negative() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let value = alloc(&cs, -Fr::from(5u64));
        enforce_range(&value, 64).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_range_check_constant() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let bits = enforce_bit_length(&FpVar::constant(Fr::from(5u64)), 4).unwrap();
        assert_eq!(
            bits.iter().map(|b| b.value().unwrap()).collect::<Vec<_>>(),
            vec![true, false, true, false]
        );
        assert_eq!(cs.num_constraints(), 0);
    }

    #[test]
    fn test_equal_if_active() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = flag(&cs, true);
        let a = alloc(&cs, Fr::from(7u64));
        let b = alloc(&cs, Fr::from(7u64));
        assert_equal_if_active(&on, &a, &b).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_inactive_mismatch_is_vacuous() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let off = flag(&cs, false);
        let a = alloc(&cs, Fr::from(7u64));
        let b = alloc(&cs, Fr::from(8u64));
        assert_equal_if_active(&off, &a, &b).unwrap();
        assert_less_if_active(&off, &b, &a, 64).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_active_mismatch_fails() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = flag(&cs, true);
        let a = alloc(&cs, Fr::from(7u64));
        let b = alloc(&cs, Fr::from(8u64));
        assert_equal_if_active(&on, &a, &b).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_less_or_equal_boundary() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = flag(&cs, true);
        let a = alloc(&cs, Fr::from(100u64));
        let b = alloc(&cs, Fr::from(100u64));
        assert_less_or_equal_if_active(&on, &a, &b, 64).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = flag(&cs, true);
        let a = alloc(&cs, Fr::from(100u64));
        let b = alloc(&cs, Fr::from(100u64));
        assert_less_if_active(&on, &a, &b, 64).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_less_or_equal_rejects_greater() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = flag(&cs, true);
        let a = alloc(&cs, Fr::from(101u64));
        let b = alloc(&cs, Fr::from(100u64));
        assert_less_or_equal_if_active(&on, &a, &b, 64).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_floor_div() {
        // floor(1000 * 250 / 10000) = 25
        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = flag(&cs, true);
        let q = alloc(&cs, Fr::from(25u64));
        let n = alloc(&cs, Fr::from(250_000u64));
        let d = alloc(&cs, Fr::from(10_000u64));
        assert_floor_div_if_active(&on, &q, &n, &d, 64).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = flag(&cs, true);
        let q = alloc(&cs, Fr::from(24u64));
        let n = alloc(&cs, Fr::from(250_000u64));
        let d = alloc(&cs, Fr::from(10_000u64));
        assert_floor_div_if_active(&on, &q, &n, &d, 64).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
