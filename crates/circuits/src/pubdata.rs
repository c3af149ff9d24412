//! Bit packing of per-transaction pubdata.
//!
//! Fields are laid out from bit 0 of element 0 upwards in the order a type
//! lists them, so reading an element from its high end gives
//! `[pad][last field] ... [first field][txType]`. A field that does not fit in
//! the remaining `CHUNK_BITS` of an element starts the next one; hash-like
//! fields occupy an element of their own.
//!
//! Layouts are written once per transaction type as a list of
//! [`PubdataField`]s; the native packer, the gadget and the reader all place
//! fields through [`place`] so they cannot drift apart.

use ark_bn254::Fr;
use ark_ff::Field;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::comparators::enforce_range_if_active;
use crate::config::{CHUNK_BITS, PUBDATA_ELEMENTS};
use crate::field::fr_to_biguint;

/// One entry of a pubdata layout.
#[derive(Clone, Debug)]
pub enum PubdataField<T> {
    /// A fixed-width integer field.
    Bits(T, usize),
    /// A full field element (hashes, token ids).
    Element(T),
}

/// Position of a field inside the pubdata record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot {
    element: usize,
    offset: usize,
    /// `None` for whole-element fields.
    width: Option<usize>,
}

/// Cursor that assigns element/offset positions in layout order.
#[derive(Default)]
struct Cursor {
    element: usize,
    offset: usize,
}

impl Cursor {
    fn bits(&mut self, width: usize) -> Slot {
        debug_assert!(width <= CHUNK_BITS);
        if self.offset + width > CHUNK_BITS {
            self.element += 1;
            self.offset = 0;
        }
        let slot = Slot {
            element: self.element,
            offset: self.offset,
            width: Some(width),
        };
        self.offset += width;
        slot
    }

    fn element(&mut self) -> Slot {
        if self.offset > 0 {
            self.element += 1;
        }
        let slot = Slot {
            element: self.element,
            offset: 0,
            width: None,
        };
        self.element += 1;
        self.offset = 0;
        slot
    }
}

fn place<T>(fields: &[PubdataField<T>]) -> Vec<Slot> {
    let mut cursor = Cursor::default();
    let slots: Vec<Slot> = fields
        .iter()
        .map(|field| match field {
            PubdataField::Bits(_, width) => cursor.bits(*width),
            PubdataField::Element(_) => cursor.element(),
        })
        .collect();
    debug_assert!(slots.iter().all(|s| s.element < PUBDATA_ELEMENTS));
    slots
}

fn shift(offset: usize) -> Fr {
    Fr::from(2u64).pow([offset as u64])
}

/// Native packing. Fields must already fit their declared widths.
pub fn pack_pubdata(fields: &[PubdataField<Fr>]) -> Vec<Fr> {
    let mut out = vec![Fr::from(0u64); PUBDATA_ELEMENTS];
    for (field, slot) in fields.iter().zip(place(fields)) {
        match field {
            PubdataField::Bits(value, _) => out[slot.element] += *value * shift(slot.offset),
            PubdataField::Element(value) => out[slot.element] = *value,
        }
    }
    out
}

/// In-circuit packing. Each fixed-width field is range-checked to its width
/// when `active`, so an oversized value cannot bleed into its neighbour.
pub fn pack_pubdata_var(
    active: &Boolean<Fr>,
    fields: &[PubdataField<FpVar<Fr>>],
) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    let mut out = vec![FpVar::zero(); PUBDATA_ELEMENTS];
    for (field, slot) in fields.iter().zip(place(fields)) {
        match field {
            PubdataField::Bits(value, width) => {
                enforce_range_if_active(active, value, *width)?;
                out[slot.element] += value * shift(slot.offset);
            }
            PubdataField::Element(value) => out[slot.element] = value.clone(),
        }
    }
    Ok(out)
}

/// Sequential reader mirroring a layout, for layer-1 style decoding.
pub struct PubdataReader<'a> {
    pubdata: &'a [Fr],
    cursor: Cursor,
}

impl<'a> PubdataReader<'a> {
    pub fn new(pubdata: &'a [Fr]) -> Self {
        Self {
            pubdata,
            cursor: Cursor::default(),
        }
    }

    pub fn read_bits(&mut self, width: usize) -> BigUint {
        let slot = self.cursor.bits(width);
        let element = fr_to_biguint(&self.pubdata[slot.element]);
        (element >> slot.offset) & ((BigUint::from(1u8) << width) - 1u8)
    }

    pub fn read_u64(&mut self, width: usize) -> u64 {
        self.read_bits(width).to_u64().unwrap_or(u64::MAX)
    }

    pub fn read_u128(&mut self, width: usize) -> u128 {
        self.read_bits(width).to_u128().unwrap_or(u128::MAX)
    }

    pub fn read_element(&mut self) -> Fr {
        let slot = self.cursor.element();
        self.pubdata[slot.element]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn layout(a: u64, b: u64, hash: u64) -> Vec<PubdataField<Fr>> {
        vec![
            PubdataField::Bits(Fr::from(6u64), 8),
            PubdataField::Bits(Fr::from(a), 200),
            PubdataField::Bits(Fr::from(b), 64),
            PubdataField::Element(Fr::from(hash)),
            PubdataField::Bits(Fr::from(1u64), 8),
        ]
    }

    #[test]
    fn test_overflowing_field_starts_next_element() {
        let pubdata = pack_pubdata(&layout(3, 5, 99));
        assert_eq!(pubdata.len(), PUBDATA_ELEMENTS);
        assert_eq!(pubdata[0], Fr::from(6u64) + Fr::from(3u64) * shift(8));
        assert_eq!(pubdata[1], Fr::from(5u64));
        assert_eq!(pubdata[2], Fr::from(99u64));
        assert_eq!(pubdata[3], Fr::from(1u64));
        assert_eq!(pubdata[4], Fr::from(0u64));
    }

    #[test]
    fn test_reader_inverts_layout() {
        let pubdata = pack_pubdata(&layout(123_456, 42, 7));
        let mut reader = PubdataReader::new(&pubdata);
        assert_eq!(reader.read_u64(8), 6);
        assert_eq!(reader.read_u64(200), 123_456);
        assert_eq!(reader.read_u64(64), 42);
        assert_eq!(reader.read_element(), Fr::from(7u64));
        assert_eq!(reader.read_u64(8), 1);
    }

    #[test]
    fn test_gadget_matches_native() {
        let native = pack_pubdata(&layout(3, 5, 99));

        let cs = ConstraintSystem::<Fr>::new_ref();
        let active = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let vars: Vec<PubdataField<FpVar<Fr>>> = layout(3, 5, 99)
            .into_iter()
            .map(|f| match f {
                PubdataField::Bits(v, w) => {
                    PubdataField::Bits(FpVar::new_witness(cs.clone(), || Ok(v)).unwrap(), w)
                }
                PubdataField::Element(v) => {
                    PubdataField::Element(FpVar::new_witness(cs.clone(), || Ok(v)).unwrap())
                }
            })
            .collect();
        let packed = pack_pubdata_var(&active, &vars).unwrap();
        for (var, expected) in packed.iter().zip(&native) {
            var.enforce_equal(&FpVar::constant(*expected)).unwrap();
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_oversized_field_unsatisfied() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let active = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let value = FpVar::new_witness(cs.clone(), || Ok(Fr::from(256u64))).unwrap();
        pack_pubdata_var(&active, &[PubdataField::Bits(value, 8)]).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
