//! Signature pipeline.
//!
//! Each transaction type encodes its hash fields as an EIP-712 struct, hashes
//! it (struct hash) and hashes again behind the `0x1901` prefix and domain
//! separator (signed digest). Keccak and secp256k1 recovery are not
//! arithmetized: they run out of circuit as a hint, and the circuit only binds
//! the hint's outputs to values it computes itself (see
//! [`SignatureHintVar::bind`]).

mod eip712;
mod gadgets;
mod hint;
mod oracle;


pub use eip712::{digest_to_fr, keccak256, type_string, SigningDomain, OFFER_TYPE};
pub use gadgets::{OfferHintVar, SignatureHintVar};
pub use hint::{OfferHint, SignatureHint, SignatureRequest, NUM_CANDIDATES};
pub use oracle::{public_key_of, sign_digest, EcdsaOracle, SignatureOracle};
