//! Poseidon over BN254, the hash instance behind every tree, leaf, transaction
//! hash and block commitment.
//!
//! Native functions and R1CS gadgets share one parameter table so that a
//! witness computed outside the circuit always matches the constraints.

mod config;
mod gadgets;
mod native;


pub use config::poseidon_config;
pub use gadgets::{poseidon_hash_many_var, poseidon_hash_two_var};
pub use native::{poseidon_hash_many, poseidon_hash_two};
