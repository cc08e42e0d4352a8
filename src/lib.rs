//! A known-plaintext (crib) attack engine against three-rotor
//! Enigma-family ciphers.
//!
//! Given a crib, a ciphertext, a pool of rotor types, and a reflector,
//! [`search::BombeSearch`] enumerates rotor orderings, starting
//! positions, and crib offsets, deriving a plugboard hypothesis for
//! each candidate via [`deducer::PlugboardDeducer`] and ranking the
//! survivors.

pub mod deducer;
pub mod diagonal;
pub mod error;
pub mod machine;
pub mod plugboard;
pub mod rotor;
pub mod search;

pub use deducer::{Deduction, PlugboardDeducer};
pub use diagonal::{DiagonalBoard, Wiring};
pub use error::{EnigmaError, EnigmaResult};
pub use machine::EnigmaMachine;
pub use plugboard::Plugboard;
pub use rotor::{Reflector, ReflectorSpec, Rotor, RotorSpec};
pub use search::{AttackConfig, BombeSearch, CandidateResult, LoadPolicy};
