//! Post-hoc verification of flow results

pub mod correctness;

pub use self::correctness::{verify, InvariantViolation, VerificationReport};
