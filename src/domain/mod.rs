//! Domain layer types and invariants.

pub mod capabilities;
pub mod types;
