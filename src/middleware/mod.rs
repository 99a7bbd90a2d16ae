pub mod access;

pub use access::{access_gate, decide, AccessDecision};
