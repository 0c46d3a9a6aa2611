pub mod attestation;
pub mod errors;
pub mod on_chain_aggregate;
