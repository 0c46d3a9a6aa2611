pub mod electra;
pub mod errors;
pub mod phase0;
pub mod read_only_attestation;
pub mod versioned_attestation;
