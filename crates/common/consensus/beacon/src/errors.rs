use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum AttestationError {
    #[error("Invalid attestation: {0}")]
    InvalidAttestation(String),
    #[error("Attestation has no committee bit set")]
    MalformedCommitteeBits,
}
