use ream_bls::errors::BLSError;
use ream_consensus_beacon::errors::AttestationError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Cannot compute an on-chain aggregate from an empty list")]
    EmptyAggregates,
    #[error(transparent)]
    Attestation(#[from] AttestationError),
    #[error("Failed to aggregate signatures: {0}")]
    SignatureParse(#[from] BLSError),
    #[error("Failed to build aggregation bits: {0}")]
    AggregationBits(String),
}
