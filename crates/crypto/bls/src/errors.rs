use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum BLSError {
    #[error("Invalid byte length")]
    InvalidByteLength,
    #[error("Invalid hex string")]
    InvalidHexString,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Cannot aggregate an empty list")]
    EmptyAggregation,
    #[cfg(feature = "supranational")]
    #[error("blst error: {0:?}")]
    BlstError(blst::BLST_ERROR),
}
