#[cfg(all(not(feature = "zkcrypto"), not(feature = "supranational")))]
compile_error!("ream-bls requires either the `zkcrypto` or the `supranational` feature");

pub mod constants;
pub mod errors;
pub mod private_key;
pub mod public_key;
pub mod signature;
#[cfg(feature = "supranational")]
pub mod supranational;
pub mod traits;
#[cfg(all(feature = "zkcrypto", not(feature = "supranational")))]
pub mod zkcrypto;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::BLSSignature;
