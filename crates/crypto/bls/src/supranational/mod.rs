pub mod private_key;
pub mod public_key;
pub mod signature;
