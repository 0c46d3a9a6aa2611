#![warn(clippy::unwrap_used)]

pub mod attestation_data;
pub mod checkpoint;
pub mod constants;
pub mod fork;
pub mod fork_data;
pub mod misc;
pub mod signing_data;
