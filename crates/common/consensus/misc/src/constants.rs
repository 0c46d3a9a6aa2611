use alloy_primitives::{aliases::B32, fixed_bytes};

pub const SLOTS_PER_EPOCH: u64 = 32;

pub const MAX_COMMITTEES_PER_SLOT: u64 = 64;
pub const MAX_VALIDATORS_PER_COMMITTEE: u64 = 2048;

pub const DOMAIN_BEACON_ATTESTER: B32 = fixed_bytes!("0x01000000");

pub const GENESIS_FORK_VERSION: B32 = fixed_bytes!("0x00000000");
