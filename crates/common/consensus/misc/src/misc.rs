use alloy_primitives::{B256, aliases::B32};
use ssz_types::{BitVector, typenum::U64};
use tree_hash::TreeHash;

use crate::{
    constants::{GENESIS_FORK_VERSION, SLOTS_PER_EPOCH},
    fork_data::ForkData,
    signing_data::SigningData,
};

pub fn compute_signing_root<SSZObject: TreeHash>(ssz_object: SSZObject, domain: B256) -> B256 {
    SigningData {
        object_root: ssz_object.tree_hash_root(),
        domain,
    }
    .tree_hash_root()
}

/// Return the domain for the ``domain_type`` and ``fork_version``
pub fn compute_domain(
    domain_type: B32,
    fork_version: Option<B32>,
    genesis_validators_root: Option<B256>,
) -> B256 {
    let fork_data = ForkData {
        current_version: fork_version.unwrap_or(GENESIS_FORK_VERSION),
        genesis_validators_root: genesis_validators_root.unwrap_or_default(),
    };
    let fork_data_root = fork_data.compute_fork_data_root();
    let domain_bytes = [domain_type.as_slice(), &fork_data_root[..28]].concat();
    B256::from_slice(&domain_bytes)
}

/// Return the epoch number at ``slot``.
pub fn compute_epoch_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// Return the set bit indices of ``committee_bits`` in ascending order.
pub fn get_committee_indices(committee_bits: &BitVector<U64>) -> Vec<u64> {
    committee_bits
        .iter()
        .enumerate()
        .filter_map(|(index, bit)| bit.then_some(index as u64))
        .collect()
}
