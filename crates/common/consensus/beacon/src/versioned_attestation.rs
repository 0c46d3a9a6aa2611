use alloy_primitives::B256;
use ream_bls::BLSSignature;
use ream_consensus_misc::{attestation_data::AttestationData, misc::get_committee_indices};
use serde::{Deserialize, Serialize};
use ssz_types::{
    BitList, BitVector,
    typenum::{U64, Unsigned},
};
use tree_hash::TreeHash;

use crate::{electra, errors::AttestationError, phase0};

/// An attestation in whichever layout its fork uses.
///
/// The two layouts disagree on where the committee index lives, which is resolved by
/// [`VersionedAttestation::committee_index`].
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionedAttestation {
    Electra(electra::attestation::Attestation),
    Phase0(phase0::attestation::Attestation),
}

impl VersionedAttestation {
    pub fn is_electra(&self) -> bool {
        matches!(self, VersionedAttestation::Electra(_))
    }

    pub fn data(&self) -> &AttestationData {
        match self {
            VersionedAttestation::Electra(attestation) => &attestation.data,
            VersionedAttestation::Phase0(attestation) => &attestation.data,
        }
    }

    pub fn signature(&self) -> &BLSSignature {
        match self {
            VersionedAttestation::Electra(attestation) => &attestation.signature,
            VersionedAttestation::Phase0(attestation) => &attestation.signature,
        }
    }

    pub fn committee_bits(&self) -> Option<&BitVector<U64>> {
        match self {
            VersionedAttestation::Electra(attestation) => Some(&attestation.committee_bits),
            VersionedAttestation::Phase0(_) => None,
        }
    }

    /// Logical length of the aggregation bit-list, excluding the SSZ length sentinel.
    pub fn aggregation_bits_len(&self) -> usize {
        match self {
            VersionedAttestation::Electra(attestation) => attestation.aggregation_bits.len(),
            VersionedAttestation::Phase0(attestation) => attestation.aggregation_bits.len(),
        }
    }

    /// Indices of the set aggregation bits in ascending order.
    pub fn aggregation_bit_indices(&self) -> Vec<usize> {
        match self {
            VersionedAttestation::Electra(attestation) => {
                set_bit_indices(&attestation.aggregation_bits)
            }
            VersionedAttestation::Phase0(attestation) => {
                set_bit_indices(&attestation.aggregation_bits)
            }
        }
    }

    /// The committee this attestation votes for. Before Electra this is `data.index`; from Electra
    /// on it is the lowest set bit of `committee_bits`.
    pub fn committee_index(&self) -> Result<u64, AttestationError> {
        match self {
            VersionedAttestation::Electra(attestation) => {
                get_committee_indices(&attestation.committee_bits)
                    .into_iter()
                    .next()
                    .ok_or(AttestationError::MalformedCommitteeBits)
            }
            VersionedAttestation::Phase0(attestation) => Ok(attestation.data.index),
        }
    }

    pub fn tree_hash_root(&self) -> B256 {
        match self {
            VersionedAttestation::Electra(attestation) => attestation.tree_hash_root(),
            VersionedAttestation::Phase0(attestation) => attestation.tree_hash_root(),
        }
    }
}

impl From<electra::attestation::Attestation> for VersionedAttestation {
    fn from(attestation: electra::attestation::Attestation) -> Self {
        VersionedAttestation::Electra(attestation)
    }
}

impl From<phase0::attestation::Attestation> for VersionedAttestation {
    fn from(attestation: phase0::attestation::Attestation) -> Self {
        VersionedAttestation::Phase0(attestation)
    }
}

fn set_bit_indices<N: Unsigned + Clone>(bits: &BitList<N>) -> Vec<usize> {
    bits.iter()
        .enumerate()
        .filter_map(|(index, bit)| bit.then_some(index))
        .collect()
}
