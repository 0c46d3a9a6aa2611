use std::fmt;

use alloy_primitives::B256;
use ream_bls::BLSSignature;
use ream_consensus_misc::{attestation_data::AttestationData, fork::ForkName};
use ssz::Decode;
use ssz_types::{BitVector, typenum::U64};
use tree_hash::TreeHash;

use crate::{
    electra, errors::AttestationError, phase0, versioned_attestation::VersionedAttestation,
};

/// Key used to bucket attestations.
///
/// `digest` is either the root of the whole attestation or the root of its `AttestationData`,
/// depending on whether it was taken from [`ReadOnlyAttestation::id`] or
/// [`ReadOnlyAttestation::data_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AttestationId {
    fork: ForkName,
    committee_index: u64,
    digest: B256,
}

impl AttestationId {
    pub fn new(fork: ForkName, committee_index: u64, digest: B256) -> Self {
        Self {
            fork,
            committee_index,
            digest,
        }
    }

    /// Returns a copy with the committee index zeroed, so that votes for the same data from
    /// different committees share a key.
    pub fn without_committee(&self) -> Self {
        Self {
            committee_index: 0,
            ..*self
        }
    }

    pub fn fork(&self) -> ForkName {
        self.fork
    }

    pub fn committee_index(&self) -> u64 {
        self.committee_index
    }

    pub fn digest(&self) -> B256 {
        self.digest
    }
}

impl fmt::Display for AttestationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.fork, self.committee_index, self.digest)
    }
}

/// A validated attestation together with its identity keys.
///
/// Both keys are computed once in [`ReadOnlyAttestation::new`]; cloning carries them over without
/// rehashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyAttestation {
    fork: ForkName,
    attestation: VersionedAttestation,
    committee_index: u64,
    id: AttestationId,
    data_id: AttestationId,
}

impl ReadOnlyAttestation {
    pub fn new(
        fork: ForkName,
        attestation: VersionedAttestation,
    ) -> Result<Self, AttestationError> {
        validate_attestation(fork, &attestation)?;

        let committee_index = attestation.committee_index()?;
        let id = AttestationId::new(fork, committee_index, attestation.tree_hash_root());
        let data_id =
            AttestationId::new(fork, committee_index, attestation.data().tree_hash_root());

        Ok(Self {
            fork,
            attestation,
            committee_index,
            id,
            data_id,
        })
    }

    /// Decodes `bytes` using the attestation layout of `fork`.
    pub fn from_ssz_bytes(fork: ForkName, bytes: &[u8]) -> Result<Self, AttestationError> {
        let attestation = if fork.is_electra_or_later() {
            electra::attestation::Attestation::from_ssz_bytes(bytes)
                .map(VersionedAttestation::from)
        } else {
            phase0::attestation::Attestation::from_ssz_bytes(bytes)
                .map(VersionedAttestation::from)
        }
        .map_err(|err| {
            AttestationError::InvalidAttestation(format!(
                "Failed to decode {fork} attestation: {err:?}"
            ))
        })?;

        Self::new(fork, attestation)
    }

    pub fn id(&self) -> AttestationId {
        self.id
    }

    pub fn data_id(&self) -> AttestationId {
        self.data_id
    }

    pub fn fork(&self) -> ForkName {
        self.fork
    }

    pub fn committee_index(&self) -> u64 {
        self.committee_index
    }

    pub fn data(&self) -> &AttestationData {
        self.attestation.data()
    }

    pub fn signature(&self) -> &BLSSignature {
        self.attestation.signature()
    }

    pub fn committee_bits(&self) -> Option<&BitVector<U64>> {
        self.attestation.committee_bits()
    }

    pub fn aggregation_bits_len(&self) -> usize {
        self.attestation.aggregation_bits_len()
    }

    pub fn aggregation_bit_indices(&self) -> Vec<usize> {
        self.attestation.aggregation_bit_indices()
    }

    pub fn attestation(&self) -> &VersionedAttestation {
        &self.attestation
    }
}

fn validate_attestation(
    fork: ForkName,
    attestation: &VersionedAttestation,
) -> Result<(), AttestationError> {
    if fork.is_electra_or_later() != attestation.is_electra() {
        return Err(AttestationError::InvalidAttestation(format!(
            "Attestation layout does not match fork {fork}"
        )));
    }

    if attestation.aggregation_bits_len() == 0 {
        return Err(AttestationError::InvalidAttestation(
            "Aggregation bits are empty".to_string(),
        ));
    }

    if attestation.is_electra() && attestation.data().index != 0 {
        return Err(AttestationError::InvalidAttestation(format!(
            "Attestation data index must be 0 from Electra on, got {}",
            attestation.data().index
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ream_consensus_misc::checkpoint::Checkpoint;
    use rstest::rstest;
    use ssz::Encode;
    use ssz_types::{
        BitList,
        typenum::{U2048, U131072},
    };

    use super::*;

    fn attestation_data(index: u64, beacon_block_root: B256) -> AttestationData {
        AttestationData {
            slot: 4_000_000,
            index,
            beacon_block_root,
            source: Checkpoint {
                epoch: 124_998,
                root: B256::repeat_byte(0x11),
            },
            target: Checkpoint {
                epoch: 124_999,
                root: B256::repeat_byte(0x22),
            },
        }
    }

    fn electra_attestation(
        committee_index: usize,
        bits_len: usize,
        set_bits: &[usize],
        signature: BLSSignature,
    ) -> electra::attestation::Attestation {
        let mut aggregation_bits = BitList::<U131072>::with_capacity(bits_len).unwrap();
        for &bit in set_bits {
            aggregation_bits.set(bit, true).unwrap();
        }
        let mut committee_bits = BitVector::<U64>::new();
        committee_bits.set(committee_index, true).unwrap();

        electra::attestation::Attestation {
            aggregation_bits,
            data: attestation_data(0, B256::repeat_byte(0xab)),
            signature,
            committee_bits,
        }
    }

    fn phase0_attestation(committee_index: u64) -> phase0::attestation::Attestation {
        let mut aggregation_bits = BitList::<U2048>::with_capacity(16).unwrap();
        aggregation_bits.set(3, true).unwrap();

        phase0::attestation::Attestation {
            aggregation_bits,
            data: attestation_data(committee_index, B256::repeat_byte(0xab)),
            signature: BLSSignature::infinity(),
        }
    }

    #[test]
    fn test_electra_identity_keys() {
        let attestation = electra_attestation(5, 8, &[2], BLSSignature::infinity());
        let read_only =
            ReadOnlyAttestation::new(ForkName::Electra, attestation.clone().into()).unwrap();

        assert_eq!(read_only.committee_index(), 5);
        assert_eq!(
            read_only.id(),
            AttestationId::new(ForkName::Electra, 5, attestation.tree_hash_root())
        );
        assert_eq!(
            read_only.data_id(),
            AttestationId::new(ForkName::Electra, 5, attestation.data.tree_hash_root())
        );
        assert_eq!(read_only.aggregation_bits_len(), 8);
        assert_eq!(read_only.aggregation_bit_indices(), vec![2]);
    }

    #[rstest]
    #[case::phase0(ForkName::Phase0)]
    #[case::altair(ForkName::Altair)]
    #[case::deneb(ForkName::Deneb)]
    fn test_pre_electra_committee_index_from_data(#[case] fork: ForkName) {
        let read_only = ReadOnlyAttestation::new(fork, phase0_attestation(17).into()).unwrap();

        assert_eq!(read_only.committee_index(), 17);
        assert_eq!(read_only.id().fork(), fork);
        assert_eq!(read_only.committee_bits(), None);
    }

    #[test]
    fn test_id_distinguishes_content_but_data_id_does_not() {
        let first = ReadOnlyAttestation::new(
            ForkName::Electra,
            electra_attestation(1, 8, &[0], BLSSignature::infinity()).into(),
        )
        .unwrap();
        let second = ReadOnlyAttestation::new(
            ForkName::Electra,
            electra_attestation(1, 8, &[0, 4], BLSSignature::infinity()).into(),
        )
        .unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(first.data_id(), second.data_id());
    }

    #[test]
    fn test_without_committee_merges_committees() {
        let first = ReadOnlyAttestation::new(
            ForkName::Electra,
            electra_attestation(0, 4, &[1], BLSSignature::infinity()).into(),
        )
        .unwrap();
        let second = ReadOnlyAttestation::new(
            ForkName::Electra,
            electra_attestation(1, 4, &[2], BLSSignature::infinity()).into(),
        )
        .unwrap();

        assert_ne!(first.data_id(), second.data_id());
        assert_eq!(
            first.data_id().without_committee(),
            second.data_id().without_committee()
        );
        assert_eq!(first.data_id().without_committee().committee_index(), 0);
        assert_eq!(
            first.data_id().without_committee().digest(),
            first.data_id().digest()
        );
    }

    #[test]
    fn test_construction_is_idempotent_and_clone_keeps_keys() {
        let attestation = electra_attestation(3, 8, &[1, 6], BLSSignature::infinity());
        let first =
            ReadOnlyAttestation::new(ForkName::Electra, attestation.clone().into()).unwrap();
        let second = ReadOnlyAttestation::new(ForkName::Electra, attestation.into()).unwrap();
        let copy = first.clone();

        assert_eq!(first.id(), second.id());
        assert_eq!(first.data_id(), second.data_id());
        assert_eq!(copy.id(), first.id());
        assert_eq!(copy.data_id(), first.data_id());
    }

    #[test]
    fn test_empty_committee_bits_are_malformed() {
        let mut attestation = electra_attestation(0, 8, &[1], BLSSignature::infinity());
        attestation.committee_bits = BitVector::new();

        assert_eq!(
            ReadOnlyAttestation::new(ForkName::Electra, attestation.into()),
            Err(AttestationError::MalformedCommitteeBits)
        );
    }

    #[test]
    fn test_layout_must_match_fork() {
        let attestation = electra_attestation(0, 8, &[1], BLSSignature::infinity());
        assert!(matches!(
            ReadOnlyAttestation::new(ForkName::Deneb, attestation.into()),
            Err(AttestationError::InvalidAttestation(_))
        ));
        assert!(matches!(
            ReadOnlyAttestation::new(ForkName::Electra, phase0_attestation(0).into()),
            Err(AttestationError::InvalidAttestation(_))
        ));
    }

    #[test]
    fn test_empty_aggregation_bits_are_invalid() {
        let attestation = electra_attestation(0, 0, &[], BLSSignature::infinity());

        assert_eq!(
            ReadOnlyAttestation::new(ForkName::Electra, attestation.into()),
            Err(AttestationError::InvalidAttestation(
                "Aggregation bits are empty".to_string()
            ))
        );
    }

    #[test]
    fn test_electra_data_index_must_be_zero() {
        let mut attestation = electra_attestation(2, 8, &[1], BLSSignature::infinity());
        attestation.data.index = 2;

        assert!(matches!(
            ReadOnlyAttestation::new(ForkName::Electra, attestation.into()),
            Err(AttestationError::InvalidAttestation(_))
        ));
    }

    #[test]
    fn test_from_ssz_bytes() {
        let attestation = electra_attestation(7, 12, &[0, 11], BLSSignature::infinity());
        let bytes = attestation.as_ssz_bytes();

        let decoded = ReadOnlyAttestation::from_ssz_bytes(ForkName::Electra, &bytes).unwrap();
        assert_eq!(
            decoded,
            ReadOnlyAttestation::new(ForkName::Electra, attestation.into()).unwrap()
        );

        assert!(matches!(
            ReadOnlyAttestation::from_ssz_bytes(ForkName::Electra, &bytes[..10]),
            Err(AttestationError::InvalidAttestation(_))
        ));
    }

    #[test]
    fn test_attestation_id_display() {
        let id = AttestationId::new(ForkName::Electra, 4, B256::ZERO);
        assert_eq!(id.to_string(), format!("electra:4:{}", B256::ZERO));
        assert_eq!(AttestationId::default().committee_index(), 0);
    }
}
