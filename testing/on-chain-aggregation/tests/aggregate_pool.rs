use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use ream_bls::{
    BLSSignature, PrivateKey, PublicKey,
    traits::{Aggregatable, Signable},
};
use ream_consensus_beacon::{
    electra::attestation::Attestation, read_only_attestation::ReadOnlyAttestation,
    versioned_attestation::VersionedAttestation,
};
use ream_consensus_misc::{
    attestation_data::AttestationData, checkpoint::Checkpoint, fork::ForkName,
    misc::get_committee_indices,
};
use ream_network_spec::networks::initialize_test_network_spec;
use ream_operation_pool::OperationPool;
use ream_validator_beacon::attestation::{sign_attestation_data, verify_on_chain_aggregate};
use rstest::rstest;
use ssz::Encode;
use ssz_types::{
    BitList, BitVector,
    typenum::{U64, U131072},
};

struct Committee {
    private_keys: Vec<PrivateKey>,
}

impl Committee {
    fn new(first_seed: u8, size: u8) -> Self {
        Self {
            private_keys: (first_seed..first_seed + size)
                .map(|seed| PrivateKey {
                    inner: B256::with_last_byte(seed),
                })
                .collect(),
        }
    }

    fn public_keys(&self) -> anyhow::Result<Vec<PublicKey>> {
        self.private_keys
            .iter()
            .map(|private_key| private_key.public_key().map_err(anyhow::Error::from))
            .collect()
    }

    /// The network aggregate an aggregator of this committee would gossip after collecting the
    /// votes of `signers`.
    fn network_aggregate(
        &self,
        committee_index: usize,
        data: &AttestationData,
        signers: &[usize],
    ) -> anyhow::Result<VersionedAttestation> {
        let mut aggregation_bits = BitList::<U131072>::with_capacity(self.private_keys.len())
            .map_err(|err| anyhow!("Failed to create aggregation bits: {err:?}"))?;
        let mut signatures = vec![];
        for &signer in signers {
            aggregation_bits
                .set(signer, true)
                .map_err(|err| anyhow!("Failed to set bit {signer}: {err:?}"))?;
            signatures.push(sign_attestation_data(
                data,
                &self.private_keys[signer],
                ForkName::Electra,
            )?);
        }
        let mut committee_bits = BitVector::<U64>::new();
        committee_bits
            .set(committee_index, true)
            .map_err(|err| anyhow!("Failed to set committee bit: {err:?}"))?;

        Ok(Attestation {
            aggregation_bits,
            data: data.clone(),
            signature: BLSSignature::aggregate(&signatures.iter().collect::<Vec<_>>())?,
            committee_bits,
        }
        .into())
    }
}

fn attestation_data(beacon_block_root: B256) -> AttestationData {
    AttestationData {
        slot: 320,
        index: 0,
        beacon_block_root,
        source: Checkpoint {
            epoch: 9,
            root: B256::repeat_byte(0x09),
        },
        target: Checkpoint {
            epoch: 10,
            root: B256::repeat_byte(0x0a),
        },
    }
}

/// Committees of growing size with consecutive key seeds.
fn committees(count: u8) -> Vec<Committee> {
    let mut next_seed = 1;
    (0..count)
        .map(|committee_index| {
            let size = 3 + committee_index;
            let committee = Committee::new(next_seed, size);
            next_seed += size;
            committee
        })
        .collect()
}

fn committee_public_keys(committees: &[Committee]) -> anyhow::Result<Vec<Vec<PublicKey>>> {
    committees.iter().map(Committee::public_keys).collect()
}

fn find_aggregate<'a>(
    on_chain_aggregates: &'a [ReadOnlyAttestation],
    data: &AttestationData,
) -> anyhow::Result<&'a ReadOnlyAttestation> {
    on_chain_aggregates
        .iter()
        .find(|aggregate| aggregate.data() == data)
        .ok_or_else(|| anyhow!("No on-chain aggregate for {:?}", data.beacon_block_root))
}

#[rstest]
#[case::single_committee(1)]
#[case::three_committees(3)]
#[case::eight_committees(8)]
fn test_pool_builds_verifiable_on_chain_aggregates(
    #[case] committee_count: u8,
) -> anyhow::Result<()> {
    initialize_test_network_spec();
    let operation_pool = OperationPool::default();
    let committees = committees(committee_count);
    let head = attestation_data(B256::repeat_byte(0x11));
    let fork = attestation_data(B256::repeat_byte(0x22));

    let mut expected_bits = vec![];
    let mut offset = 0;
    for (committee_index, committee) in committees.iter().enumerate() {
        let signers = (0..committee.private_keys.len())
            .step_by(2)
            .collect::<Vec<_>>();
        expected_bits.extend(signers.iter().map(|signer| offset + signer));
        offset += committee.private_keys.len();
        operation_pool.insert_attestation(committee.network_aggregate(
            committee_index,
            &head,
            &signers,
        )?)?;
    }
    operation_pool.insert_attestation(committees[0].network_aggregate(0, &fork, &[1])?)?;

    let on_chain_aggregates = operation_pool.get_on_chain_aggregates()?;
    ensure!(on_chain_aggregates.len() == 2, "Expected one aggregate per vote");

    let public_keys = committee_public_keys(&committees)?;
    let head_aggregate = find_aggregate(&on_chain_aggregates, &head)?;
    assert_eq!(head_aggregate.aggregation_bits_len(), offset);
    assert_eq!(head_aggregate.aggregation_bit_indices(), expected_bits);
    assert_eq!(
        get_committee_indices(
            head_aggregate
                .committee_bits()
                .ok_or_else(|| anyhow!("Missing committee bits"))?
        ),
        (0..committee_count as u64).collect::<Vec<_>>()
    );
    assert!(verify_on_chain_aggregate(head_aggregate, &public_keys)?);

    let fork_aggregate = find_aggregate(&on_chain_aggregates, &fork)?;
    assert_eq!(fork_aggregate.aggregation_bit_indices(), vec![1]);
    assert!(verify_on_chain_aggregate(fork_aggregate, &public_keys)?);

    Ok(())
}

#[test]
fn test_wrong_vote_fails_verification() -> anyhow::Result<()> {
    initialize_test_network_spec();
    let operation_pool = OperationPool::default();
    let committees = committees(2);
    let head = attestation_data(B256::repeat_byte(0x33));
    let other = attestation_data(B256::repeat_byte(0x44));

    operation_pool.insert_attestation(committees[0].network_aggregate(0, &head, &[0, 1])?)?;
    let mut forged = committees[1].network_aggregate(1, &head, &[2])?;
    if let VersionedAttestation::Electra(attestation) = &mut forged {
        attestation.signature = sign_attestation_data(
            &other,
            &committees[1].private_keys[2],
            ForkName::Electra,
        )?;
    }
    operation_pool.insert_attestation(forged)?;

    let on_chain_aggregates = operation_pool.get_on_chain_aggregates()?;
    ensure!(on_chain_aggregates.len() == 1, "Expected a single aggregate");
    assert!(!verify_on_chain_aggregate(
        &on_chain_aggregates[0],
        &committee_public_keys(&committees)?
    )?);

    Ok(())
}

#[test]
fn test_on_chain_aggregate_survives_encoding() -> anyhow::Result<()> {
    initialize_test_network_spec();
    let operation_pool = OperationPool::default();
    let committees = committees(3);
    let head = attestation_data(B256::repeat_byte(0x55));
    for (committee_index, committee) in committees.iter().enumerate().rev() {
        operation_pool.insert_attestation(committee.network_aggregate(
            committee_index,
            &head,
            &[committee_index],
        )?)?;
    }

    let on_chain_aggregates = operation_pool.get_on_chain_aggregates()?;
    let on_chain_aggregate = find_aggregate(&on_chain_aggregates, &head)?;
    let VersionedAttestation::Electra(attestation) = on_chain_aggregate.attestation() else {
        return Err(anyhow!("On-chain aggregate must use the Electra layout"));
    };

    let decoded =
        ReadOnlyAttestation::from_ssz_bytes(ForkName::Electra, &attestation.as_ssz_bytes())?;
    assert_eq!(&decoded, on_chain_aggregate);
    assert_eq!(decoded.id(), on_chain_aggregate.id());

    let json = serde_json::to_string(on_chain_aggregate.attestation())?;
    let from_json = ReadOnlyAttestation::new(
        ForkName::Electra,
        serde_json::from_str::<VersionedAttestation>(&json)?,
    )?;
    assert_eq!(&from_json, on_chain_aggregate);
    assert!(verify_on_chain_aggregate(
        &from_json,
        &committee_public_keys(&committees)?
    )?);

    Ok(())
}

#[test]
fn test_pruned_votes_are_not_aggregated() -> anyhow::Result<()> {
    initialize_test_network_spec();
    let operation_pool = OperationPool::default();
    let committees = committees(2);
    let head = attestation_data(B256::repeat_byte(0x66));
    for (committee_index, committee) in committees.iter().enumerate() {
        operation_pool.insert_attestation(committee.network_aggregate(
            committee_index,
            &head,
            &[0],
        )?)?;
    }

    operation_pool.prune_attestations(head.target.epoch);
    assert_eq!(operation_pool.get_on_chain_aggregates()?.len(), 1);

    operation_pool.prune_attestations(head.target.epoch + 1);
    assert_eq!(operation_pool.attestation_count(), 0);
    assert!(operation_pool.get_on_chain_aggregates()?.is_empty());

    Ok(())
}

#[test]
fn test_several_aggregators_per_committee_still_verify() -> anyhow::Result<()> {
    initialize_test_network_spec();
    let operation_pool = OperationPool::default();
    let committees = committees(2);
    let head = attestation_data(B256::repeat_byte(0x77));

    operation_pool.insert_attestation(committees[0].network_aggregate(0, &head, &[0])?)?;
    operation_pool.insert_attestation(committees[0].network_aggregate(0, &head, &[1, 2])?)?;
    operation_pool.insert_attestation(committees[0].network_aggregate(0, &head, &[2])?)?;
    operation_pool.insert_attestation(committees[1].network_aggregate(1, &head, &[3])?)?;

    let on_chain_aggregates = operation_pool.get_on_chain_aggregates()?;
    ensure!(on_chain_aggregates.len() == 1, "Expected a single aggregate");
    let on_chain_aggregate = &on_chain_aggregates[0];
    assert_eq!(on_chain_aggregate.aggregation_bits_len(), 7);
    assert_eq!(on_chain_aggregate.aggregation_bit_indices(), vec![0, 1, 2, 6]);
    assert!(verify_on_chain_aggregate(
        on_chain_aggregate,
        &committee_public_keys(&committees)?
    )?);

    Ok(())
}
