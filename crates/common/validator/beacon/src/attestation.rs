use std::collections::HashSet;

use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use ream_bls::{
    BLSSignature, PrivateKey, PublicKey,
    errors::BLSError,
    traits::{Aggregatable, Signable, Verifiable},
};
use ream_consensus_beacon::read_only_attestation::ReadOnlyAttestation;
use ream_consensus_misc::{
    attestation_data::AttestationData,
    constants::DOMAIN_BEACON_ATTESTER,
    fork::ForkName,
    misc::{compute_domain, compute_signing_root, get_committee_indices},
};
use ream_network_spec::networks::beacon_network_spec;

/// Signing root of `attestation_data` under the beacon attester domain of `fork`.
pub fn attestation_signing_root(attestation_data: &AttestationData, fork: ForkName) -> B256 {
    let domain = compute_domain(
        DOMAIN_BEACON_ATTESTER,
        Some(beacon_network_spec().fork_version(fork)),
        None,
    );
    compute_signing_root(attestation_data, domain)
}

pub fn sign_attestation_data(
    attestation_data: &AttestationData,
    private_key: &PrivateKey,
    fork: ForkName,
) -> anyhow::Result<BLSSignature> {
    let signing_root = attestation_signing_root(attestation_data, fork);
    Ok(private_key.sign(signing_root.as_ref())?)
}

pub fn get_aggregate_signature(
    attestations: &[ReadOnlyAttestation],
) -> Result<BLSSignature, BLSError> {
    let signatures: Vec<&BLSSignature> = attestations
        .iter()
        .map(|attestation| attestation.signature())
        .collect();
    BLSSignature::aggregate(&signatures)
}

/// Checks the signature of an on-chain aggregate against the validators its bits select.
///
/// `committees` holds the public keys of every committee of the slot, indexed by committee index.
/// Participants are resolved the same way blocks resolve them: committees named by
/// `committee_bits` are walked in ascending order and each one's members occupy the next
/// `committee.len()` aggregation bits.
pub fn verify_on_chain_aggregate(
    on_chain_aggregate: &ReadOnlyAttestation,
    committees: &[Vec<PublicKey>],
) -> anyhow::Result<bool> {
    let committee_bits = on_chain_aggregate
        .committee_bits()
        .ok_or_else(|| anyhow!("On-chain aggregates must carry committee bits"))?;
    let set_bits: HashSet<usize> = on_chain_aggregate
        .aggregation_bit_indices()
        .into_iter()
        .collect();

    let mut participants = vec![];
    let mut committee_offset = 0;
    for committee_index in get_committee_indices(committee_bits) {
        let committee = committees
            .get(committee_index as usize)
            .ok_or_else(|| anyhow!("No committee with index {committee_index}"))?;
        participants.extend(
            committee
                .iter()
                .enumerate()
                .filter(|(position, _)| set_bits.contains(&(committee_offset + position)))
                .map(|(_, public_key)| public_key),
        );
        committee_offset += committee.len();
    }

    ensure!(
        committee_offset == on_chain_aggregate.aggregation_bits_len(),
        "Aggregation bits length {} does not match committee sizes {committee_offset}",
        on_chain_aggregate.aggregation_bits_len()
    );

    let signing_root =
        attestation_signing_root(on_chain_aggregate.data(), on_chain_aggregate.fork());
    Ok(on_chain_aggregate
        .signature()
        .fast_aggregate_verify(participants, signing_root.as_ref())?)
}
