use std::{cmp::Reverse, collections::HashMap};

use ream_consensus_beacon::{
    electra::attestation::Attestation,
    errors::AttestationError,
    read_only_attestation::{AttestationId, ReadOnlyAttestation},
};
use ream_consensus_misc::constants::{MAX_COMMITTEES_PER_SLOT, MAX_VALIDATORS_PER_COMMITTEE};
use rayon::prelude::*;
use ssz_types::{
    BitList, BitVector,
    typenum::{U64, U131072},
};
use tracing::{debug, trace};

use crate::{attestation::get_aggregate_signature, errors::AggregationError};

/// Folds the network aggregates of a single committee into one aggregate.
///
/// Aggregates are visited from the most to the least participation, and one is merged only when
/// none of its bits are already covered. A BLS signature can't be split, so an overlapping
/// aggregate would count its shared signers twice. Aggregates whose bit-list length differs from
/// the first one's are skipped as well.
pub fn aggregate_committee_attestations(
    mut aggregates: Vec<ReadOnlyAttestation>,
) -> Result<ReadOnlyAttestation, AggregationError> {
    ensure_mergeable(&aggregates, ReadOnlyAttestation::data_id)?;

    aggregates.sort_by_key(|aggregate| Reverse(aggregate.aggregation_bit_indices().len()));
    let mut aggregates = aggregates.into_iter();
    let Some(first) = aggregates.next() else {
        return Err(AggregationError::EmptyAggregates);
    };
    let bits_len = first.aggregation_bits_len();
    let mut aggregation_bit_indices = first.aggregation_bit_indices();
    let mut merged = vec![first];

    for aggregate in aggregates {
        let indices = aggregate.aggregation_bit_indices();
        if aggregate.aggregation_bits_len() != bits_len
            || indices.iter().any(|index| aggregation_bit_indices.contains(index))
        {
            trace!("Skipping overlapping committee aggregate {}", aggregate.id());
            continue;
        }
        aggregation_bit_indices.extend(indices);
        merged.push(aggregate);
    }

    if merged.len() == 1 {
        return Ok(merged.remove(0));
    }

    let committee_aggregate = Attestation {
        aggregation_bits: aggregation_bits(bits_len, aggregation_bit_indices)?,
        data: merged[0].data().clone(),
        signature: get_aggregate_signature(&merged)?,
        committee_bits: committee_bits([merged[0].committee_index()])?,
    };
    Ok(ReadOnlyAttestation::new(
        merged[0].fork(),
        committee_aggregate.into(),
    )?)
}

/// Merges network aggregates that vote for the same data from different committees into one
/// on-chain aggregate.
///
/// Inputs are ordered by committee index and their aggregation bits are laid end to end, each
/// input shifted by the combined length of the bit-lists before it. The committee bits of the
/// result carry one bit per input committee and the signature is the BLS aggregate of all input
/// signatures. Data is taken from the lowest committee's input.
pub fn compute_on_chain_aggregate(
    mut aggregates: Vec<ReadOnlyAttestation>,
) -> Result<ReadOnlyAttestation, AggregationError> {
    ensure_mergeable(&aggregates, |aggregate| {
        aggregate.data_id().without_committee()
    })?;

    aggregates.sort_by_key(|aggregate| aggregate.committee_index());

    let mut aggregation_bit_indices = vec![];
    let mut offset = 0;
    for aggregate in &aggregates {
        aggregation_bit_indices.extend(
            aggregate
                .aggregation_bit_indices()
                .into_iter()
                .map(|index| index + offset),
        );
        offset += aggregate.aggregation_bits_len();
    }

    let max_aggregation_bits = (MAX_VALIDATORS_PER_COMMITTEE * MAX_COMMITTEES_PER_SLOT) as usize;
    if offset > max_aggregation_bits {
        return Err(AggregationError::AggregationBits(format!(
            "{offset} bits exceed the limit of {max_aggregation_bits}"
        )));
    }

    let on_chain_aggregate = Attestation {
        aggregation_bits: aggregation_bits(offset, aggregation_bit_indices)?,
        data: aggregates[0].data().clone(),
        signature: get_aggregate_signature(&aggregates)?,
        committee_bits: committee_bits(
            aggregates.iter().map(|aggregate| aggregate.committee_index()),
        )?,
    };

    trace!(
        "Merged {} network aggregates for {} into {offset} aggregation bits",
        aggregates.len(),
        aggregates[0].data_id().without_committee()
    );

    Ok(ReadOnlyAttestation::new(
        aggregates[0].fork(),
        on_chain_aggregate.into(),
    )?)
}

/// Regroups network aggregates by attestation data, ignoring committee, and builds one on-chain
/// aggregate per group. Groups are processed in parallel and the first failure fails the whole
/// call. The order of the returned aggregates is unspecified.
pub fn compute_on_chain_aggregates(
    aggregates: HashMap<AttestationId, Vec<ReadOnlyAttestation>>,
) -> Result<Vec<ReadOnlyAttestation>, AggregationError> {
    let mut aggregates_by_data: HashMap<AttestationId, Vec<ReadOnlyAttestation>> = HashMap::new();
    for aggregate in aggregates.into_values().flatten() {
        aggregates_by_data
            .entry(aggregate.data_id().without_committee())
            .or_default()
            .push(aggregate);
    }

    let on_chain_aggregates = aggregates_by_data
        .into_par_iter()
        .map(|(_, network_aggregates)| compute_on_chain_aggregate(network_aggregates))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Computed {} on-chain aggregates", on_chain_aggregates.len());
    Ok(on_chain_aggregates)
}

/// Checks that `aggregates` is a non-empty list of Electra attestations sharing one `bucket_key`.
fn ensure_mergeable(
    aggregates: &[ReadOnlyAttestation],
    bucket_key: impl Fn(&ReadOnlyAttestation) -> AttestationId,
) -> Result<(), AggregationError> {
    let first = aggregates.first().ok_or(AggregationError::EmptyAggregates)?;
    let fork = first.fork();
    if !fork.is_electra_or_later() {
        return Err(AttestationError::InvalidAttestation(format!(
            "On-chain aggregates require an Electra attestation, got {fork}"
        ))
        .into());
    }

    let key = bucket_key(first);
    if aggregates.iter().any(|aggregate| bucket_key(aggregate) != key) {
        return Err(AttestationError::InvalidAttestation(
            "Network aggregates must share fork and attestation data".to_string(),
        )
        .into());
    }
    Ok(())
}

fn aggregation_bits(
    len: usize,
    set_indices: impl IntoIterator<Item = usize>,
) -> Result<BitList<U131072>, AggregationError> {
    let mut aggregation_bits = BitList::<U131072>::with_capacity(len).map_err(|err| {
        AggregationError::AggregationBits(format!("{len} bits do not fit: {err:?}"))
    })?;
    for index in set_indices {
        aggregation_bits.set(index, true).map_err(|err| {
            AggregationError::AggregationBits(format!("Failed to set bit {index}: {err:?}"))
        })?;
    }
    Ok(aggregation_bits)
}

fn committee_bits(
    committee_indices: impl IntoIterator<Item = u64>,
) -> Result<BitVector<U64>, AggregationError> {
    let mut committee_bits = BitVector::<U64>::new();
    for committee_index in committee_indices {
        committee_bits
            .set(committee_index as usize, true)
            .map_err(|_| AttestationError::MalformedCommitteeBits)?;
    }
    Ok(committee_bits)
}
