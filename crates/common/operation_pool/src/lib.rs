use std::collections::HashMap;

use parking_lot::RwLock;
use ream_consensus_beacon::{
    errors::AttestationError,
    read_only_attestation::{AttestationId, ReadOnlyAttestation},
    versioned_attestation::VersionedAttestation,
};
use ream_consensus_misc::misc::compute_epoch_at_slot;
use ream_network_spec::networks::beacon_network_spec;
use ream_validator_beacon::{
    errors::AggregationError,
    on_chain_aggregate::{aggregate_committee_attestations, compute_on_chain_aggregates},
};
use tracing::{trace, warn};

/// Network aggregates waiting for block inclusion, bucketed by [`ReadOnlyAttestation::data_id`].
#[derive(Debug, Default)]
pub struct OperationPool {
    attestations: RwLock<HashMap<AttestationId, Vec<ReadOnlyAttestation>>>,
}

impl OperationPool {
    /// Validates `attestation` against the fork active at its target epoch and stores it.
    /// Inserting an attestation that is already pooled is a no-op.
    pub fn insert_attestation(
        &self,
        attestation: VersionedAttestation,
    ) -> Result<(), AttestationError> {
        let data = attestation.data();
        if data.target.epoch != compute_epoch_at_slot(data.slot) {
            let err = AttestationError::InvalidAttestation(format!(
                "Target epoch {} does not match slot {}",
                data.target.epoch, data.slot
            ));
            warn!("Rejected attestation: {err}");
            return Err(err);
        }

        let fork = beacon_network_spec().fork_at_epoch(attestation.data().target.epoch);
        let attestation = ReadOnlyAttestation::new(fork, attestation)
            .inspect_err(|err| warn!("Rejected {fork} attestation: {err}"))?;

        let mut attestations = self.attestations.write();
        let bucket = attestations.entry(attestation.data_id()).or_default();
        if bucket.iter().any(|pooled| pooled.id() == attestation.id()) {
            trace!("Attestation {} is already pooled", attestation.id());
            return Ok(());
        }
        bucket.push(attestation);
        Ok(())
    }

    pub fn get_attestations(&self) -> HashMap<AttestationId, Vec<ReadOnlyAttestation>> {
        self.attestations.read().clone()
    }

    pub fn attestation_count(&self) -> usize {
        self.attestations.read().values().map(Vec::len).sum()
    }

    /// Drops every attestation whose target epoch is before `finalized_epoch`.
    pub fn prune_attestations(&self, finalized_epoch: u64) {
        self.attestations.write().retain(|_, bucket| {
            bucket
                .first()
                .is_some_and(|attestation| attestation.data().target.epoch >= finalized_epoch)
        });
    }

    /// Builds the on-chain aggregates for every pooled Electra attestation. Earlier forks have no
    /// cross-committee aggregates, so their buckets are left out.
    ///
    /// A bucket may hold several network aggregates of one committee, so each bucket is first
    /// folded into a single committee aggregate.
    pub fn get_on_chain_aggregates(&self) -> Result<Vec<ReadOnlyAttestation>, AggregationError> {
        let electra_buckets = self
            .attestations
            .read()
            .iter()
            .filter(|(id, _)| id.fork().is_electra_or_later())
            .map(|(id, bucket)| (*id, bucket.clone()))
            .collect::<Vec<_>>();

        let committee_aggregates = electra_buckets
            .into_iter()
            .map(|(id, bucket)| {
                aggregate_committee_attestations(bucket).map(|aggregate| (id, vec![aggregate]))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        compute_on_chain_aggregates(committee_aggregates)
    }
}
