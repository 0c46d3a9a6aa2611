use blst::min_pk::{AggregatePublicKey as BlstAggregatePublicKey, PublicKey as BlstPublicKey};
use ssz_types::FixedVector;

use crate::{PublicKey, errors::BLSError, traits::Aggregatable};

impl From<BlstPublicKey> for PublicKey {
    fn from(value: BlstPublicKey) -> Self {
        PublicKey {
            inner: FixedVector::from(value.to_bytes().to_vec()),
        }
    }
}

impl PublicKey {
    pub fn to_blst_public_key(&self) -> Result<BlstPublicKey, BLSError> {
        BlstPublicKey::key_validate(self.to_bytes()).map_err(|_| BLSError::InvalidPublicKey)
    }
}

impl Aggregatable<PublicKey> for PublicKey {
    type Error = BLSError;

    fn aggregate(public_keys: &[&PublicKey]) -> Result<PublicKey, Self::Error> {
        if public_keys.is_empty() {
            return Err(BLSError::EmptyAggregation);
        }

        let public_keys = public_keys
            .iter()
            .map(|public_key| public_key.to_blst_public_key())
            .collect::<Result<Vec<_>, _>>()?;
        let aggregate_public_key =
            BlstAggregatePublicKey::aggregate(&public_keys.iter().collect::<Vec<_>>(), false)
                .map_err(BLSError::BlstError)?;
        Ok(PublicKey::from(aggregate_public_key.to_public_key()))
    }
}
