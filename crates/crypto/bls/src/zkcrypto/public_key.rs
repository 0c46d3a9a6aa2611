use bls12_381::{G1Affine, G1Projective};
use ssz_types::FixedVector;

use crate::{PublicKey, errors::BLSError, traits::Aggregatable};

impl From<G1Projective> for PublicKey {
    fn from(value: G1Projective) -> Self {
        Self {
            inner: FixedVector::from(G1Affine::from(value).to_compressed().to_vec()),
        }
    }
}

impl TryFrom<&PublicKey> for G1Affine {
    type Error = BLSError;

    fn try_from(value: &PublicKey) -> Result<Self, Self::Error> {
        let point = G1Affine::from_compressed(
            value
                .to_bytes()
                .try_into()
                .map_err(|_| BLSError::InvalidByteLength)?,
        )
        .into_option()
        .ok_or(BLSError::InvalidPublicKey)?;

        if bool::from(point.is_identity()) {
            return Err(BLSError::InvalidPublicKey);
        }

        Ok(point)
    }
}

impl Aggregatable<PublicKey> for PublicKey {
    type Error = BLSError;

    fn aggregate(public_keys: &[&PublicKey]) -> Result<PublicKey, Self::Error> {
        if public_keys.is_empty() {
            return Err(BLSError::EmptyAggregation);
        }

        let aggregate_point =
            public_keys
                .iter()
                .try_fold(G1Projective::identity(), |accumulator, public_key| {
                    Ok::<_, BLSError>(
                        accumulator + G1Projective::from(G1Affine::try_from(*public_key)?),
                    )
                })?;

        Ok(PublicKey::from(aggregate_point))
    }
}
