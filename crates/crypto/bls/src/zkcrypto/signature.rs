use bls12_381::{
    G1Affine, G2Affine, G2Projective,
    hash_to_curve::{ExpandMsgXmd, HashToCurve},
    pairing,
};
use ssz_types::FixedVector;

use crate::{
    BLSSignature, PublicKey,
    constants::DST,
    errors::BLSError,
    traits::{Aggregatable, Verifiable},
};

impl From<G2Projective> for BLSSignature {
    fn from(value: G2Projective) -> Self {
        Self {
            inner: FixedVector::from(G2Affine::from(value).to_compressed().to_vec()),
        }
    }
}

impl TryFrom<&BLSSignature> for G2Affine {
    type Error = BLSError;

    fn try_from(value: &BLSSignature) -> Result<Self, Self::Error> {
        G2Affine::from_compressed(
            value
                .to_bytes()
                .try_into()
                .map_err(|_| BLSError::InvalidByteLength)?,
        )
        .into_option()
        .ok_or(BLSError::InvalidSignature)
    }
}

impl Verifiable for BLSSignature {
    type Error = BLSError;

    fn verify(&self, public_key: &PublicKey, message: &[u8]) -> Result<bool, BLSError> {
        let hash_point = <G2Projective as HashToCurve<ExpandMsgXmd<sha2::Sha256>>>::hash_to_curve(
            [message],
            DST,
        );

        let gt1 = pairing(&G1Affine::try_from(public_key)?, &G2Affine::from(hash_point));
        let gt2 = pairing(&G1Affine::generator(), &G2Affine::try_from(self)?);

        Ok(gt1 == gt2)
    }

    fn fast_aggregate_verify<'a, P>(&self, public_keys: P, message: &[u8]) -> Result<bool, BLSError>
    where
        P: AsRef<[&'a PublicKey]>,
    {
        if public_keys.as_ref().is_empty() {
            return Ok(false);
        }

        let aggregate_public_key = PublicKey::aggregate(public_keys.as_ref())?;
        self.verify(&aggregate_public_key, message)
    }
}

impl Aggregatable<BLSSignature> for BLSSignature {
    type Error = BLSError;

    fn aggregate(signatures: &[&BLSSignature]) -> Result<BLSSignature, Self::Error> {
        if signatures.is_empty() {
            return Err(BLSError::EmptyAggregation);
        }

        let aggregate_point =
            signatures
                .iter()
                .try_fold(G2Projective::identity(), |accumulator, signature| {
                    Ok::<_, BLSError>(
                        accumulator + G2Projective::from(G2Affine::try_from(*signature)?),
                    )
                })?;

        Ok(BLSSignature::from(aggregate_point))
    }
}
