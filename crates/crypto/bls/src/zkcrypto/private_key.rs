use bls12_381::{
    G1Projective, G2Projective, Scalar,
    hash_to_curve::{ExpandMsgXmd, HashToCurve},
};

use crate::{
    BLSSignature, PrivateKey, PublicKey, constants::DST, errors::BLSError, traits::Signable,
};

impl PrivateKey {
    fn to_scalar(&self) -> Result<Scalar, BLSError> {
        // `Scalar::from_bytes` expects little-endian bytes.
        let mut bytes = self.inner.0;
        bytes.reverse();
        let scalar = Scalar::from_bytes(&bytes)
            .into_option()
            .ok_or(BLSError::InvalidPrivateKey)?;
        if scalar == Scalar::zero() {
            return Err(BLSError::InvalidPrivateKey);
        }
        Ok(scalar)
    }
}

impl Signable for PrivateKey {
    type Error = BLSError;

    fn sign(&self, message: &[u8]) -> Result<BLSSignature, Self::Error> {
        let hash_point = <G2Projective as HashToCurve<ExpandMsgXmd<sha2::Sha256>>>::hash_to_curve(
            [message],
            DST,
        );
        Ok(BLSSignature::from(hash_point * self.to_scalar()?))
    }

    fn public_key(&self) -> Result<PublicKey, Self::Error> {
        Ok(PublicKey::from(G1Projective::generator() * self.to_scalar()?))
    }
}
