use blst::min_pk::SecretKey as BlstSecretKey;

use crate::{
    BLSSignature, PrivateKey, PublicKey, constants::DST, errors::BLSError, traits::Signable,
};

impl PrivateKey {
    fn to_blst_secret_key(&self) -> Result<BlstSecretKey, BLSError> {
        BlstSecretKey::from_bytes(self.inner.as_slice()).map_err(|_| BLSError::InvalidPrivateKey)
    }
}

impl Signable for PrivateKey {
    type Error = BLSError;

    fn sign(&self, message: &[u8]) -> Result<BLSSignature, Self::Error> {
        Ok(BLSSignature::from(
            self.to_blst_secret_key()?.sign(message, DST, &[]),
        ))
    }

    fn public_key(&self) -> Result<PublicKey, Self::Error> {
        Ok(PublicKey::from(self.to_blst_secret_key()?.sk_to_pk()))
    }
}
