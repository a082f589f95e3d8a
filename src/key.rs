use eyre::WrapErr as _;
use pkcs8::{DecodePrivateKey as _, EncodePrivateKey as _, LineEnding};
use rsa::{
    pkcs1::DecodeRsaPrivateKey as _,
    pkcs1v15::SigningKey,
    signature::{SignatureEncoding as _, Signer as _},
    RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;
use zeroize::Zeroizing;

/// RSA account key used to sign every authenticated request.
#[derive(Clone, Debug)]
pub(crate) struct AcmeKey {
    private_key: RsaPrivateKey,
    signing_key: SigningKey<Sha256>,
}

impl AcmeKey {
    pub(crate) fn from_key(private_key: RsaPrivateKey) -> AcmeKey {
        let signing_key = SigningKey::<Sha256>::new(private_key.clone());

        AcmeKey {
            private_key,
            signing_key,
        }
    }

    /// Read a private key from PEM, accepting both PKCS#8 and the legacy PKCS#1 framing
    /// emitted by older `openssl genrsa`.
    pub(crate) fn from_pem(pem: &str) -> eyre::Result<AcmeKey> {
        let private_key = match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(_) => RsaPrivateKey::from_pkcs1_pem(pem).wrap_err("Failed to read PEM")?,
        };

        Ok(Self::from_key(private_key))
    }

    pub(crate) fn to_pem(&self) -> eyre::Result<Zeroizing<String>> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .wrap_err("private_key_to_pem")
    }

    /// RSASSA-PKCS1-v1_5 signature with SHA-256 over `data`.
    pub(crate) fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.signing_key.sign(data).to_vec()
    }

    pub(crate) fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }
}
