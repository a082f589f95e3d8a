use eyre::eyre;
use rsa::RsaPrivateKey;
use time::OffsetDateTime;
use x509_cert::der::Decode as _;

/// Make an RSA private key of `bits` length (from which we can derive a public key).
pub fn create_rsa_key(bits: usize) -> eyre::Result<RsaPrivateKey> {
    let csprng = &mut rand::thread_rng();
    Ok(RsaPrivateKey::new(csprng, bits)?)
}

/// An issued certificate in the DER form the draft servers hand back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    pub(crate) fn from_der(der: Vec<u8>) -> Self {
        Certificate { der }
    }

    /// The issued certificate in DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Inspect the certificate to count the number of (whole) valid days left.
    ///
    /// It's up to the API provider to decide how long an issued certificate is valid. This
    /// counts _whole_ days, so a certificate issued moments ago with a 90 day validity reports
    /// 89. It is possible to get negative days for an expired certificate.
    pub fn valid_days_left(&self) -> eyre::Result<i64> {
        let cert = x509_cert::Certificate::from_der(&self.der)?;

        let not_after = cert.tbs_certificate.validity.not_after.to_date_time();
        let not_after =
            OffsetDateTime::from_unix_timestamp(not_after.unix_duration().as_secs() as i64)
                .map_err(|err| eyre!("certificate notAfter out of range: {err}"))?;

        let diff = not_after - OffsetDateTime::now_utc();

        Ok(diff.whole_days())
    }
}
