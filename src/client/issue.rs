//! Certificate signing and issuance.

use crate::{
    api,
    cert::Certificate,
    client::{poll, AcmeClient},
    trans::Body,
    util,
};

impl AcmeClient {
    /// Submit the CSR for `domain` and return the issued certificate bytes.
    ///
    /// The DER CSR is read from `<workdir>/<sanitized-domain>.csr`. When the server defers
    /// issuance (sub-400 status with an empty body), the `location` header is polled until
    /// the certificate appears.
    pub async fn request_signing(&mut self, domain: &str) -> eyre::Result<Vec<u8>> {
        let csr_path = self
            .config()
            .workdir
            .join(format!("{}.csr", util::safe_name(domain, false)));

        let csr = tokio::fs::read(&csr_path).await.map_err(|err| {
            eyre::eyre!("failed to read CSR {}: {err}", csr_path.display())
        })?;

        let payload = api::CertRequest::new(&csr, self.config().days_valid);
        let url = self.directory()?.new_cert_url()?.to_owned();

        let res = self.transport().post(&url, &payload).await?;

        match res.body() {
            Body::Bytes(bytes) if !bytes.is_empty() => Ok(bytes.clone()),

            _ if res.is_ok() => {
                let poll_url = res
                    .location()
                    .map(str::to_owned)
                    .ok_or_else(|| api::Problem::missing_header("location"))?;

                log::debug!("Certificate not ready, polling: {poll_url}");
                Ok(poll::poll_until_issued(self.transport(), &poll_url, poll::POLL_DELAY).await?)
            }

            _ => Err(res.problem().into()),
        }
    }

    /// Obtain a certificate for `domain`, producing `<sanitized-domain>.der` in the workdir.
    ///
    /// Sequences profile refresh, email derivation (override, then profile contact, then
    /// `<prefix>@<domain>`), external key/CSR generation, signing and the write of the issued
    /// certificate.
    pub async fn request_certificate(
        &mut self,
        domain: &str,
        organization: &str,
        country: &str,
    ) -> eyre::Result<Certificate> {
        let profile = self.get_profile().await?;

        let email = self
            .config()
            .email_override
            .clone()
            .or_else(|| profile.email().map(str::to_owned))
            .unwrap_or_else(|| format!("{}@{domain}", self.config().email_default_prefix));

        let name = util::safe_name(domain, false);

        log::debug!("Generating key and CSR for {name} (contact {email})");
        self.keygen.domain_key_and_csr(
            &self.config().workdir,
            self.config().default_rsa_key_size,
            country,
            organization,
            &name,
            &email,
        )?;

        let der = self.request_signing(domain).await?;

        let der_path = self.config().workdir.join(format!("{name}.der"));
        tokio::fs::write(&der_path, &der).await.map_err(|err| {
            eyre::eyre!("failed to write certificate {}: {err}", der_path.display())
        })?;

        log::debug!("Certificate written to: {}", der_path.display());

        Ok(Certificate::from_der(der))
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::atomic::Ordering};

    use crate::{
        keygen::KeyGenerator,
        test::{test_client, test_workdir, with_server, ServerOptions, TEST_CERT},
    };

    /// Generator that drops a canned CSR instead of shelling out.
    struct StubKeyGen;

    impl KeyGenerator for StubKeyGen {
        fn domain_key_and_csr(
            &self,
            dir: &Path,
            _rsa_bits: u32,
            _country: &str,
            _organization: &str,
            common_name: &str,
            _email: &str,
        ) -> eyre::Result<()> {
            std::fs::write(dir.join(format!("{common_name}.key")), b"stub-key")?;
            std::fs::write(dir.join(format!("{common_name}.csr")), b"stub-csr-der")?;
            Ok(())
        }

        fn account_key(&self, _rsa_bits: u32, path: &Path) -> eyre::Result<()> {
            std::fs::write(path, b"stub-key")?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_certificate_issued_inline() {
        let server = with_server(ServerOptions {
            cert_inline: true,
            ..ServerOptions::default()
        });
        let workdir = test_workdir("inline");

        let mut client = test_client(&server.dir_url);
        client.config.workdir = workdir.clone();
        client.set_key_generator(Box::new(StubKeyGen));

        let cert = client
            .request_certificate("acme-test.example.com", "Example Org", "SE")
            .await
            .unwrap();

        assert_eq!(cert.der(), TEST_CERT);

        let der = std::fs::read(workdir.join("acme-test.example.com.der")).unwrap();
        assert_eq!(der, TEST_CERT);

        assert_eq!(server.hits.new_cert.load(Ordering::SeqCst), 1);
        assert_eq!(server.hits.cert_poll.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_certificate_issuance_is_polled() {
        let server = with_server(ServerOptions {
            empty_cert_polls: 1,
            ..ServerOptions::default()
        });
        let workdir = test_workdir("deferred");

        let mut client = test_client(&server.dir_url);
        client.config.workdir = workdir.clone();
        client.set_key_generator(Box::new(StubKeyGen));

        let cert = client
            .request_certificate("acme-test.example.com", "Example Org", "SE")
            .await
            .unwrap();

        assert_eq!(cert.der(), TEST_CERT);
        assert_eq!(server.hits.cert_poll.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_csr_fails() {
        let server = with_server(ServerOptions::default());
        let workdir = test_workdir("no-csr");

        let mut client = test_client(&server.dir_url);
        client.config.workdir = workdir;

        client.get_directory().await.unwrap();

        let err = client
            .request_signing("acme-test.example.com")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("CSR"));
    }
}
