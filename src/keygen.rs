//! Key and CSR generation delegated to an external tool.
//!
//! The protocol client never builds CSRs itself; it hands the work to a generator and reads
//! the resulting files back from disk.

use std::{
    path::Path,
    process::{Command, Stdio},
};

use eyre::{eyre, WrapErr as _};

/// Generator for per-domain key material and account keys.
pub trait KeyGenerator: Send + Sync {
    /// Produce `<common_name>.key` and a DER-encoded `<common_name>.csr` in `dir`.
    fn domain_key_and_csr(
        &self,
        dir: &Path,
        rsa_bits: u32,
        country: &str,
        organization: &str,
        common_name: &str,
        email: &str,
    ) -> eyre::Result<()>;

    /// Produce an RSA private key PEM at `path`.
    fn account_key(&self, rsa_bits: u32, path: &Path) -> eyre::Result<()>;
}

/// Default generator backed by the `openssl` command line tool.
#[derive(Debug, Clone, Default)]
pub struct OpensslKeyGen;

impl KeyGenerator for OpensslKeyGen {
    fn domain_key_and_csr(
        &self,
        dir: &Path,
        rsa_bits: u32,
        country: &str,
        organization: &str,
        common_name: &str,
        email: &str,
    ) -> eyre::Result<()> {
        let key_file = dir.join(format!("{common_name}.key"));
        let csr_file = dir.join(format!("{common_name}.csr"));

        run_openssl(
            Command::new("openssl")
                .arg("genrsa")
                .arg("-out")
                .arg(&key_file)
                .arg(rsa_bits.to_string()),
        )?;

        let mut subject = String::new();
        if !country.is_empty() {
            subject.push_str(&format!("/C={country}"));
        }
        if !organization.is_empty() {
            subject.push_str(&format!("/O={organization}"));
        }
        subject.push_str(&format!("/CN={common_name}"));
        if !email.is_empty() {
            subject.push_str(&format!("/emailAddress={email}"));
        }

        run_openssl(
            Command::new("openssl")
                .args(["req", "-new", "-outform", "DER"])
                .arg("-key")
                .arg(&key_file)
                .args(["-subj", &subject])
                .arg("-out")
                .arg(&csr_file),
        )
    }

    fn account_key(&self, rsa_bits: u32, path: &Path) -> eyre::Result<()> {
        run_openssl(
            Command::new("openssl")
                .arg("genrsa")
                .arg("-out")
                .arg(path)
                .arg(rsa_bits.to_string()),
        )
    }
}

fn run_openssl(cmd: &mut Command) -> eyre::Result<()> {
    log::debug!("Running {cmd:?}");

    let status = cmd
        .stdin(Stdio::null())
        .status()
        .wrap_err("failed to launch openssl")?;

    if !status.success() {
        return Err(eyre!("openssl exited with {status}"));
    }

    Ok(())
}
