//! The protocol engine.
//!
//! [`AcmeClient`] drives the conversation with the API: directory discovery, registration,
//! terms-of-service agreement, domain authorization and certificate issuance. State observed
//! on the wire (directory map, registration URL, terms-of-service link, the server-confirmed
//! account key) is cached on the client and only ever replaced by later responses.

use std::path::PathBuf;

use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use crate::{
    api,
    jws::Jwk,
    key::AcmeKey,
    keygen::{KeyGenerator, OpensslKeyGen},
    req::ReqResult,
    trans::{AcmeResponse, Transport},
    util,
};

mod authz;
mod issue;
pub(crate) mod poll;

const LETSENCRYPT_URL: &str = "https://acme-v01.api.letsencrypt.org/directory";
const LETSENCRYPT_STAGING_URL: &str = "https://acme-staging.api.letsencrypt.org/directory";

/// Enumeration of known ACME API directories.
#[derive(Debug, Clone)]
pub enum DirectoryUrl<'a> {
    /// The main Let's Encrypt v01 directory.
    ///
    /// Not appropriate for testing / development.
    LetsEncrypt,

    /// The staging Let's Encrypt v01 directory.
    ///
    /// Use for testing and development. Doesn't issue "valid" certificates. The root signing
    /// certificate is not supposed to be in any trust chains.
    LetsEncryptStaging,

    /// Provide an arbitrary directory URL to connect to.
    Other(&'a str),
}

impl DirectoryUrl<'_> {
    fn to_url(&self) -> &str {
        match self {
            DirectoryUrl::LetsEncrypt => LETSENCRYPT_URL,
            DirectoryUrl::LetsEncryptStaging => LETSENCRYPT_STAGING_URL,
            DirectoryUrl::Other(url) => url,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL fetched to discover resource URLs.
    pub directory_url: String,

    /// Requested certificate validity in days. Zero is coerced to one; negative values count
    /// as their magnitude.
    pub days_valid: i64,

    /// Bit length for per-domain key pairs handed to the key generator.
    pub default_rsa_key_size: u32,

    /// When set, replaces any email found on the profile or synthesized from the prefix.
    pub email_override: Option<String>,

    /// Used to synthesize `<prefix>@<domain>` when no email is known.
    pub email_default_prefix: String,

    /// Directory under which the challenge path lives.
    pub webroot: PathBuf,

    /// Path fragment appended to the webroot for challenge files.
    pub well_known_path: String,

    /// Pause between publishing the challenge file and accepting the challenge, so the
    /// operator can move the file into place. See [`AcmeClient::set_pause()`].
    pub with_interaction: bool,

    /// Working directory for `.csr` and `.der` artifacts.
    pub workdir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            directory_url: LETSENCRYPT_URL.to_owned(),
            days_valid: 1,
            default_rsa_key_size: 2048,
            email_override: None,
            email_default_prefix: "hostmaster".to_owned(),
            webroot: PathBuf::from("."),
            well_known_path: "/.well-known/acme-challenge/".to_owned(),
            with_interaction: false,
            workdir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Configuration with defaults pointed at `url`.
    pub fn for_directory(url: DirectoryUrl<'_>) -> Self {
        Config {
            directory_url: url.to_url().to_owned(),
            ..Config::default()
        }
    }
}

/// Stateful client for one account key against one directory.
pub struct AcmeClient {
    config: Config,
    transport: Transport,
    keygen: Box<dyn KeyGenerator>,
    pause: Option<Box<dyn Fn() + Send + Sync>>,
    directory: Option<api::Directory>,
    reg_url: Option<String>,
    tos_link: Option<String>,
    profile_key: Option<Jwk>,
}

impl AcmeClient {
    /// Create a client around an existing account key.
    pub fn new(config: Config, account_key: RsaPrivateKey) -> Self {
        AcmeClient {
            config,
            transport: Transport::new(AcmeKey::from_key(account_key)),
            keygen: Box::new(OpensslKeyGen),
            pause: None,
            directory: None,
            reg_url: None,
            tos_link: None,
            profile_key: None,
        }
    }

    /// Create a client from an account key in PEM form (PKCS#8 or PKCS#1).
    pub fn from_pem(config: Config, pem: &str) -> eyre::Result<Self> {
        let acme_key = AcmeKey::from_pem(pem)?;

        Ok(AcmeClient {
            config,
            transport: Transport::new(acme_key),
            keygen: Box::new(OpensslKeyGen),
            pause: None,
            directory: None,
            reg_url: None,
            tos_link: None,
            profile_key: None,
        })
    }

    /// Replace the key generator used for per-domain key material.
    pub fn set_key_generator(&mut self, keygen: Box<dyn KeyGenerator>) {
        self.keygen = keygen;
    }

    /// Install the callback invoked when [`Config::with_interaction`] pauses the
    /// authorization flow.
    pub fn set_pause<F>(&mut self, pause: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.pause = Some(Box::new(pause));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The account key in PEM format.
    pub fn account_key_pem(&self) -> eyre::Result<Zeroizing<String>> {
        self.transport.acme_key().to_pem()
    }

    /// URL of this account's registration, once a `new-reg` response revealed it.
    pub fn registration_url(&self) -> Option<&str> {
        self.reg_url.as_deref()
    }

    /// Terms-of-service URL from the most recent registration response, if any.
    pub fn terms_of_service_link(&self) -> Option<&str> {
        self.tos_link.as_deref()
    }

    /// Fetch the directory document and replace the cached resource map.
    pub async fn get_directory(&mut self) -> eyre::Result<()> {
        let res = self.transport.get(&self.config.directory_url).await?;

        if !res.is_ok() {
            return Err(res.problem().into());
        }

        let directory = res.json_as::<api::Directory>()?;
        log::debug!("Directory: {directory:?}");

        self.directory = Some(directory);
        Ok(())
    }

    pub(crate) fn directory(&self) -> ReqResult<&api::Directory> {
        self.directory
            .as_ref()
            .ok_or_else(|| api::Problem::protocol("directory not fetched"))
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    /// POST to `new-reg`, either to create an account or as a probe for the account URL.
    ///
    /// The raw response is returned so callers can branch on status and headers.
    pub(crate) async fn new_registration(
        &mut self,
        contact: Option<Vec<String>>,
    ) -> ReqResult<AcmeResponse> {
        let url = self.directory()?.new_reg_url()?.to_owned();
        let payload = api::RegistrationUpdate::new_reg(contact);

        self.transport.post(&url, &payload).await
    }

    /// POST a `reg` update to `url`, refreshing the cached terms-of-service link and the
    /// server-confirmed account key from the response.
    pub async fn get_registration(
        &mut self,
        url: &str,
        agreement: Option<String>,
    ) -> eyre::Result<api::Registration> {
        let payload = api::RegistrationUpdate::reg(agreement);
        let res = self.transport.post(url, &payload).await?;

        if !res.is_ok() {
            return Err(res.problem().into());
        }

        self.tos_link = res.link().and_then(util::tos_link_from_link_header);

        let registration = res.json_as::<api::Registration>()?;
        if let Some(key) = &registration.key {
            self.profile_key = Some(key.clone());
        }

        Ok(registration)
    }

    /// Fetch the profile of the account owning the configured key.
    ///
    /// Sequences directory discovery, a `new-reg` probe for the account URL, then a `reg`
    /// update that returns the profile.
    pub async fn get_profile(&mut self) -> eyre::Result<api::Registration> {
        self.get_directory().await?;

        let res = self.new_registration(None).await?;
        let reg_url = res
            .location()
            .map(str::to_owned)
            .ok_or_else(|| api::Problem::missing_header("location"))?;

        log::debug!("Registration is at: {reg_url}");
        self.reg_url = Some(reg_url.clone());

        self.get_registration(&reg_url, None).await
    }

    /// Register a new account for `email`, returning the registration URL.
    pub async fn create_account(&mut self, email: &str) -> eyre::Result<String> {
        self.get_directory().await?;

        let contact = vec![format!("mailto:{email}")];
        let res = self.new_registration(Some(contact)).await?;

        if res.status() != 201 {
            return Err(res.problem().into());
        }

        let reg_url = res
            .location()
            .map(str::to_owned)
            .ok_or_else(|| api::Problem::missing_header("location"))?;

        log::debug!("Account created at: {reg_url}");
        self.reg_url = Some(reg_url.clone());

        Ok(reg_url)
    }

    /// Record agreement with the terms of service at `tos_link`.
    pub async fn agree_tos(&mut self, tos_link: &str) -> eyre::Result<api::Registration> {
        let reg_url = self.reg_url.clone().ok_or_else(|| {
            api::Problem::protocol("no registration url known; fetch the profile first")
        })?;

        self.get_registration(&reg_url, Some(tos_link.to_owned())).await
    }
}
