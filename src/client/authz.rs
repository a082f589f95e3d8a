//! Domain authorization.
//!
//! The flow runs profile refresh, `new-authz`, challenge selection and preparation, challenge
//! acceptance, then polls the authorization until it leaves `pending`. A 403 on `new-authz`
//! means the terms of service have not been agreed; that one error is recovered locally by
//! agreeing and retrying, at most once.

use std::path::PathBuf;

use sha2::{Digest as _, Sha256};

use crate::{
    api,
    client::{poll, AcmeClient},
    jws::JwkThumb,
    util,
};

impl AcmeClient {
    /// Prove control of `domain` with an `http-01` challenge.
    ///
    /// The key-authorization file is written to
    /// `<webroot><well_known_path><token>`; the enclosing directory must already exist.
    pub async fn authorize_domain(&mut self, domain: &str) -> eyre::Result<()> {
        self.get_profile().await?;

        let (poll_url, challenge) = self.request_authorization(domain).await?;

        let token = challenge
            .token
            .as_deref()
            .ok_or_else(|| api::Problem::protocol("challenge has no token"))?;

        let key_authorization = self.key_authorization(token)?;
        let path = self.challenge_file_path(token);

        log::debug!("Writing key authorization to: {}", path.display());
        tokio::fs::write(&path, key_authorization.as_bytes())
            .await
            .map_err(|err| {
                eyre::eyre!("failed to write challenge file {}: {err}", path.display())
            })?;

        if self.config().with_interaction {
            if let Some(pause) = &self.pause {
                pause();
            }
        }

        let challenge_url = challenge
            .uri
            .as_deref()
            .ok_or_else(|| api::Problem::protocol("challenge has no uri"))?;

        let res = self
            .transport()
            .post(
                challenge_url,
                &api::ChallengeResponse::new(key_authorization),
            )
            .await?;

        if !res.is_ok() {
            return Err(res.problem().into());
        }

        let status = poll::poll_until_valid(self.transport(), &poll_url, poll::POLL_DELAY).await?;

        match status["status"].as_str() {
            Some("valid") => Ok(()),
            other => {
                let error = status["challenges"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .find_map(|challenge| challenge.get("error"));

                Err(api::Problem::protocol(format!(
                    "authorization for {domain} ended in status {other:?} (error: {error:?})"
                ))
                .into())
            }
        }
    }

    /// POST `new-authz`, agreeing to the terms of service once if the server demands it.
    ///
    /// Returns the poll URL from the `location` header and the selected `http-01` challenge.
    async fn request_authorization(
        &mut self,
        domain: &str,
    ) -> eyre::Result<(String, api::Challenge)> {
        let mut agreed_tos = false;

        loop {
            let url = self.directory()?.new_authz_url()?.to_owned();
            let payload = api::AuthorizationRequest::dns(domain);

            let res = self.transport().post(&url, &payload).await?;

            if res.status() == 403 {
                if agreed_tos {
                    return Err(api::Problem::protocol(
                        "server still refuses new-authz after agreeing to terms of service",
                    )
                    .into());
                }
                agreed_tos = true;

                let tos_link = self.terms_of_service_link().map(str::to_owned).ok_or_else(
                    || {
                        api::Problem::protocol(
                            "server requires agreement but advertised no terms-of-service link",
                        )
                    },
                )?;

                log::debug!("Agreeing to terms of service: {tos_link}");
                self.agree_tos(&tos_link).await?;
                continue;
            }

            if !res.is_ok() {
                return Err(res.problem().into());
            }

            let poll_url = res
                .location()
                .map(str::to_owned)
                .ok_or_else(|| api::Problem::missing_header("location"))?;

            let authz = res.json_as::<api::Authorization>()?;

            if authz.challenges.is_none() {
                return Err(api::Problem::protocol("authorization offered no challenges").into());
            }

            let challenge = authz
                .http_challenge()
                .cloned()
                .ok_or_else(|| api::Problem::protocol("no http-01 challenge offered"))?;

            return Ok((poll_url, challenge));
        }
    }

    /// `token + "." + base64url(sha256(canonical-jwk))` over the server-confirmed account key.
    fn key_authorization(&self, token: &str) -> Result<String, api::Problem> {
        let key = self
            .profile_key
            .as_ref()
            .ok_or_else(|| api::Problem::protocol("no server-confirmed account key cached"))?;

        let jwk_json =
            serde_json::to_string(&JwkThumb::from(key)).map_err(api::Problem::bad_json)?;
        let digest = util::base64url(&Sha256::digest(jwk_json));

        Ok(format!("{token}.{digest}"))
    }

    /// The challenge file lands at the textual concatenation of the three configured parts.
    fn challenge_file_path(&self, token: &str) -> PathBuf {
        let mut path = self.config().webroot.clone().into_os_string();
        path.push(&self.config().well_known_path);
        path.push(token);
        PathBuf::from(path)
    }
}
