//! JSON API payloads.
//!
//! Not intended to be used directly. Provided to aid debugging.

use std::fmt;

use serde::{Deserialize, Serialize};

mod authorization;
mod cert_request;
mod challenge;
mod directory;
mod identifier;
mod registration;

pub use self::{
    authorization::{Authorization, AuthorizationRequest, AuthorizationStatus},
    cert_request::CertRequest,
    challenge::{Challenge, ChallengeResponse, ChallengeStatus},
    directory::Directory,
    identifier::Identifier,
    registration::{Registration, RegistrationUpdate},
};
pub use crate::jws::Jwk;

/// An error document, either sent by the server or synthesized locally.
///
/// Servers following the draft answer failed requests with a `*problem+json` body carrying
/// `type`, `detail` and `status`; the same shape is reused for the client-side error
/// categories (connection, decoding, missing headers, protocol violations, poll timeouts).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    #[serde(rename = "type")]
    pub _type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Problem {
    fn new(_type: &str, detail: impl Into<String>) -> Self {
        Problem {
            _type: _type.to_owned(),
            detail: Some(detail.into()),
            status: None,
        }
    }

    /// The request terminated without any response.
    pub(crate) fn connection(err: reqwest::Error) -> Self {
        Self::new("connectionError", err.to_string())
    }

    pub(crate) fn bad_json(err: serde_json::Error) -> Self {
        Self::new("badJson", err.to_string())
    }

    pub(crate) fn missing_header(name: &str) -> Self {
        Self::new("missingHeader", name)
    }

    pub(crate) fn protocol(detail: impl Into<String>) -> Self {
        Self::new("protocolError", detail)
    }

    pub(crate) fn poll_timeout(url: &str) -> Self {
        Self::new("pollTimeout", format!("gave up polling {url}"))
    }

    /// Returns true if the poller retry ceiling was hit.
    pub fn is_poll_timeout(&self) -> bool {
        self._type == "pollTimeout"
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {detail}", self._type),
            _ => write!(f, "{}", self._type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_problem_documents_deserialize() {
        let problem = serde_json::from_str::<Problem>(
            r#"{
                "type": "urn:acme:error:unauthorized",
                "detail": "Must agree to subscriber agreement before any further actions",
                "status": 403
            }"#,
        )
        .unwrap();

        assert_eq!(problem._type, "urn:acme:error:unauthorized");
        assert_eq!(problem.status, Some(403));
    }
}
