use serde::{Deserialize, Serialize};

use crate::api;

/// The status of an [`api::Challenge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
}

/// A challenge object offered inside an authorization.
///
/// The draft addresses challenges through a `uri` field (RFC 8555 renamed it to `url`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Type of challenge encoded in the object.
    #[serde(rename = "type")]
    pub _type: String,

    /// URL to which the challenge response is posted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ChallengeStatus>,

    /// Token bound into the key authorization. Required for `http-01`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated: Option<String>,

    /// Error reported by the server after a failed validation attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<api::Problem>,
}

/// Request body accepting a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub resource: &'static str,
    pub key_authorization: String,
}

impl ChallengeResponse {
    pub(crate) fn new(key_authorization: String) -> Self {
        ChallengeResponse {
            resource: "challenge",
            key_authorization,
        }
    }
}
