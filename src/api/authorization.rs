use serde::{Deserialize, Serialize};

use crate::api;

/// The status of an [`api::Authorization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
    Revoked,
}

/// An authorization object as returned by `new-authz`.
///
/// # Example JSON
///
/// ```json
/// {
///   "identifier": {
///     "type": "dns",
///     "value": "www.example.com"
///   },
///   "status": "pending",
///   "expires": "2016-01-09T08:26:43Z",
///   "challenges": [
///     {
///       "type": "http-01",
///       "status": "pending",
///       "uri": "https://example.com/acme/challenge/abc123/0",
///       "token": "MUi-gqeOJdRkSb_YR2eaMxQBqf6al8dgt_dOttSWb0w"
///     }
///   ],
///   "combinations": [[0]]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<api::Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AuthorizationStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Challenges the client may fulfill. Absent on malformed authorizations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges: Option<Vec<api::Challenge>>,
}

impl Authorization {
    /// Returns the first `http-01` challenge, if one is offered.
    pub fn http_challenge(&self) -> Option<&api::Challenge> {
        self.challenges
            .as_ref()?
            .iter()
            .find(|challenge| challenge._type == "http-01")
    }
}

/// Request body POSTed to `new-authz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    pub resource: &'static str,
    pub identifier: api::Identifier,
}

impl AuthorizationRequest {
    pub(crate) fn dns(domain: &str) -> Self {
        AuthorizationRequest {
            resource: "new-authz",
            identifier: api::Identifier::dns(domain),
        }
    }
}
