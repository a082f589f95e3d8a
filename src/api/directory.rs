use serde::{Deserialize, Serialize};

use crate::api::Problem;

/// Directory object for client self-configuration.
///
/// The draft names resources with dashes, mapping each to the URL it is served from.
///
/// # Example JSON
///
/// ```json
/// {
///   "new-reg": "https://example.com/acme/new-reg",
///   "new-authz": "https://example.com/acme/new-authz",
///   "new-cert": "https://example.com/acme/new-cert",
///   "reg": "https://example.com/acme/reg",
///   "revoke-cert": "https://example.com/acme/revoke-cert"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    /// URL for creating and probing registrations.
    #[serde(rename = "new-reg", skip_serializing_if = "Option::is_none")]
    pub new_reg: Option<String>,

    /// URL for requesting domain authorizations.
    #[serde(rename = "new-authz", skip_serializing_if = "Option::is_none")]
    pub new_authz: Option<String>,

    /// URL for submitting certificate signing requests.
    #[serde(rename = "new-cert", skip_serializing_if = "Option::is_none")]
    pub new_cert: Option<String>,

    /// URL of the registration resource, when advertised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg: Option<String>,
}

impl Directory {
    pub(crate) fn new_reg_url(&self) -> Result<&str, Problem> {
        self.new_reg
            .as_deref()
            .ok_or_else(|| Problem::protocol("directory has no new-reg resource"))
    }

    pub(crate) fn new_authz_url(&self) -> Result<&str, Problem> {
        self.new_authz
            .as_deref()
            .ok_or_else(|| Problem::protocol("directory has no new-authz resource"))
    }

    pub(crate) fn new_cert_url(&self) -> Result<&str, Problem> {
        self.new_cert
            .as_deref()
            .ok_or_else(|| Problem::protocol("directory has no new-cert resource"))
    }
}
