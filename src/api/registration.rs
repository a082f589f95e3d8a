use serde::{Deserialize, Serialize};

use crate::jws::Jwk;

/// A registration resource as returned by `new-reg` and `reg`.
///
/// The `key` field mirrors the account public key the server has on file; it is the
/// authoritative input for key-authorization hashes.
///
/// # Example JSON
///
/// ```json
/// {
///   "id": 12345,
///   "key": { "kty": "RSA", "n": "...", "e": "AQAB" },
///   "contact": ["mailto:cert-admin@example.com"],
///   "agreement": "https://example.com/acme/terms"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Jwk>,

    /// Contact URIs. Entries can be null or use non-mail schemes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<Option<String>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<String>,
}

impl Registration {
    /// First `mailto:` contact with the scheme stripped.
    pub fn email(&self) -> Option<&str> {
        self.contact
            .as_ref()?
            .iter()
            .flatten()
            .find_map(|contact| contact.strip_prefix("mailto:"))
    }
}

/// Request body POSTed to `new-reg` and `reg`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationUpdate {
    pub resource: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<String>>,

    /// The draft capitalizes this field name.
    #[serde(rename = "Agreement", skip_serializing_if = "Option::is_none")]
    pub agreement: Option<String>,
}

impl RegistrationUpdate {
    pub(crate) fn new_reg(contact: Option<Vec<String>>) -> Self {
        RegistrationUpdate {
            resource: "new-reg",
            contact,
            agreement: None,
        }
    }

    pub(crate) fn reg(agreement: Option<String>) -> Self {
        RegistrationUpdate {
            resource: "reg",
            contact: None,
            agreement,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_email_skips_null_and_non_mail_contacts() {
        let reg = serde_json::from_value::<Registration>(json!({
            "contact": ["tel:+1234", null, "mailto:info@example.com"]
        }))
        .unwrap();

        assert_eq!(reg.email(), Some("info@example.com"));
    }

    #[test]
    fn test_email_is_none_without_mail_contact() {
        let reg = serde_json::from_value::<Registration>(json!({ "contact": ["tel:+1234"] }))
            .unwrap();
        assert_eq!(reg.email(), None);

        assert_eq!(Registration::default().email(), None);
    }

    #[test]
    fn test_agreement_update_uses_capitalized_field() {
        let update = RegistrationUpdate::reg(Some("https://ca.example/terms".to_owned()));

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "resource": "reg", "Agreement": "https://ca.example/terms" })
        );
    }

    #[test]
    fn test_probe_payload_is_resource_only() {
        assert_eq!(
            serde_json::to_value(RegistrationUpdate::new_reg(None)).unwrap(),
            json!({ "resource": "new-reg" })
        );
    }
}
