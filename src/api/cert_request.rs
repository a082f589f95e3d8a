use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::util;

/// Request body POSTed to `new-cert`.
///
/// The CSR travels as base64url of the raw DER bytes (not PEM). Validity is expressed as an
/// RFC 3339 window starting now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertRequest {
    pub resource: &'static str,

    pub csr: String,

    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
}

impl CertRequest {
    /// Build a signing request for `csr_der` valid for `days_valid` days.
    ///
    /// A zero validity is coerced to one day; negative values count as their magnitude.
    pub(crate) fn new(csr_der: &[u8], days_valid: i64) -> Self {
        let days = if days_valid == 0 { 1 } else { days_valid.abs() };

        let not_before = OffsetDateTime::now_utc();
        let not_after = not_before + Duration::seconds(days * 86_400);

        CertRequest {
            resource: "new-cert",
            csr: util::base64url(csr_der),
            not_before,
            not_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_is_base64url_of_raw_bytes() {
        let req = CertRequest::new(b"Hello World!", 1);

        assert_eq!(req.resource, "new-cert");
        assert_eq!(req.csr, "SGVsbG8gV29ybGQh");
        assert_eq!(req.not_after - req.not_before, Duration::seconds(86_400));
    }

    #[test]
    fn test_days_valid_is_coerced() {
        let req = CertRequest::new(b"x", 0);
        assert_eq!(req.not_after - req.not_before, Duration::seconds(86_400));

        let req = CertRequest::new(b"x", -3);
        assert_eq!(req.not_after - req.not_before, Duration::seconds(3 * 86_400));
    }

    #[test]
    fn test_timestamps_serialize_as_rfc3339() {
        let req = CertRequest::new(b"x", 1);
        let value = serde_json::to_value(&req).unwrap();

        let not_before = value["notBefore"].as_str().unwrap();
        assert!(not_before.ends_with('Z') || not_before.contains('+'));
        assert!(value["notAfter"].is_string());
    }
}
