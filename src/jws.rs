//! JWS construction for the targeted pre-RFC draft.
//!
//! Unlike RFC 8555, the draft signs a compact `header.payload.signature` token and carries the
//! full account JWK (never a key ID) in every protected header.

use rsa::traits::PublicKeyParts as _;
use serde::{Deserialize, Serialize};

use crate::{api::Problem, key::AcmeKey, util};

/// Protected header of the signed token.
///
/// The `nonce` field is omitted entirely (not serialized as null) when no nonce has been
/// observed yet.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JwsProtectedHeader {
    typ: String,
    alg: String,
    jwk: Jwk,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
}

impl JwsProtectedHeader {
    pub(crate) fn new(jwk: Jwk, nonce: Option<String>) -> Self {
        JwsProtectedHeader {
            typ: "JWT".to_owned(),
            alg: "RS256".to_owned(),
            jwk,
            nonce,
        }
    }
}

/// RSA public key as a JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub n: String,
    pub e: String,
}

impl From<&AcmeKey> for Jwk {
    fn from(key: &AcmeKey) -> Self {
        let public = key.public_key();

        Jwk {
            kty: "RSA".to_owned(),
            n: util::base64url(&public.n().to_bytes_be()),
            e: util::base64url(&public.e().to_bytes_be()),
        }
    }
}

#[derive(Debug, Serialize)]
// LEXICAL ORDER OF FIELDS MATTER!
//
// The key-authorization digest is computed over exactly this serialization, so servers must see
// the same bytes we hashed.
pub(crate) struct JwkThumb {
    e: String,
    kty: String,
    n: String,
}

impl From<&Jwk> for JwkThumb {
    fn from(a: &Jwk) -> Self {
        JwkThumb {
            e: a.e.clone(),
            kty: a.kty.clone(),
            n: a.n.clone(),
        }
    }
}

/// Construct the compact `base64url(header).base64url(payload).base64url(signature)` token.
pub(crate) fn create_jwt<T: Serialize + ?Sized>(
    key: &AcmeKey,
    nonce: Option<String>,
    payload: &T,
) -> Result<String, Problem> {
    let protected = JwsProtectedHeader::new(Jwk::from(key), nonce);

    let header = {
        let json = serde_json::to_string(&protected).map_err(Problem::bad_json)?;
        util::base64url(&json)
    };

    let payload = {
        let json = serde_json::to_string(payload).map_err(Problem::bad_json)?;
        util::base64url(&json)
    };

    let to_sign = format!("{header}.{payload}");
    let signature = util::base64url(&key.sign(to_sign.as_bytes()));

    Ok(format!("{to_sign}.{signature}"))
}
