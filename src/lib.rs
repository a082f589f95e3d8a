//! Client for the early-draft ACME (Automatic Certificate Management Environment) protocol as
//! deployed by the original Let's Encrypt v01 endpoints.
//!
//! The targeted draft predates [RFC 8555]: resources are named `new-reg`, `new-authz` and
//! `new-cert`, every authenticated request is signed with an RSA account key as an RS256 JWS
//! token, and domain control is proven with the `http-01` challenge by publishing a
//! key-authorization file under the site's `/.well-known/acme-challenge/` path.
//!
//! # Usage
//!
//! The entry point is [`AcmeClient`], configured through [`Config`]. The four top-level
//! operations are:
//!
//! - [`AcmeClient::get_profile()`] — fetch the account profile held by the server,
//! - [`AcmeClient::create_account()`] — register a new account,
//! - [`AcmeClient::authorize_domain()`] — prove control of a DNS name,
//! - [`AcmeClient::request_certificate()`] — submit a CSR and obtain the certificate.
//!
//! # Domain Ownership
//!
//! The `http-01` challenge requires that the key-authorization file written below the configured
//! webroot is reachable as `http://<domain>/.well-known/acme-challenge/<token>` before the
//! challenge is accepted. When [`Config::with_interaction`] is set, the client pauses between
//! writing the file and accepting the challenge so the operator can move it into place.
//!
//! # Rate Limits
//!
//! Let's Encrypt style providers rate limit aggressively. Develop against a staging directory
//! ([`DirectoryUrl::LetsEncryptStaging`]) rather than the production endpoint.
//!
//! [RFC 8555]: https://datatracker.ietf.org/doc/html/rfc8555

#![deny(rust_2018_idioms, nonstandard_style, future_incompatible)]

mod cert;
mod error;
mod jws;
mod key;
mod req;
mod trans;
mod util;

pub mod api;
pub mod client;
pub mod keygen;


pub use crate::{
    cert::{create_rsa_key, Certificate},
    client::{AcmeClient, Config, DirectoryUrl},
    keygen::{KeyGenerator, OpensslKeyGen},
    util::safe_name,
};
