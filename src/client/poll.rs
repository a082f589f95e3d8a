//! Shared exponential backoff schedule for pending authorizations and delayed issuance.
//!
//! The retry factor doubles from 1 to 128, each wait lasting `factor * base_delay`. After the
//! eighth unsuccessful check the poller gives up, so with the default 500 ms base the total
//! scheduled delay stays under 128 seconds.

use std::time::Duration;

use serde_json::Value;

use crate::{
    api::Problem,
    req::ReqResult,
    trans::{Body, Transport},
};

pub(crate) const POLL_DELAY: Duration = Duration::from_millis(500);

const MAX_RETRY_FACTOR: u32 = 128;

/// GET `url` until its JSON `status` leaves `pending`, returning the final object.
///
/// Non-object responses end polling as a failure.
pub(crate) async fn poll_until_valid(
    transport: &Transport,
    url: &str,
    base_delay: Duration,
) -> ReqResult<Value> {
    let mut factor = 1u32;

    while factor <= MAX_RETRY_FACTOR {
        let res = transport.get(url).await?;

        match res.body() {
            Body::Json(value) if value.is_object() => {
                if value["status"] == "pending" {
                    log::debug!("Authorization still pending: {url}");
                } else {
                    return Ok(value.clone());
                }
            }
            _ => return Err(Problem::protocol(format!("expected a status object from {url}"))),
        }

        tokio::time::sleep(base_delay * factor).await;
        factor *= 2;
    }

    Err(Problem::poll_timeout(url))
}

/// GET `url` until a non-empty byte body (the certificate) appears.
///
/// Sub-400 responses without bytes reschedule; anything else ends polling as a failure.
pub(crate) async fn poll_until_issued(
    transport: &Transport,
    url: &str,
    base_delay: Duration,
) -> ReqResult<Vec<u8>> {
    let mut factor = 1u32;

    while factor <= MAX_RETRY_FACTOR {
        let res = transport.get(url).await?;

        match res.body() {
            Body::Bytes(bytes) if !bytes.is_empty() => return Ok(bytes.clone()),
            _ if res.is_ok() => log::debug!("Certificate not issued yet: {url}"),
            _ => return Err(res.problem()),
        }

        tokio::time::sleep(base_delay * factor).await;
        factor *= 2;
    }

    Err(Problem::poll_timeout(url))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::{
        key::AcmeKey,
        test::{test_rsa_key, with_server, ServerOptions, TEST_CERT},
    };

    fn test_transport() -> Transport {
        Transport::new(AcmeKey::from_key(test_rsa_key()))
    }

    #[tokio::test]
    async fn test_pending_authorization_reschedules() {
        let server = with_server(ServerOptions {
            pending_polls: 2,
            ..ServerOptions::default()
        });

        let status = poll_until_valid(
            &test_transport(),
            &server.path("/acme/authz/abc123"),
            Duration::from_millis(1),
        )
        .await
        .unwrap();

        assert_eq!(status["status"], "valid");
        assert_eq!(server.hits.authz_poll.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_authorization_poller_gives_up_after_eight_checks() {
        let server = with_server(ServerOptions {
            stuck_authorization: true,
            ..ServerOptions::default()
        });

        let err = poll_until_valid(
            &test_transport(),
            &server.path("/acme/authz/abc123"),
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        assert!(err.is_poll_timeout());
        assert_eq!(server.hits.authz_poll.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_issuance_poller_returns_bytes() {
        let server = with_server(ServerOptions {
            empty_cert_polls: 1,
            ..ServerOptions::default()
        });

        let cert = poll_until_issued(
            &test_transport(),
            &server.path("/acme/cert/1"),
            Duration::from_millis(1),
        )
        .await
        .unwrap();

        assert_eq!(cert, TEST_CERT);
        assert_eq!(server.hits.cert_poll.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_issuance_poller_gives_up_after_eight_checks() {
        let server = with_server(ServerOptions {
            stuck_certificate: true,
            ..ServerOptions::default()
        });

        let err = poll_until_issued(
            &test_transport(),
            &server.path("/acme/cert/1"),
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        assert!(err.is_poll_timeout());
        assert_eq!(server.hits.cert_poll.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_issuance_poller_fails_on_error_status() {
        let server = with_server(ServerOptions::default());

        let err = poll_until_issued(
            &test_transport(),
            &server.path("/no-such-cert"),
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, Some(404));
    }
}
