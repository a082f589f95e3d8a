use std::sync::Arc;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    api::Problem,
    jws,
    key::AcmeKey,
    req::{req_get, req_header, req_link_header, req_post, ReqResult},
};

/// JWS payload and nonce handling for requests to the API.
///
/// Every response may carry a `replay-nonce` header; the most recent one is kept in a
/// single-slot cache. A POST consumes the cached nonce to sign its token and the cache is
/// refilled from whatever response comes back, so the nonce of request *n* is always the one
/// observed on response *n - 1* and no nonce is used twice.
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    acme_key: AcmeKey,
    nonce: Arc<Mutex<Option<String>>>,
}

impl Transport {
    pub(crate) fn new(acme_key: AcmeKey) -> Self {
        Transport {
            acme_key,
            nonce: Arc::new(Mutex::new(None)),
        }
    }

    /// The key used in the transport.
    pub(crate) fn acme_key(&self) -> &AcmeKey {
        &self.acme_key
    }

    /// Perform an HTTPS GET and parse the reply.
    pub(crate) async fn get(&self, url: &str) -> ReqResult<AcmeResponse> {
        log::debug!("GET {url}");

        let res = req_get(url).await.map_err(Problem::connection)?;
        self.read_response(res).await
    }

    /// Sign `payload` with the account key and the cached nonce, then POST the token.
    pub(crate) async fn post<T>(&self, url: &str, payload: &T) -> ReqResult<AcmeResponse>
    where
        T: Serialize + ?Sized,
    {
        let nonce = self.nonce.lock().take();
        let token = jws::create_jwt(&self.acme_key, nonce, payload)?;

        log::debug!("POST {url}");

        let res = req_post(url, token).await.map_err(Problem::connection)?;
        self.read_response(res).await
    }

    async fn read_response(&self, res: reqwest::Response) -> ReqResult<AcmeResponse> {
        let status = res.status().as_u16();
        let location = req_header(&res, "location");
        let link = req_link_header(&res);
        let content_type = req_header(&res, "content-type").unwrap_or_default();

        if let Some(nonce) = req_header(&res, "replay-nonce") {
            log::trace!("Extracting new nonce");
            *self.nonce.lock() = Some(nonce);
        }

        let bytes = res.bytes().await.map_err(Problem::connection)?;

        let body = if bytes.is_empty() {
            Body::Empty
        } else if content_type.contains("json") {
            Body::Json(serde_json::from_slice(&bytes).map_err(Problem::bad_json)?)
        } else {
            Body::Bytes(bytes.to_vec())
        };

        log::trace!("{status} response, body: {body:?}");

        Ok(AcmeResponse {
            status,
            location,
            link,
            body,
        })
    }
}

/// Response body, tagged by what the `content-type` and length said it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Body {
    Json(Value),
    Bytes(Vec<u8>),
    Empty,
}

/// An API response reduced to the parts the protocol consumes.
#[derive(Debug, Clone)]
pub(crate) struct AcmeResponse {
    status: u16,
    location: Option<String>,
    link: Option<String>,
    body: Body,
}

impl AcmeResponse {
    pub(crate) fn status(&self) -> u16 {
        self.status
    }

    /// 1xx-3xx responses pass; 4xx and 5xx do not.
    pub(crate) fn is_ok(&self) -> bool {
        self.status < 400
    }

    pub(crate) fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub(crate) fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }

    pub(crate) fn json(&self) -> ReqResult<&Value> {
        match &self.body {
            Body::Json(value) => Ok(value),
            _ => Err(Problem::protocol("expected a JSON response body")),
        }
    }

    pub(crate) fn json_as<T: DeserializeOwned>(&self) -> ReqResult<T> {
        serde_json::from_value(self.json()?.clone()).map_err(Problem::bad_json)
    }

    /// Error view of this response, preferring the server's own problem document.
    pub(crate) fn problem(&self) -> Problem {
        let mut _type = None;
        let mut detail = None;

        if let Body::Json(value) = &self.body {
            _type = value.get("type").and_then(Value::as_str).map(str::to_owned);
            detail = value
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_owned);
        }

        Problem {
            _type: _type.unwrap_or_else(|| format!("httpStatus:{}", self.status)),
            detail,
            status: Some(self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api,
        test::{test_acme_key, with_directory_server},
    };

    #[tokio::test]
    async fn test_get_caches_nonce() {
        let server = with_directory_server();
        let transport = Transport::new(test_acme_key().clone());

        transport.get(&server.dir_url).await.unwrap();
        assert!(transport.nonce.lock().is_some());
    }

    #[tokio::test]
    async fn test_post_consumes_and_replaces_nonce() {
        let server = with_directory_server();
        let transport = Transport::new(test_acme_key().clone());

        transport.get(&server.dir_url).await.unwrap();
        let first = transport.nonce.lock().clone().unwrap();

        let res = transport
            .post(
                &server.path("/acme/new-reg"),
                &api::RegistrationUpdate::new_reg(None),
            )
            .await
            .unwrap();
        assert!(res.is_ok());

        let second = transport.nonce.lock().clone().unwrap();
        assert_ne!(first, second);

        let res = transport
            .post(
                &server.path("/acme/new-reg"),
                &api::RegistrationUpdate::new_reg(None),
            )
            .await
            .unwrap();
        assert!(res.is_ok());

        let third = transport.nonce.lock().clone().unwrap();
        assert_ne!(second, third);
    }

    #[tokio::test]
    async fn test_error_responses_carry_detail() {
        let server = with_directory_server();
        let transport = Transport::new(test_acme_key().clone());

        let res = transport.get(&server.path("/no-such-path")).await.unwrap();
        assert!(!res.is_ok());
        assert_eq!(res.problem().status, Some(404));
    }
}
