use std::{sync::OnceLock, time::Duration};

use crate::api::Problem;

pub(crate) type ReqResult<T> = std::result::Result<T, Problem>;

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP client construction only fails on malformed builder options")
    })
}

pub(crate) async fn req_get(url: &str) -> Result<reqwest::Response, reqwest::Error> {
    let req = http_client().get(url);
    log::trace!("{req:?}");
    req.send().await
}

pub(crate) async fn req_post(url: &str, body: String) -> Result<reqwest::Response, reqwest::Error> {
    let req = http_client()
        .post(url)
        .header("content-type", "application/jose");
    log::trace!("{req:?} {body}");
    req.body(body).send().await
}

pub(crate) fn req_header(res: &reqwest::Response, name: &str) -> Option<String> {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_owned())
}

/// All `link` header values joined into one string, since the draft servers send several.
pub(crate) fn req_link_header(res: &reqwest::Response) -> Option<String> {
    let values = res
        .headers()
        .get_all("link")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}
