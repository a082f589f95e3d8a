use std::sync::OnceLock;

use base64::prelude::*;
use regex::Regex;

pub(crate) fn base64url<T: ?Sized + AsRef<[u8]>>(input: &T) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(input)
}

/// Percent-encode the characters that are unsafe in file names.
///
/// The forbidden class is `< > : " / \ | ? *` plus all control characters (C0, DEL and C1).
/// With `allow_path`, `/` stays intact so the result can still address into directories.
/// Encoded characters become `%` followed by the code point in uppercase hex, without zero
/// padding, matching the file names historically produced for stored artifacts.
pub fn safe_name(name: &str, allow_path: bool) -> String {
    let mut out = String::with_capacity(name.len());

    for ch in name.chars() {
        let forbidden = match ch {
            '/' => !allow_path,
            '<' | '>' | ':' | '"' | '\\' | '|' | '?' | '*' => true,
            _ => ch.is_control(),
        };

        if forbidden {
            out.push_str(&format!("%{:X}", ch as u32));
        } else {
            out.push(ch);
        }
    }

    out
}

/// Extract the terms-of-service URL from a `link` header value.
pub(crate) fn tos_link_from_link_header(header: &str) -> Option<String> {
    static RE_TOS: OnceLock<Regex> = OnceLock::new();

    let re = RE_TOS
        .get_or_init(|| Regex::new(r#"<([^>]+)>;rel="terms-of-service""#).expect("valid regex"));

    re.captures(header).map(|caps| caps[1].to_owned())
}
