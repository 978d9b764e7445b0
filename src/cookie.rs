//! Cookie helpers shared by the access gate and the page session.

use axum::http::{HeaderMap, HeaderValue, header};

/// Extract a cookie value from the Cookie header.
///
/// Empty values are reported as absent: a cleared cookie carries no credential.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value storing `value` under `name` for the whole site.
pub fn set_cookie(name: &str, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}={value}; Path=/; SameSite=Lax")).ok()
}

/// `Set-Cookie` value instructing the client to drop `name`.
pub fn expire_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}=; Path=/; Max-Age=0; SameSite=Lax")).ok()
}
