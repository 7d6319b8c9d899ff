//! Minimal cookie handling for the session tokens
//!
//! The session state is three cookies: the bearer access token, the
//! refresh token, and the transient OAuth state nonce. Session hardening
//! beyond `HttpOnly` is out of scope here; the credential lifecycle
//! belongs to the accounts service.

use axum::http::{header, HeaderMap};

/// Returns the value of the named cookie, if present
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(text) = value.to_str() else { continue };
        for pair in text.split(';') {
            if let Some((key, value)) = pair.trim().split_once('=') {
                if key == name {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Builds a `Set-Cookie` value for a session cookie
pub fn set(name: &str, value: &str) -> String {
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax")
}

/// Builds a `Set-Cookie` value that removes the named cookie
pub fn clear(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0")
}
