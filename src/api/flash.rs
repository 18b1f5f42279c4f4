//! One-shot flash messages carried in a cookie across a redirect.
//!
//! The queue is stored as base64url-encoded JSON. Rendering a page takes
//! the queue and clears the cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::config::FLASH_COOKIE;

/// Message category, used as the alert style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
    Info,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Danger => "danger",
            FlashLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn new(level: FlashLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Queue a message for the next rendered page.
pub fn push(jar: CookieJar, level: FlashLevel, text: impl Into<String>) -> CookieJar {
    let mut queue = pending(&jar);
    queue.push(FlashMessage::new(level, text));

    let cookie = Cookie::build((FLASH_COOKIE, encode(&queue)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    jar.add(cookie)
}

/// Remove and return all queued messages.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let queue = pending(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, queue);
    }

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, queue)
}

fn pending(jar: &CookieJar) -> Vec<FlashMessage> {
    jar.get(FLASH_COOKIE)
        .map(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

fn encode(queue: &[FlashMessage]) -> String {
    // Serializing plain strings and unit enums cannot fail.
    let json = serde_json::to_vec(queue).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Tampered or stale cookies decode to an empty queue.
fn decode(value: &str) -> Vec<FlashMessage> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}
