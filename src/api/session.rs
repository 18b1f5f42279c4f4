//! Session cookie helpers.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::SESSION_COOKIE;
use crate::services::SessionToken;

/// Store a freshly issued session token.
///
/// Persistent sessions get a `Max-Age`; others live until the browser
/// session ends.
pub fn start(jar: CookieJar, session: SessionToken, secure: bool) -> CookieJar {
    let mut cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    if let Some(seconds) = session.max_age_seconds {
        cookie = cookie.max_age(time::Duration::seconds(seconds));
    }

    jar.add(cookie)
}

/// Drop the session cookie, whether or not one was sent.
pub fn end(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Raw session token sent by the client, if any.
pub fn token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}
