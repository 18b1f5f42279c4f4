//! Session middleware and current-user extractors.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::{flash, session, AppState};
use crate::api::flash::FlashLevel;
use crate::domain::User;

/// Who is making the current request.
///
/// Inserted into the request extensions by [`session_middleware`] before
/// any handler runs.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    user: Option<User>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn into_user(self) -> Option<User> {
        self.user
    }
}

/// Session middleware.
///
/// Resolves the session cookie to a user and injects a [`SessionContext`]
/// into the request extensions. Invalid or stale cookies yield an
/// anonymous context.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match session::token(&jar) {
        Some(token) => match state.auth_service.current_user(token).await {
            Ok(Some(user)) => SessionContext::authenticated(user),
            Ok(None) => SessionContext::anonymous(),
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
                SessionContext::anonymous()
            }
        },
        None => SessionContext::anonymous(),
    };

    request.extensions_mut().insert(context);

    next.run(request).await
}

fn context(parts: &Parts) -> SessionContext {
    parts
        .extensions
        .get::<SessionContext>()
        .cloned()
        .unwrap_or_default()
}

/// Extractor for routes that require a logged-in user.
pub struct AuthUser(pub User);

/// Extractor for routes that behave differently for logged-in users.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = LoginRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match context(parts).into_user() {
            Some(user) => Ok(AuthUser(user)),
            None => Err(LoginRequired::new(parts)),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(context(parts).into_user()))
    }
}

/// Rejection sending anonymous visitors to the login page, remembering
/// where they were headed.
#[derive(Debug)]
pub struct LoginRequired {
    jar: CookieJar,
    next: String,
}

impl LoginRequired {
    fn new(parts: &Parts) -> Self {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            jar: CookieJar::from_headers(&parts.headers),
            next,
        }
    }

    /// Login URL carrying the original target
    pub fn location(&self) -> String {
        let next: String = url::form_urlencoded::byte_serialize(self.next.as_bytes()).collect();
        format!("/login?next={}", next)
    }
}

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        let location = self.location();
        tracing::debug!(next = %self.next, "Login required");

        let jar = flash::push(self.jar, FlashLevel::Info, "Please log in to access this page.");
        (jar, Redirect::to(&location)).into_response()
    }
}
