//! Authentication handlers: login, registration and logout.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::api::flash::{self, FlashLevel, FlashMessage};
use crate::api::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::api::middleware::MaybeUser;
use crate::api::{session, views, AppState};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

/// Query string of the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

impl NextParam {
    /// Redirect target after login, if it stays on this site
    fn safe(self) -> Option<String> {
        self.next.filter(|next| is_safe_next(next))
    }
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(login_form).post(login))
        .route("/login", get(login_form).post(login))
        .route("/register", get(register_form).post(register))
        .route("/logout", get(logout))
}

/// Whether `next` is a local path. Scheme-relative (`//host`) and
/// backslash variants are rejected, as are control characters: browsers
/// drop tabs and newlines from URLs, and they are invalid in a header.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

fn to_account(user: &User) -> Response {
    Redirect::to(&format!("/account/{}", user.id)).into_response()
}

/// Show the login form
pub async fn login_form(
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Query(params): Query<NextParam>,
) -> Response {
    if let Some(user) = user {
        return to_account(&user);
    }

    let (jar, flashes) = flash::take(jar);
    let next = params.safe();
    let page = views::login_page(&flashes, &LoginForm::default(), &FieldErrors::new(), next.as_deref());

    (jar, Html(page)).into_response()
}

/// Check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Query(params): Query<NextParam>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if let Some(user) = user {
        return Ok(to_account(&user));
    }

    let (jar, mut flashes) = flash::take(jar);
    let next = params.safe();

    if let Err(errors) = form.check() {
        let page = views::login_page(&flashes, &form, &errors, next.as_deref());
        return Ok((jar, Html(page)).into_response());
    }

    match state.auth_service.login(&form.email, &form.password).await {
        Ok(user) => {
            let token = state.auth_service.issue_session(&user, form.remember())?;
            let jar = session::start(jar, token, state.config.secure_cookies);
            let target = next.unwrap_or_else(|| format!("/account/{}", user.id));

            Ok((jar, Redirect::to(&target)).into_response())
        }
        Err(AppError::InvalidCredentials) => {
            flashes.push(FlashMessage::new(
                FlashLevel::Danger,
                "Username or password incorrect!",
            ));
            let page = views::login_page(&flashes, &form, &FieldErrors::new(), next.as_deref());

            Ok((jar, Html(page)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Show the registration form
pub async fn register_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> Response {
    if let Some(user) = user {
        return to_account(&user);
    }

    let (jar, flashes) = flash::take(jar);
    let page = views::register_page(&flashes, &RegisterForm::default(), &FieldErrors::new());

    (jar, Html(page)).into_response()
}

/// Create an account
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if let Some(user) = user {
        return Ok(to_account(&user));
    }

    let (jar, flashes) = flash::take(jar);

    if let Err(errors) = form.check() {
        let page = views::register_page(&flashes, &form, &errors);
        return Ok((jar, Html(page)).into_response());
    }

    match state.auth_service.register(form.clone().into_new_user()).await {
        Ok(_) => {
            let jar = flash::push(
                jar,
                FlashLevel::Success,
                "Your account has been created! You are now able to log in",
            );
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(AppError::Taken(fields)) => {
            let mut errors = FieldErrors::new();
            errors.add_taken(&fields);
            let page = views::register_page(&flashes, &form, &errors);

            Ok((jar, Html(page)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// End the session
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (session::end(jar), Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_paths_are_safe() {
        assert!(is_safe_next("/accounts"));
        assert!(is_safe_next("/account/3/edit?x=1"));
    }

    #[test]
    fn test_external_targets_are_unsafe() {
        assert!(!is_safe_next("https://evil.example.com/"));
        assert!(!is_safe_next("//evil.example.com"));
        assert!(!is_safe_next("/\\evil.example.com"));
        assert!(!is_safe_next("accounts"));
        assert!(!is_safe_next(""));
        assert!(!is_safe_next("/\t/evil.example.com"));
        assert!(!is_safe_next("/accounts\n"));
        assert!(!is_safe_next("/accounts\r\nSet-Cookie: x=1"));
        assert!(!is_safe_next("/\u{7f}"));
    }

    #[test]
    fn test_next_param_filtered() {
        let param = NextParam {
            next: Some("//evil.example.com".into()),
        };
        assert_eq!(param.safe(), None);

        let param = NextParam {
            next: Some("/accounts?page=2".into()),
        };
        assert_eq!(param.safe().as_deref(), Some("/accounts?page=2"));
    }
}
