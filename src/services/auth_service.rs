//! Authentication service - registration, login and session tokens.
//!
//! Sessions are HS256-signed tokens naming the user id; the HTTP layer
//! carries them in a cookie.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{Availability, NewUser, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::with_transaction;

/// Hash verified when the email is unknown, so that both failure paths
/// cost one Argon2 verification.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    Password::new("dummy-password-for-timing")
        .map(Password::into_string)
        .unwrap_or_default()
});

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    /// Issued for a "remember me" login
    pub remember: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Signed session token plus the cookie lifetime that goes with it
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    /// `Some` for persistent ("remember me") sessions, `None` for
    /// browser-session cookies
    pub max_age_seconds: Option<i64>,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user after checking username/email availability
    async fn register(&self, new_user: NewUser) -> AppResult<User>;

    /// Check credentials; unknown email and wrong password both yield
    /// `InvalidCredentials`
    async fn login(&self, email: &str, password: &str) -> AppResult<User>;

    /// Issue a session token for an authenticated user
    fn issue_session(&self, user: &User, remember: bool) -> AppResult<SessionToken>;

    /// Verify a session token and extract claims
    fn verify_session(&self, token: &str) -> AppResult<Claims>;

    /// Resolve a session token to the user it names, if still valid
    async fn current_user(&self, token: &str) -> AppResult<Option<User>>;
}

/// Sign a session token for a user (shared helper)
fn generate_token(user: &User, remember: bool, config: &Config) -> AppResult<SessionToken> {
    let now = Utc::now();
    let lifetime = if remember {
        Duration::days(config.remember_days)
    } else {
        Duration::hours(config.session_hours)
    };

    let claims = Claims {
        sub: user.id,
        remember,
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret_bytes()),
    )?;

    Ok(SessionToken {
        token,
        max_age_seconds: remember.then(|| lifetime.num_seconds()),
    })
}

/// Verify a session token and extract claims (shared helper)
fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.session_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    /// Create new auth service instance with Unit of Work
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> AuthService for Authenticator<U> {
    async fn register(&self, new_user: NewUser) -> AppResult<User> {
        let password_hash = Password::new(&new_user.password)?.into_string();
        let NewUser { username, email, .. } = new_user;

        let user: User = with_transaction!(self.uow, |ctx| {
            let users = ctx.users();
            if let Availability::Taken(fields) =
                users.check_availability(&username, &email, None).await?
            {
                return Err(AppError::Taken(fields));
            }
            users.create(username, email, password_hash).await
        })?;

        tracing::info!(user_id = user.id, username = %user.username, "Registered new user");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self.uow.users().find_by_email(email).await?;

        let password_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => DUMMY_HASH.clone(),
        };
        let password_valid = Password::from_hash(password_hash).verify(password);

        match user {
            Some(user) if password_valid => {
                tracing::info!(user_id = user.id, "User logged in");
                Ok(user)
            }
            _ => {
                tracing::info!("Rejected login attempt");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    fn issue_session(&self, user: &User, remember: bool) -> AppResult<SessionToken> {
        generate_token(user, remember, &self.config)
    }

    fn verify_session(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }

    async fn current_user(&self, token: &str) -> AppResult<Option<User>> {
        let claims = match self.verify_session(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Ignoring invalid session token: {}", e);
                return Ok(None);
            }
        };

        self.uow.users().find_by_id(claims.sub).await
    }
}
