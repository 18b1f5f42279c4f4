//! Shared helpers for router-level tests.
//!
//! Every test gets its own in-memory SQLite database and picture directory.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use tempfile::TempDir;
use tower::ServiceExt;

use blog_accounts::api::{create_router, AppState};
use blog_accounts::config::Config;
use blog_accounts::domain::{Password, User};
use blog_accounts::infra::{Database, FsPictureStore, Persistence, UnitOfWork, UserRepository, UserStore};

pub const SECRET: &str = "integration-test-secret-at-least-32-chars";
pub const PASSWORD: &str = "correct horse battery";

/// One hash shared by all seeded users, so seeding stays fast.
static PASSWORD_HASH: Lazy<String> =
    Lazy::new(|| Password::new(PASSWORD).unwrap().into_string());

const BOUNDARY: &str = "blog-accounts-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub db: Arc<Database>,
    pub pictures: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let pictures = tempfile::tempdir().unwrap();
        let mut config = Config::new("sqlite::memory:", SECRET).unwrap();
        config.picture_dir = pictures.path().to_path_buf();

        let db = Arc::new(Database::connect(&config).await.unwrap());
        let store = Arc::new(FsPictureStore::new(pictures.path()));
        let state = AppState::from_config(db.clone(), config, store);

        Self {
            router: create_router(state),
            db,
            pictures,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        picture: Option<(&str, &[u8])>,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = multipart_body(fields, picture);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Register through the form
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Response<Body> {
        let body = format!(
            "username={}&email={}&password={}&confirm_password={}",
            encode(username),
            encode(email),
            encode(password),
            encode(password)
        );
        self.post_form("/register", &body, None).await
    }

    /// Log in through the form and return the `Cookie` header value
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body = format!("email={}&password={}", encode(email), encode(password));
        let response = self.post_form("/login", &body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login should set a session cookie")
    }

    /// Insert a user directly, bypassing the form and password hashing
    pub async fn seed_user(&self, username: &str) -> User {
        let username = username.to_string();
        let email = format!("{}@example.com", username);
        let hash = PASSWORD_HASH.clone();

        Persistence::new(self.db.get_connection())
            .transaction(|ctx| Box::pin(async move { ctx.users().create(username, email, hash).await }))
            .await
            .unwrap()
    }

    /// Seed a user and log in as them
    pub async fn seed_and_login(&self, username: &str) -> (User, String) {
        let user = self.seed_user(username).await;
        let cookie = self.login(&user.email, PASSWORD).await;
        (user, cookie)
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.db.get_connection())
    }

    pub async fn user_count(&self) -> u64 {
        self.users().list_page(1, 100).await.unwrap().1
    }

    pub async fn find_user(&self, id: i32) -> Option<User> {
        self.users().find_by_id(id).await.unwrap()
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn multipart_body(fields: &[(&str, &str)], picture: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = picture {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"picture\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Encoded image of the given size
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// All `Set-Cookie` headers of a response
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or_default().trim()
}

/// `name=value` of a non-empty cookie set by the response
pub fn cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(response)
        .iter()
        .map(|c| cookie_pair(c).to_string())
        .find(|pair| pair.starts_with(&prefix) && pair.len() > prefix.len())
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    cookie(response, "session")
}

pub fn flash_cookie(response: &Response<Body>) -> Option<String> {
    cookie(response, "flash")
}

/// Join cookie pairs into a `Cookie` header value
pub fn cookies(pairs: &[&str]) -> String {
    pairs.join("; ")
}
