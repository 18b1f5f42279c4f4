//! HTML page rendering.
//!
//! Pages are assembled with `format!` around a shared layout. Every value
//! that came from a user goes through [`escape`].

use axum::http::StatusCode;

use super::flash::FlashMessage;
use super::forms::{AccountForm, FieldErrors, LoginForm, RegisterForm};
use crate::domain::User;
use crate::types::Paginated;

/// Escape text for use in HTML content and quoted attributes
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn url_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Page chrome: navigation for the current visitor plus flashed messages
pub fn layout(title: &str, current_user: Option<&User>, flashes: &[FlashMessage], content: &str) -> String {
    let nav = match current_user {
        Some(user) => format!(
            r#"<a href="/account/{id}">Account</a>
      <a href="/accounts">Accounts</a>
      <a href="/logout">Logout</a>"#,
            id = user.id
        ),
        None => r#"<a href="/login">Login</a>
      <a href="/register">Register</a>"#
            .to_string(),
    };

    let messages: String = flashes
        .iter()
        .map(|flash| {
            format!(
                "\n    <div class=\"alert alert-{}\">{}</div>",
                flash.level.as_str(),
                escape(&flash.text)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Blog - {title}</title>
</head>
<body>
  <header>
    <nav>
      {nav}
    </nav>
  </header>
  <main>{messages}
{content}
  </main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn field_errors(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .iter()
        .map(|message| format!("\n        <span class=\"invalid-feedback\">{}</span>", escape(message)))
        .collect()
}

fn input(label: &str, kind: &str, name: &str, value: &str, errors: &FieldErrors) -> String {
    let value = if kind == "password" {
        String::new()
    } else {
        format!(" value=\"{}\"", escape(value))
    };

    format!(
        r#"      <div class="form-group">
        <label for="{name}">{label}</label>
        <input type="{kind}" id="{name}" name="{name}"{value}>{errors}
      </div>
"#,
        errors = field_errors(errors, name),
    )
}

pub fn login_page(
    flashes: &[FlashMessage],
    form: &LoginForm,
    errors: &FieldErrors,
    next: Option<&str>,
) -> String {
    let action = match next {
        Some(next) => format!("/login?next={}", url_encode(next)),
        None => "/login".to_string(),
    };
    let remember = if form.remember() { " checked" } else { "" };

    let content = format!(
        r#"    <form method="POST" action="{action}">
      <h1>Log In</h1>
{email}{password}      <div class="form-check">
        <input type="checkbox" id="remember" name="remember" value="y"{remember}>
        <label for="remember">Remember Me</label>
      </div>
      <button type="submit">Login</button>
    </form>
    <p>Need an account? <a href="/register">Sign Up Now</a></p>"#,
        action = escape(&action),
        email = input("Email", "email", "email", &form.email, errors),
        password = input("Password", "password", "password", "", errors),
    );

    layout("Login", None, flashes, &content)
}

pub fn register_page(flashes: &[FlashMessage], form: &RegisterForm, errors: &FieldErrors) -> String {
    let content = format!(
        r#"    <form method="POST" action="/register">
      <h1>Join Today</h1>
{username}{email}{password}{confirm}      <button type="submit">Sign Up</button>
    </form>
    <p>Already have an account? <a href="/login">Sign In</a></p>"#,
        username = input("Username", "text", "username", &form.username, errors),
        email = input("Email", "email", "email", &form.email, errors),
        password = input("Password", "password", "password", "", errors),
        confirm = input("Confirm Password", "password", "confirm_password", "", errors),
    );

    layout("Register", None, flashes, &content)
}

fn profile_card(account: &User) -> String {
    format!(
        r#"    <div class="account">
      <img class="account-img" src="{image}" alt="">
      <h2 class="account-heading">{username}</h2>
      <p class="account-email">{email}</p>
    </div>"#,
        image = escape(&account.image_url()),
        username = escape(&account.username),
        email = escape(&account.email),
    )
}

pub fn account_page(current_user: &User, account: &User, flashes: &[FlashMessage]) -> String {
    let edit_link = if current_user.owns(account.id) {
        format!(
            "\n    <a href=\"/account/{}/edit\">Update Account</a>",
            account.id
        )
    } else {
        String::new()
    };

    let content = format!("{}{}", profile_card(account), edit_link);

    layout(&account.username, Some(current_user), flashes, &content)
}

pub fn account_edit_page(
    current_user: &User,
    account: &User,
    form: &AccountForm,
    errors: &FieldErrors,
    flashes: &[FlashMessage],
) -> String {
    let content = format!(
        r#"{card}
    <form method="POST" action="/account/{id}/edit" enctype="multipart/form-data">
      <h1>Account Info</h1>
{username}{email}      <div class="form-group">
        <label for="picture">Update Profile Picture</label>
        <input type="file" id="picture" name="picture" accept=".jpg,.png">{picture_errors}
      </div>
      <button type="submit">Update</button>
    </form>"#,
        card = profile_card(account),
        id = account.id,
        username = input("Username", "text", "username", &form.username, errors),
        email = input("Email", "email", "email", &form.email, errors),
        picture_errors = field_errors(errors, "picture"),
    );

    layout("Account", Some(current_user), flashes, &content)
}

pub fn accounts_page(current_user: &User, page: &Paginated<User>, flashes: &[FlashMessage]) -> String {
    let rows: String = page
        .items
        .iter()
        .map(|account| {
            format!(
                r#"
      <li>
        <img class="rounded-circle" src="{image}" alt="">
        <a href="/account/{id}">{username}</a>
        <span>{email}</span>
      </li>"#,
                image = escape(&account.image_url()),
                id = account.id,
                username = escape(&account.username),
                email = escape(&account.email),
            )
        })
        .collect();

    let content = format!(
        r#"    <h1>Accounts</h1>
    <ul class="accounts">{rows}
    </ul>
{nav}"#,
        nav = pagination_nav(page),
    );

    layout("Accounts", Some(current_user), flashes, &content)
}

fn pagination_nav<T>(page: &Paginated<T>) -> String {
    let mut links = Vec::new();

    if let Some(prev) = page.prev_num() {
        links.push(format!(r#"<a href="/accounts?page={}">Previous</a>"#, prev));
    }
    for link in page.page_links() {
        links.push(match link {
            Some(number) if number == page.page => {
                format!(r#"<a class="current" href="/accounts?page={0}">{0}</a>"#, number)
            }
            Some(number) => format!(r#"<a href="/accounts?page={0}">{0}</a>"#, number),
            None => "<span>...</span>".to_string(),
        });
    }
    if let Some(next) = page.next_num() {
        links.push(format!(r#"<a href="/accounts?page={}">Next</a>"#, next));
    }

    format!("    <nav class=\"pagination\">\n      {}\n    </nav>", links.join("\n      "))
}

/// Standalone error page; rendered without session context.
pub fn error_page(status: StatusCode, code: &str, message: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    let content = format!(
        r#"    <div class="error" data-code="{code}">
      <h1>{status} {reason}</h1>
      <p>{message}</p>
      <a href="/">Back to start</a>
    </div>"#,
        code = escape(code),
        status = status.as_u16(),
        message = escape(message),
    );

    layout(reason, None, &[], &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::flash::FlashLevel;

    fn user(id: i32, username: &str) -> User {
        User::new(id, username.into(), format!("{}@example.com", username), "hash".into())
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_layout_escapes_flash_text() {
        let flashes = [FlashMessage::new(FlashLevel::Danger, "<b>bad</b>")];
        let html = layout("Title", None, &flashes, "");

        assert!(html.contains(r#"<div class="alert alert-danger">&lt;b&gt;bad&lt;/b&gt;</div>"#));
    }

    #[test]
    fn test_account_page_escapes_username() {
        let viewer = user(1, "viewer");
        let account = user(2, "<img src=x>");

        let html = account_page(&viewer, &account, &[]);

        assert!(html.contains("&lt;img src=x&gt;"));
        assert!(!html.contains("<img src=x>"));
        assert!(!html.contains("Update Account"));
    }

    #[test]
    fn test_owner_sees_edit_link() {
        let owner = user(5, "owner");
        let html = account_page(&owner, &owner, &[]);

        assert!(html.contains(r#"<a href="/account/5/edit">Update Account</a>"#));
    }

    #[test]
    fn test_register_page_keeps_entries_but_not_passwords() {
        let form = RegisterForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
        };
        let mut errors = FieldErrors::new();
        errors.add("username", "That username is taken, choose another one!");

        let html = register_page(&[], &form, &errors);

        assert!(html.contains(r#"value="alice""#));
        assert!(html.contains(r#"value="alice@example.com""#));
        assert!(!html.contains("hunter22"));
        assert!(html.contains("That username is taken, choose another one!"));
    }

    #[test]
    fn test_login_form_keeps_next() {
        let html = login_page(&[], &LoginForm::default(), &FieldErrors::new(), Some("/accounts?page=2"));

        assert!(html.contains(r#"action="/login?next=%2Faccounts%3Fpage%3D2""#));
    }

    #[test]
    fn test_accounts_page_nav() {
        let viewer = user(1, "viewer");
        let page = Paginated::new(vec![user(6, "f"), user(5, "e"), user(4, "d")], 2, 3, 7);

        let html = accounts_page(&viewer, &page, &[]);

        assert!(html.contains(r#"<a href="/accounts?page=1">Previous</a>"#));
        assert!(html.contains(r#"<a href="/accounts?page=3">Next</a>"#));
        assert!(html.contains(r#"<a class="current" href="/accounts?page=2">2</a>"#));
    }

    #[test]
    fn test_error_page() {
        let html = error_page(StatusCode::NOT_FOUND, "NOT_FOUND", "The requested page could not be found");

        assert!(html.contains("404 Not Found"));
        assert!(html.contains("The requested page could not be found"));
    }
}
