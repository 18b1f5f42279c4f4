//! Account handlers: profile page, edit form and account listing.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::flash::{self, FlashLevel, FlashMessage};
use crate::api::forms::{AccountForm, FieldErrors};
use crate::api::middleware::AuthUser;
use crate::api::{views, AppState};
use crate::domain::User;
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

/// Create account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/:id", get(show_account))
        .route("/account/:id/edit", get(edit_form).post(update_account))
        .route("/accounts", get(list_accounts))
}

/// Non-numeric ids are treated like unknown ones.
fn parse_id(raw: &str) -> AppResult<i32> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Redirect a user who tried to edit someone else's account.
fn deny_edit(jar: CookieJar, current: &User, account_id: i32) -> Response {
    tracing::warn!(
        user_id = current.id,
        account_id,
        "Blocked edit of another user's account"
    );
    let jar = flash::push(
        jar,
        FlashLevel::Danger,
        "You must be authenticated as this user to update their info!",
    );

    (jar, Redirect::to(&format!("/account/{}", account_id))).into_response()
}

fn render_edit(
    jar: CookieJar,
    current: &User,
    account: &User,
    form: &AccountForm,
    errors: &FieldErrors,
    flashes: &[FlashMessage],
) -> Response {
    let page = views::account_edit_page(current, account, form, errors, flashes);
    (jar, Html(page)).into_response()
}

/// Show an account
pub async fn show_account(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    jar: CookieJar,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let account = state.account_service.get_account(parse_id(&id)?).await?;

    let (jar, flashes) = flash::take(jar);
    let page = views::account_page(&current, &account, &flashes);

    Ok((jar, Html(page)).into_response())
}

/// Show the edit form, prefilled with the stored values
pub async fn edit_form(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    jar: CookieJar,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let account = state.account_service.get_account(parse_id(&id)?).await?;
    if !current.owns(account.id) {
        return Ok(deny_edit(jar, &current, account.id));
    }

    let (jar, flashes) = flash::take(jar);
    let form = AccountForm::prefilled(&account.username, &account.email);

    Ok(render_edit(jar, &current, &account, &form, &FieldErrors::new(), &flashes))
}

/// Apply the submitted edit form
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    jar: CookieJar,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let account = state.account_service.get_account(parse_id(&id)?).await?;
    if !current.owns(account.id) {
        return Ok(deny_edit(jar, &current, account.id));
    }

    let form = AccountForm::from_multipart(multipart).await?;
    let (jar, flashes) = flash::take(jar);

    if let Err(errors) = form.check() {
        return Ok(render_edit(jar, &current, &account, &form, &errors, &flashes));
    }

    let entered = AccountForm::prefilled(&form.username, &form.email);
    let mut errors = FieldErrors::new();

    match state
        .account_service
        .update_account(current.id, account.id, form.into_update())
        .await
    {
        Ok(updated) => {
            let jar = flash::push(jar, FlashLevel::Success, "Your account has been updated!");
            Ok((jar, Redirect::to(&format!("/account/{}", updated.id))).into_response())
        }
        Err(AppError::Taken(fields)) => {
            errors.add_taken(&fields);
            Ok(render_edit(jar, &current, &account, &entered, &errors, &flashes))
        }
        Err(AppError::Validation(message)) => {
            errors.add("picture", message);
            Ok(render_edit(jar, &current, &account, &entered, &errors, &flashes))
        }
        Err(AppError::Forbidden) => Ok(deny_edit(jar, &current, account.id)),
        Err(e) => Err(e),
    }
}

/// Paginated list of all accounts, newest first
pub async fn list_accounts(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    jar: CookieJar,
    Query(params): Query<PaginationParams>,
) -> AppResult<Response> {
    let page = state.account_service.list_accounts(params.page()).await?;

    let (jar, flashes) = flash::take(jar);
    let html = views::accounts_page(&current, &page, &flashes);

    Ok((jar, Html(html)).into_response())
}
