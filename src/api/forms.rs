//! HTML form payloads and their syntactic validation.
//!
//! Validation runs in two phases. The checks here only look at the
//! submitted values; uniqueness against stored users is decided by the
//! services and merged back in with [`FieldErrors::add_taken`].

use std::collections::BTreeMap;

use axum::extract::Multipart;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::domain::{picture_extension, AccountUpdate, NewUser, PictureUpload, UniqueField};
use crate::errors::{AppError, AppResult};

const REQUIRED: &str = "This field is required.";
const BAD_EXTENSION: &str = "File does not have an approved extension: jpg, png";

/// Error messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flag blank values; later checks on those fields are skipped.
    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
        }
    }

    /// Merge derive-based validation errors for fields not already flagged
    fn merge(&mut self, result: Result<(), ValidationErrors>) {
        let Err(errors) = result else {
            return;
        };

        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            if self.0.contains_key(&field) {
                continue;
            }
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                self.add(field.clone(), message);
            }
        }
    }

    /// Attach "already taken" messages from the uniqueness check
    pub fn add_taken(&mut self, fields: &[UniqueField]) {
        for field in fields {
            self.add(field.form_field(), field.taken_message());
        }
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Login form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Checkbox; present only when ticked
    #[serde(default)]
    pub remember: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        self.remember.is_some()
    }

    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("email", &self.email);
        errors.require("password", &self.password);
        errors.merge(self.validate());
        errors.into_result()
    }
}

/// Registration form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long."))]
    pub username: String,
    #[serde(default)]
    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Field cannot be longer than 120 characters.")
    )]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Field must be equal to password."))]
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("username", &self.username);
        errors.require("email", &self.email);
        errors.require("password", &self.password);
        errors.require("confirm_password", &self.confirm_password);
        errors.merge(self.validate());
        errors.into_result()
    }

    pub fn into_new_user(self) -> NewUser {
        NewUser {
            username: self.username,
            email: self.email,
            password: self.password,
        }
    }
}

/// Account edit form, submitted as multipart because of the picture
#[derive(Debug, Clone, Default, Validate)]
pub struct AccountForm {
    #[validate(length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long."))]
    pub username: String,
    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Field cannot be longer than 120 characters.")
    )]
    pub email: String,
    pub picture: Option<PictureUpload>,
}

impl AccountForm {
    /// Prefill from the account being edited
    pub fn prefilled(username: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            picture: None,
        }
    }

    /// Read the multipart body. A file input left empty is treated as
    /// "no new picture".
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "username" => form.username = field.text().await.map_err(bad_multipart)?,
                "email" => form.email = field.text().await.map_err(bad_multipart)?,
                "picture" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(bad_multipart)?;
                    if !file_name.is_empty() {
                        form.picture = Some(PictureUpload::new(file_name, bytes.to_vec()));
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("username", &self.username);
        errors.require("email", &self.email);
        errors.merge(self.validate());
        if let Some(picture) = &self.picture {
            if picture_extension(&picture.file_name).is_none() {
                errors.add("picture", BAD_EXTENSION);
            }
        }
        errors.into_result()
    }

    pub fn into_update(self) -> AccountUpdate {
        AccountUpdate {
            username: self.username,
            email: self.email,
            picture: self.picture,
        }
    }
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(err.to_string())
}
