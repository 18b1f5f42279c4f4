//! User domain entity and related types.

use serde::{Deserialize, Serialize};

use super::picture::PictureUpload;
use crate::config::{DEFAULT_IMAGE_FILE, PICTURE_URL_PREFIX};

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub image_file: String,
}

impl User {
    /// Create a not-yet-persisted user with the default picture
    pub fn new(id: i32, username: String, email: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            image_file: DEFAULT_IMAGE_FILE.to_string(),
        }
    }

    /// Whether this user is the owner of the account with the given id
    pub fn owns(&self, account_id: i32) -> bool {
        self.id == account_id
    }

    /// Public URL of the user's profile picture
    pub fn image_url(&self) -> String {
        format!("{}/{}", PICTURE_URL_PREFIX, self.image_file)
    }
}

/// Registration data after syntactic validation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Account update data after syntactic validation.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub username: String,
    pub email: String,
    /// New picture; `None` keeps the current image reference
    pub picture: Option<PictureUpload>,
}

/// Fields that must be unique across all users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    /// Name of the form field this constraint belongs to
    pub fn form_field(&self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        }
    }

    /// Message shown next to the offending form field
    pub fn taken_message(&self) -> &'static str {
        match self {
            UniqueField::Username => "That username is taken, choose another one!",
            UniqueField::Email => "That email address is taken, choose another one!",
        }
    }
}

/// Outcome of checking a username/email pair against existing users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Taken(Vec<UniqueField>),
}

impl Availability {
    /// Build from the users currently holding the username and the email,
    /// ignoring matches on `exclude` (the account being edited).
    pub fn from_matches(
        username_owner: Option<i32>,
        email_owner: Option<i32>,
        exclude: Option<i32>,
    ) -> Self {
        let collides = |owner: Option<i32>| owner.is_some_and(|id| Some(id) != exclude);

        let mut taken = Vec::new();
        if collides(username_owner) {
            taken.push(UniqueField::Username);
        }
        if collides(email_owner) {
            taken.push(UniqueField::Email);
        }

        if taken.is_empty() {
            Availability::Available
        } else {
            Availability::Taken(taken)
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}
