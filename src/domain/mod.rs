//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.

pub mod password;
pub mod picture;
pub mod user;

pub use password::Password;
pub use picture::{picture_extension, PictureUpload};
pub use user::{AccountUpdate, Availability, NewUser, UniqueField, User};
