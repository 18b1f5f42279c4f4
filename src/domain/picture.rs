//! Uploaded profile picture.

use std::path::Path;

use crate::config::ALLOWED_PICTURE_EXTENSIONS;

/// A picture file received from a form upload.
#[derive(Clone, PartialEq, Eq)]
pub struct PictureUpload {
    /// Client-supplied file name, only used for its extension
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PictureUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PictureUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PictureUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Extension as written by the client, if it is on the allow-list
    pub fn extension(&self) -> Option<&str> {
        picture_extension(&self.file_name)
    }
}

/// Return the extension of `file_name` (original casing) when it is one of
/// the accepted picture types, compared case-insensitively.
pub fn picture_extension(file_name: &str) -> Option<&str> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    ALLOWED_PICTURE_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        .then_some(ext)
}
