//! Profile picture storage.
//!
//! Pictures are written to a local directory under a random hex name that
//! keeps the upload's extension, after being thumbnailed to fit the
//! configured bounding box.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::config::{DEFAULT_IMAGE_FILE, PICTURE_MAX_DIMENSION, PICTURE_TOKEN_BYTES};
use crate::domain::PictureUpload;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Storage backend for uploaded profile pictures.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Store the picture and return the generated filename.
    async fn save(&self, upload: PictureUpload) -> AppResult<String>;

    /// Delete a previously stored picture. Missing files are not an error.
    async fn remove(&self, file_name: &str) -> AppResult<()>;
}

/// Writes thumbnails into a directory on the local filesystem.
pub struct FsPictureStore {
    dir: PathBuf,
    max_dimension: u32,
}

impl FsPictureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_dimension: PICTURE_MAX_DIMENSION,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the picture directory and, when missing, the placeholder
    /// picture new accounts point at.
    pub async fn ensure_default(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::internal(format!("Cannot create {}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(DEFAULT_IMAGE_FILE);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        let size = self.max_dimension;
        tokio::task::spawn_blocking(move || {
            let placeholder = RgbImage::from_pixel(size, size, Rgb([200, 200, 200]));
            placeholder
                .save_with_format(&path, ImageFormat::Jpeg)
                .map_err(|e| AppError::internal(format!("Cannot write {}: {}", path.display(), e)))
        })
        .await
        .map_err(|e| AppError::internal(format!("Picture task failed: {}", e)))??;

        tracing::info!(dir = %self.dir.display(), "Created default profile picture");
        Ok(())
    }
}

#[async_trait]
impl PictureStore for FsPictureStore {
    async fn save(&self, upload: PictureUpload) -> AppResult<String> {
        let extension = upload
            .extension()
            .ok_or_else(|| AppError::validation("File does not have an approved extension: jpg, png"))?
            .to_string();
        let format = ImageFormat::from_extension(&extension)
            .ok_or_else(|| AppError::validation(format!("Unsupported image type: {}", extension)))?;

        let file_name = format!("{}.{}", random_token(), extension);
        let path = self.dir.join(&file_name);
        let max_dimension = self.max_dimension;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::internal(format!("Cannot create {}: {}", self.dir.display(), e)))?;

        tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&upload.bytes)
                .map_err(|_| AppError::validation("Uploaded file is not a valid image"))?;
            let thumbnail = encodable(fit_within(image, max_dimension), format);

            thumbnail
                .save_with_format(&path, format)
                .map_err(|e| AppError::internal(format!("Cannot write {}: {}", path.display(), e)))
        })
        .await
        .map_err(|e| AppError::internal(format!("Picture task failed: {}", e)))??;

        tracing::info!(file = %file_name, "Stored profile picture");

        Ok(file_name)
    }

    async fn remove(&self, file_name: &str) -> AppResult<()> {
        let path = self.dir.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file = %file_name, "Removed profile picture");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::internal(format!("Cannot remove {}: {}", path.display(), e))),
        }
    }
}

/// Random hex token used as picture file stem.
fn random_token() -> String {
    let bytes: [u8; PICTURE_TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Shrink `image` so neither side exceeds `max_dimension`, keeping the aspect
/// ratio. Images already inside the box are left untouched.
fn fit_within(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    if image.width() <= max_dimension && image.height() <= max_dimension {
        return image;
    }
    image.thumbnail(max_dimension, max_dimension)
}

/// JPEG has no alpha channel.
fn encodable(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    }
}
