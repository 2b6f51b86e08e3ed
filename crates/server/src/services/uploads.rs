//! Image uploads stored under the data directory.
//!
//! Stored paths are relative to the data directory (`product_images/7.jpg`)
//! so they can be served as-is under the matching URL prefix.

use std::path::Path;

use thiserror::Error;

/// Directory for product images.
pub const PRODUCT_IMAGES: &str = "product_images";
/// Directory for profile pictures.
pub const PROFILE_PICTURES: &str = "profile_pictures";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Upper bound on an uploaded image.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported image type")]
    UnsupportedType,

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Uploaded file is too large")]
    TooLarge,

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Lowercased extension of an uploaded file name, if it is an allowed
/// image type.
#[must_use]
pub fn image_extension(file_name: Option<&str>) -> Option<String> {
    let ext = Path::new(file_name?).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Check an upload's type and size without writing it. Returns the
/// extension it will be stored under.
///
/// # Errors
///
/// Returns `UploadError::UnsupportedType` if `file_name` has no allowed
/// image extension, and `UploadError::Empty` or `UploadError::TooLarge`
/// for the size checks.
pub fn validate_image(file_name: Option<&str>, bytes: &[u8]) -> Result<String, UploadError> {
    let ext = image_extension(file_name).ok_or(UploadError::UnsupportedType)?;
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }
    Ok(ext)
}

/// Write `bytes` to `<data_dir>/<dir>/<stem>.<ext>` and return the relative
/// path.
///
/// # Errors
///
/// Returns the [`validate_image`] errors, and `UploadError::Io` if writing
/// fails.
pub async fn store_image(
    data_dir: &Path,
    dir: &str,
    stem: &str,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<String, UploadError> {
    let ext = validate_image(file_name, bytes)?;

    let relative = format!("{dir}/{stem}.{ext}");
    let target_dir = data_dir.join(dir);
    tokio::fs::create_dir_all(&target_dir).await?;
    tokio::fs::write(data_dir.join(&relative), bytes).await?;

    tracing::debug!(path = %relative, size = bytes.len(), "stored upload");
    Ok(relative)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension(Some("photo.JPG")).as_deref(), Some("jpg"));
        assert_eq!(image_extension(Some("a.b.webp")).as_deref(), Some("webp"));
        assert_eq!(image_extension(Some("script.sh")), None);
        assert_eq!(image_extension(Some("noext")), None);
        assert_eq!(image_extension(Some("../../etc/passwd")), None);
        assert_eq!(image_extension(None), None);
    }

    #[tokio::test]
    async fn test_store_image_writes_relative_path() {
        let dir = std::env::temp_dir().join(format!("live-mart-upload-{}", uuid::Uuid::new_v4()));
        let path = store_image(&dir, PRODUCT_IMAGES, "42", Some("shot.png"), b"\x89PNG")
            .await
            .unwrap();

        assert_eq!(path, "product_images/42.png");
        assert_eq!(tokio::fs::read(dir.join(&path)).await.unwrap(), b"\x89PNG");
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_image_rejects_bad_input() {
        let dir = std::env::temp_dir();
        assert!(matches!(
            store_image(&dir, PRODUCT_IMAGES, "1", Some("x.exe"), b"MZ").await,
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            store_image(&dir, PRODUCT_IMAGES, "1", Some("x.png"), b"").await,
            Err(UploadError::Empty)
        ));
    }

    #[test]
    fn test_validate_image_size_limit() {
        let at_limit = vec![0_u8; MAX_UPLOAD_BYTES];
        assert_eq!(validate_image(Some("big.png"), &at_limit).unwrap(), "png");

        let over_limit = vec![0_u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            validate_image(Some("big.png"), &over_limit),
            Err(UploadError::TooLarge)
        ));
    }
}
