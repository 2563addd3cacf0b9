//! Upload validation: size limit and accepted file types.

use crate::error::ApiError;

/// Extensions accepted for upload (lowercase, with dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".png", ".jpg", ".jpeg"];

/// Declared content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["application/pdf", "image/png", "image/jpeg"];

/// Check an upload against the size limit, then against the allowed types.
///
/// A file passes the type check if either its extension or its declared
/// content type is allowed.
pub fn validate_upload(
    size: usize,
    filename: &str,
    content_type: Option<&str>,
    max_size: usize,
) -> Result<(), ApiError> {
    check_size(size, max_size)?;

    let ext_ok = extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    let type_ok = content_type
        .map(|ct| ALLOWED_CONTENT_TYPES.contains(&ct))
        .unwrap_or(false);

    if !ext_ok && !type_ok {
        return Err(ApiError::UnsupportedMediaType);
    }

    Ok(())
}

/// Reject files larger than `max_size` bytes.
pub fn check_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        tracing::debug!("Upload of {} bytes exceeds limit of {}", size, max_size);
        return Err(ApiError::PayloadTooLarge { max: max_size });
    }
    Ok(())
}

/// Lowercased extension including the leading dot, e.g. `.pdf`.
fn extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 10 * 1024 * 1024;

    #[test]
    fn test_accepts_known_extensions() {
        for name in ["a.pdf", "scan.PNG", "photo.jpg", "photo.JPEG"] {
            assert!(validate_upload(100, name, None, MAX).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_accepts_declared_type_with_unknown_extension() {
        assert!(validate_upload(100, "blob.bin", Some("application/pdf"), MAX).is_ok());
        assert!(validate_upload(100, "noext", Some("image/jpeg"), MAX).is_ok());
    }

    #[test]
    fn test_rejects_unknown_type() {
        let err = validate_upload(100, "notes.txt", Some("text/plain"), MAX).unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType));

        let err = validate_upload(100, "archive.tar.gz", None, MAX).unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(validate_upload(MAX, "a.pdf", None, MAX).is_ok());
        let err = validate_upload(MAX + 1, "a.pdf", None, MAX).unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { max } if max == MAX));
    }

    #[test]
    fn test_size_checked_before_type() {
        // Oversized and unsupported: size wins
        let err = validate_upload(MAX + 1, "notes.txt", Some("text/plain"), MAX).unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { .. }));
    }
}
