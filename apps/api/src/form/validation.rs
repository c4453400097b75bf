use thiserror::Error;

use crate::upload::{exceeds_file_limit, is_pdf_media_type};

/// Why a chosen file was refused. The `Display` text is shown to the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("Only PDF files are supported.")]
    NotPdf,

    #[error("File size must be less than 5MB.")]
    TooLarge,
}

/// The two facts validation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDescriptor<'a> {
    pub media_type: &'a str,
    pub size: usize,
}

/// Type first, then size; the first failing check wins.
pub fn validate_file(file: FileDescriptor<'_>) -> Result<(), FileRejection> {
    if !is_pdf_media_type(file.media_type) {
        return Err(FileRejection::NotPdf);
    }
    if exceeds_file_limit(file.size) {
        return Err(FileRejection::TooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::MAX_FILE_BYTES;

    fn descriptor(media_type: &str, size: usize) -> FileDescriptor<'_> {
        FileDescriptor { media_type, size }
    }

    #[test]
    fn test_accepts_pdf_within_limit() {
        assert_eq!(validate_file(descriptor("application/pdf", 1024 * 1024)), Ok(()));
        assert_eq!(validate_file(descriptor("application/pdf", MAX_FILE_BYTES)), Ok(()));
        assert_eq!(validate_file(descriptor("application/pdf", 0)), Ok(()));
    }

    #[test]
    fn test_rejects_non_pdf() {
        for media_type in ["image/png", "application/msword", "text/plain", ""] {
            assert_eq!(
                validate_file(descriptor(media_type, 10)),
                Err(FileRejection::NotPdf)
            );
        }
    }

    #[test]
    fn test_type_check_wins_over_size() {
        assert_eq!(
            validate_file(descriptor("image/png", 6 * 1024 * 1024)),
            Err(FileRejection::NotPdf)
        );
    }

    #[test]
    fn test_rejects_oversized_pdf() {
        assert_eq!(
            validate_file(descriptor("application/pdf", MAX_FILE_BYTES + 1)),
            Err(FileRejection::TooLarge)
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let file = descriptor("application/pdf", 6 * 1024 * 1024);
        assert_eq!(validate_file(file), validate_file(file));
        let file = descriptor("application/pdf", 100);
        assert_eq!(validate_file(file), validate_file(file));
    }

    #[test]
    fn test_messages() {
        assert_eq!(FileRejection::NotPdf.to_string(), "Only PDF files are supported.");
        assert_eq!(FileRejection::TooLarge.to_string(), "File size must be less than 5MB.");
    }
}
