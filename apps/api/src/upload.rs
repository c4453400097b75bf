//! The upload payload shared by the relay handler and the submission controller.
//!
//! Both sides enforce the same limits; the constants here are the single source.

use std::path::Path;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
/// 5 MiB.
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_USER_INPUT_CHARS: usize = 500;

/// A file as received from a picker, a drop or an inbound multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub filename: String,
    pub media_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_pdf(&self) -> bool {
        is_pdf_media_type(&self.media_type)
    }

    /// Filename with directories and the last extension removed: `cv.final.pdf` -> `cv.final`.
    pub fn base_name(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("document")
    }

    /// Name the relay puts in its `Content-Disposition` header.
    pub fn attachment_filename(&self) -> String {
        format!("resume_{}", self.filename)
    }

    /// Name the client saves a returned PDF under.
    pub fn download_filename(&self) -> String {
        format!("resume_{}.pdf", self.base_name())
    }
}

/// One submission: the file plus the form fields that travel with it.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub file: UploadFile,
    pub target_role: Option<String>,
    pub user_input: String,
}

impl UploadRequest {
    /// Encodes the request as the multipart body both the relay and the backend accept.
    ///
    /// File bytes are passed through untouched. `user_input` is always present,
    /// `target_role` only when set.
    pub fn to_multipart(&self) -> Result<Form, reqwest::Error> {
        let part = Part::bytes(self.file.bytes.to_vec())
            .file_name(self.file.filename.clone())
            .mime_str(&self.file.media_type)?;

        let mut form = Form::new().part("file", part);
        if let Some(role) = &self.target_role {
            form = form.text("target_role", role.clone());
        }
        Ok(form.text("user_input", self.user_input.clone()))
    }
}

/// Compares the essence of a media type, ignoring parameters and case.
pub fn is_pdf_media_type(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE))
}

pub fn exceeds_file_limit(size: usize) -> bool {
    size > MAX_FILE_BYTES
}

/// Length is counted in characters, not bytes.
pub fn exceeds_user_input_limit(text: &str) -> bool {
    text.chars().count() > MAX_USER_INPUT_CHARS
}
