//! Axum route handler for the upload relay.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::outcome::RelayOutcome;
use crate::state::AppState;
use crate::upload::{
    exceeds_file_limit, exceeds_user_input_limit, is_pdf_media_type, UploadFile, UploadRequest,
    PDF_MEDIA_TYPE,
};

pub const NO_FILE: &str = "No file uploaded";
pub const MULTIPLE_FILES: &str = "Only one file may be uploaded";
pub const NOT_PDF: &str = "Only PDF files are supported";
pub const FILE_TOO_LARGE: &str = "File too large";
pub const USER_INPUT_TOO_LONG: &str = "User input must be 500 characters or fewer";
pub const ROLE_REQUIRED: &str = "Target role is required";

/// POST /api/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let request = read_upload(multipart, state.config.require_target_role).await?;

    info!(
        filename = %request.file.filename,
        size = request.file.size(),
        target_role = request.target_role.as_deref().unwrap_or(""),
        "Relaying upload to {}",
        state.backend.upload_url()
    );

    match state.backend.forward(&request).await? {
        RelayOutcome::Binary {
            bytes,
            suggested_filename,
        } => Ok(pdf_response(bytes, &suggested_filename)),
        RelayOutcome::Structured { raw, .. } => {
            Ok(([(header::CONTENT_TYPE, "application/json")], raw).into_response())
        }
        RelayOutcome::Failure { status, message } => Err(AppError::Backend { status, message }),
    }
}

/// Decodes and validates the inbound form.
///
/// The media type is checked from the part headers before the body is read,
/// so a non-PDF is rejected without buffering it.
pub async fn read_upload(
    mut multipart: Multipart,
    require_target_role: bool,
) -> Result<UploadRequest, AppError> {
    let mut file: Option<UploadFile> = None;
    let mut target_role: Option<String> = None;
    let mut user_input = String::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                if file.is_some() {
                    return Err(AppError::Validation(MULTIPLE_FILES.to_string()));
                }
                let filename = field.file_name().unwrap_or("resume.pdf").to_string();
                let media_type = field.content_type().unwrap_or_default().to_string();
                if !is_pdf_media_type(&media_type) {
                    return Err(AppError::Validation(NOT_PDF.to_string()));
                }
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if exceeds_file_limit(bytes.len()) {
                    return Err(AppError::PayloadTooLarge(FILE_TOO_LARGE.to_string()));
                }
                file = Some(UploadFile::new(filename, media_type, bytes));
            }
            Some("target_role") => {
                let role = field.text().await.map_err(multipart_error)?;
                target_role = (!role.trim().is_empty()).then_some(role);
            }
            Some("user_input") => {
                user_input = field.text().await.map_err(multipart_error)?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation(NO_FILE.to_string()))?;
    if exceeds_user_input_limit(&user_input) {
        return Err(AppError::Validation(USER_INPUT_TOO_LONG.to_string()));
    }
    if require_target_role && target_role.is_none() {
        return Err(AppError::Validation(ROLE_REQUIRED.to_string()));
    }

    Ok(UploadRequest {
        file,
        target_role,
        user_input,
    })
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(FILE_TOO_LARGE.to_string())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

fn pdf_response(bytes: Bytes, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, PDF_MEDIA_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        bytes,
    )
        .into_response()
}

/// `attachment` disposition. Names that do not survive as a quoted ASCII
/// parameter also get an RFC 6266 `filename*` carrying the exact UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback = header_safe_filename(filename);
    if fallback == filename {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    }
}

/// Replaces characters that would break a quoted header parameter.
fn header_safe_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
