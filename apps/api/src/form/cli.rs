//! Headless run of the form: one submission plus a bounded number of retries.
//!
//! The `resume-submit` binary parses arguments and prints; everything it
//! decides lives here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::form::controller::FormController;
use crate::form::download::DownloadSink;
use crate::form::messages::RETRYING;
use crate::form::state::{Action, FileSource, Notice, SubmissionOutcome};
use crate::form::transport::UploadTransport;
use crate::form::validation::FileRejection;
use crate::upload::{UploadFile, PDF_MEDIA_TYPE};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// What the user filled in besides the file.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub role: Option<String>,
    pub instructions: String,
    /// Retries after a failed submission. Zero means a single attempt.
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    /// The file failed validation and nothing was sent.
    Rejected(FileRejection),
    /// The form refused to submit, e.g. a missing role.
    NotSubmitted,
    Structured(Value),
    /// A PDF came back. `None` when saving it failed.
    Saved(Option<PathBuf>),
    Failed(String),
}

impl SubmitResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitResult::Structured(_) | SubmitResult::Saved(_))
    }
}

/// Reads the file and labels it the way a browser would from its extension.
pub async fn read_file(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("resume.pdf")
        .to_string();
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    let media_type = if is_pdf {
        PDF_MEDIA_TYPE
    } else {
        FALLBACK_MEDIA_TYPE
    };
    Ok(UploadFile::new(filename, media_type, bytes))
}

/// Fills the form, submits, and retries while the last attempt failed and
/// retries remain. Notices are handed to `report` as they are produced.
pub async fn submit_with_retries<T, D, F>(
    controller: &mut FormController<T, D>,
    file: UploadFile,
    options: SubmitOptions,
    mut report: F,
) -> SubmitResult
where
    T: UploadTransport,
    D: DownloadSink,
    F: FnMut(Notice),
{
    controller
        .dispatch(Action::FileChosen {
            file,
            source: FileSource::Picker,
        })
        .await;
    if let Some(rejection) = controller.state().file_error() {
        return SubmitResult::Rejected(rejection);
    }
    controller.dispatch(Action::SetTargetRole(options.role)).await;
    controller
        .dispatch(Action::SetUserInput(options.instructions))
        .await;

    controller.submit().await;
    controller.take_notices().into_iter().for_each(&mut report);

    let mut retries_left = options.retries;
    while controller.state().can_retry() && retries_left > 0 {
        retries_left -= 1;
        report(Notice::info(RETRYING));
        controller.retry().await;
        controller.take_notices().into_iter().for_each(&mut report);
    }

    match controller.state().last_outcome() {
        Some(SubmissionOutcome::Success {
            payload: Some(value),
        }) => SubmitResult::Structured(value),
        Some(SubmissionOutcome::Success { payload: None }) => {
            SubmitResult::Saved(controller.last_download().cloned())
        }
        Some(SubmissionOutcome::Failure { message }) => SubmitResult::Failed(message),
        None => SubmitResult::NotSubmitted,
    }
}
