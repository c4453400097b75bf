//! Upload form state machine.
//!
//! `Idle → Ready → Submitting → {Succeeded, Failed}`; reset returns to `Idle`,
//! retry goes from `Failed` back to `Submitting`. File validation runs inside
//! the file-chosen transition, so there is no separate validating state to hold.
//!
//! All mutation goes through [`FormState::apply`]. The in-flight flag and the
//! last outcome are read off the [`Phase`], so "succeeded while submitting"
//! cannot be represented.

use serde_json::Value;

use crate::form::messages::{
    INSTRUCTIONS_TOO_LONG, LOADING_MESSAGES, NOTHING_TO_RETRY, NO_FILE_SELECTED, ROLE_REQUIRED,
    SUBMISSION_IN_PROGRESS,
};
use crate::form::validation::{validate_file, FileDescriptor, FileRejection};
use crate::upload::{exceeds_user_input_limit, UploadFile, UploadRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSource {
    Picker,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// `payload` is `None` when the result was a PDF that was saved to disk.
    Success { payload: Option<Value> },
    Failure { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Ready,
    Submitting { attempt: u64 },
    Succeeded { payload: Option<Value> },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Drag(DragEvent),
    FileChosen { file: UploadFile, source: FileSource },
    SetTargetRole(Option<String>),
    SetUserInput(String),
    Submit,
    Retry,
    LoadingTick,
    Completed { attempt: u64, outcome: SubmissionOutcome },
    Reset,
}

impl Action {
    /// Drag-and-drop events must not fall through to the host's default handling,
    /// whatever the transition does with them.
    pub fn prevents_default(&self) -> bool {
        matches!(
            self,
            Action::Drag(_)
                | Action::FileChosen {
                    source: FileSource::Drop,
                    ..
                }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// A submission the caller must now send. `attempt` ties the eventual
/// `Completed` action back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub attempt: u64,
    pub request: UploadRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied,
    Start(PendingSubmission),
    Refused(Notice),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct FormState {
    role_required: bool,
    selected_file: Option<UploadFile>,
    file_error: Option<FileRejection>,
    target_role: Option<String>,
    user_input: String,
    phase: Phase,
    loading_message_index: usize,
    drag_over: bool,
    next_attempt: u64,
}

impl FormState {
    pub fn new(role_required: bool) -> Self {
        Self {
            role_required,
            selected_file: None,
            file_error: None,
            target_role: None,
            user_input: String::new(),
            phase: Phase::Idle,
            loading_message_index: 0,
            drag_over: false,
            next_attempt: 1,
        }
    }

    pub fn apply(&mut self, action: Action) -> Transition {
        match action {
            Action::Drag(event) => {
                self.drag_over = !matches!(event, DragEvent::Leave);
                Transition::Applied
            }
            Action::FileChosen { file, source } => {
                if source == FileSource::Drop {
                    self.drag_over = false;
                }
                if self.is_submitting() {
                    return refuse(SUBMISSION_IN_PROGRESS);
                }
                self.choose_file(file);
                Transition::Applied
            }
            Action::SetTargetRole(role) => {
                if self.is_submitting() {
                    return refuse(SUBMISSION_IN_PROGRESS);
                }
                self.target_role = role
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty());
                Transition::Applied
            }
            Action::SetUserInput(text) => {
                if self.is_submitting() {
                    return refuse(SUBMISSION_IN_PROGRESS);
                }
                self.user_input = text;
                Transition::Applied
            }
            Action::Submit => self.submit(),
            Action::Retry => self.retry(),
            Action::LoadingTick => {
                if !self.is_submitting() {
                    return Transition::Ignored;
                }
                self.loading_message_index = (self.loading_message_index + 1) % LOADING_MESSAGES.len();
                Transition::Applied
            }
            Action::Completed { attempt, outcome } => match self.phase {
                Phase::Submitting { attempt: current } if current == attempt => {
                    self.phase = match outcome {
                        SubmissionOutcome::Success { payload } => Phase::Succeeded { payload },
                        SubmissionOutcome::Failure { message } => Phase::Failed { message },
                    };
                    Transition::Applied
                }
                // Late answer for a submission that was superseded or reset.
                _ => Transition::Ignored,
            },
            Action::Reset => {
                if self.is_submitting() {
                    return refuse(SUBMISSION_IN_PROGRESS);
                }
                *self = Self {
                    next_attempt: self.next_attempt,
                    ..Self::new(self.role_required)
                };
                Transition::Applied
            }
        }
    }

    fn choose_file(&mut self, file: UploadFile) {
        let descriptor = FileDescriptor {
            media_type: &file.media_type,
            size: file.size(),
        };
        match validate_file(descriptor) {
            Ok(()) => {
                self.selected_file = Some(file);
                self.file_error = None;
                self.phase = Phase::Ready;
            }
            Err(rejection) => {
                self.selected_file = None;
                self.file_error = Some(rejection);
                self.phase = Phase::Idle;
            }
        }
    }

    fn submit(&mut self) -> Transition {
        if let Some(refusal) = self.guard(true) {
            return refusal;
        }
        self.begin()
    }

    /// Replays the held file, role and text. Text length was checked on the
    /// first submission and is not checked again.
    fn retry(&mut self) -> Transition {
        if !matches!(self.phase, Phase::Failed { .. }) {
            return refuse(if self.is_submitting() {
                SUBMISSION_IN_PROGRESS
            } else {
                NOTHING_TO_RETRY
            });
        }
        if let Some(refusal) = self.guard(false) {
            return refusal;
        }
        self.begin()
    }

    fn guard(&self, check_text: bool) -> Option<Transition> {
        if self.is_submitting() {
            return Some(refuse(SUBMISSION_IN_PROGRESS));
        }
        if self.selected_file.is_none() {
            return Some(refuse(NO_FILE_SELECTED));
        }
        if self.role_required && self.target_role.is_none() {
            return Some(refuse(ROLE_REQUIRED));
        }
        if check_text && exceeds_user_input_limit(&self.user_input) {
            return Some(refuse(INSTRUCTIONS_TOO_LONG));
        }
        None
    }

    fn begin(&mut self) -> Transition {
        let Some(file) = self.selected_file.clone() else {
            return refuse(NO_FILE_SELECTED);
        };
        let attempt = self.next_attempt;
        self.next_attempt += 1;
        self.phase = Phase::Submitting { attempt };
        self.loading_message_index = 0;

        Transition::Start(PendingSubmission {
            attempt,
            request: UploadRequest {
                file,
                target_role: self.target_role.clone(),
                user_input: self.user_input.clone(),
            },
        })
    }

    pub fn role_required(&self) -> bool {
        self.role_required
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        self.selected_file.as_ref()
    }

    pub fn file_error(&self) -> Option<FileRejection> {
        self.file_error
    }

    pub fn target_role(&self) -> Option<&str> {
        self.target_role.as_deref()
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    pub fn can_retry(&self) -> bool {
        matches!(self.phase, Phase::Failed { .. })
    }

    pub fn last_outcome(&self) -> Option<SubmissionOutcome> {
        match &self.phase {
            Phase::Succeeded { payload } => Some(SubmissionOutcome::Success {
                payload: payload.clone(),
            }),
            Phase::Failed { message } => Some(SubmissionOutcome::Failure {
                message: message.clone(),
            }),
            _ => None,
        }
    }

    pub fn loading_message_index(&self) -> usize {
        self.loading_message_index
    }

    pub fn loading_message(&self) -> &'static str {
        LOADING_MESSAGES[self.loading_message_index % LOADING_MESSAGES.len()]
    }

    pub fn drag_over(&self) -> bool {
        self.drag_over
    }
}

fn refuse(message: &str) -> Transition {
    Transition::Refused(Notice::error(message))
}
