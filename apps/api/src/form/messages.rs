//! User-facing strings for the submission flow.

/// Shown one at a time while a submission is in flight, in this order, wrapping.
pub const LOADING_MESSAGES: &[&str] = &[
    "Uploading your resume...",
    "Reading your experience...",
    "Matching skills to the target role...",
    "Applying your instructions...",
    "Optimizing keywords and phrasing...",
    "Generating your new resume...",
];

pub const NO_FILE_SELECTED: &str = "Please upload a resume first.";
pub const ROLE_REQUIRED: &str = "Target role required.";
pub const INSTRUCTIONS_TOO_LONG: &str = "Instructions must be 500 characters or fewer.";
pub const SUBMISSION_IN_PROGRESS: &str = "A submission is already in progress.";
pub const NOTHING_TO_RETRY: &str = "There is no failed submission to retry.";
pub const NETWORK_FAILURE: &str = "Could not reach the server. Please try again.";
pub const RESUME_READY: &str = "Your optimized resume is ready.";
pub const RETRYING: &str = "Retrying submission...";
