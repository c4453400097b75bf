//! Drives [`FormState`] against a transport and a download sink.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::form::download::DownloadSink;
use crate::form::messages::RESUME_READY;
use crate::form::state::{
    Action, FormState, Notice, PendingSubmission, SubmissionOutcome, Transition,
};
use crate::form::transport::UploadTransport;
use crate::outcome::RelayOutcome;

pub const DEFAULT_LOADING_PERIOD: Duration = Duration::from_secs(3);

pub struct FormController<T, D> {
    state: FormState,
    transport: T,
    downloads: D,
    notices: Vec<Notice>,
    loading_period: Duration,
    last_download: Option<PathBuf>,
}

impl<T: UploadTransport, D: DownloadSink> FormController<T, D> {
    pub fn new(state: FormState, transport: T, downloads: D) -> Self {
        Self {
            state,
            transport,
            downloads,
            notices: Vec::new(),
            loading_period: DEFAULT_LOADING_PERIOD,
            last_download: None,
        }
    }

    /// Zero is treated as one millisecond.
    pub fn with_loading_period(mut self, period: Duration) -> Self {
        self.loading_period = period.max(Duration::from_millis(1));
        self
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drains pending notifications, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Where the most recent PDF result was saved.
    pub fn last_download(&self) -> Option<&PathBuf> {
        self.last_download.as_ref()
    }

    /// Applies `action`. When it starts a submission, the request is sent and
    /// awaited before returning.
    pub async fn dispatch(&mut self, action: Action) -> Transition {
        let transition = self.state.apply(action);
        match &transition {
            Transition::Refused(notice) => self.notices.push(notice.clone()),
            Transition::Start(pending) => self.execute(pending.clone()).await,
            Transition::Applied | Transition::Ignored => {}
        }
        transition
    }

    pub async fn submit(&mut self) -> Transition {
        self.dispatch(Action::Submit).await
    }

    pub async fn retry(&mut self) -> Transition {
        self.dispatch(Action::Retry).await
    }

    pub async fn reset(&mut self) -> Transition {
        let transition = self.dispatch(Action::Reset).await;
        if transition == Transition::Applied {
            self.last_download = None;
        }
        transition
    }

    async fn execute(&mut self, pending: PendingSubmission) {
        let PendingSubmission { attempt, request } = pending;
        info!(
            attempt,
            filename = %request.file.filename,
            size = request.file.size(),
            "Submitting resume"
        );
        self.last_download = None;

        // The ticker lives only inside this block, so it is gone once the
        // response arrives or this future is dropped.
        let result = {
            let mut send = self.transport.send(&request);
            let mut ticker = interval_at(Instant::now() + self.loading_period, self.loading_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("{}", self.state.loading_message());
            loop {
                tokio::select! {
                    result = &mut send => break result,
                    _ = ticker.tick() => {
                        self.state.apply(Action::LoadingTick);
                        info!("{}", self.state.loading_message());
                    }
                }
            }
        };

        let outcome = match result {
            Ok(RelayOutcome::Binary {
                bytes,
                suggested_filename,
            }) => {
                match self.downloads.save(&suggested_filename, bytes).await {
                    Ok(path) => {
                        info!(path = %path.display(), "Saved optimized resume");
                        self.notices
                            .push(Notice::success(format!("Resume saved to {}", path.display())));
                        self.last_download = Some(path);
                    }
                    // The submission still succeeded; only the local save failed.
                    Err(e) => {
                        warn!("Download failed: {e}");
                        self.notices.push(Notice::error(e.to_string()));
                    }
                }
                SubmissionOutcome::Success { payload: None }
            }
            Ok(RelayOutcome::Structured { value, .. }) => {
                self.notices.push(Notice::success(RESUME_READY));
                SubmissionOutcome::Success {
                    payload: Some(value),
                }
            }
            Ok(RelayOutcome::Failure { status, message }) => {
                warn!(status, "Submission failed: {message}");
                self.notices.push(Notice::error(message.clone()));
                SubmissionOutcome::Failure { message }
            }
            Err(e) => {
                warn!("Submission failed: {e}");
                let message = e.user_message();
                self.notices.push(Notice::error(message.clone()));
                SubmissionOutcome::Failure { message }
            }
        };

        self.state.apply(Action::Completed { attempt, outcome });
    }
}
