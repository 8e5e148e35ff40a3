use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single transcription attempt.
///
/// The status only ever moves forward; a validation failure resets it to
/// `Waiting` so the user can retry with corrected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Waiting,
    Converting,
    Uploading,
    Generating,
    Success,
}

impl UploadStatus {
    /// Message shown next to the spinner while this stage runs.
    pub fn message(&self) -> &'static str {
        match self {
            UploadStatus::Waiting => "Waiting for media...",
            UploadStatus::Converting => "Converting media to audio...",
            UploadStatus::Uploading => "Uploading audio...",
            UploadStatus::Generating => "Generating transcription...",
            UploadStatus::Success => "Success!",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            UploadStatus::Waiting => "•",
            UploadStatus::Converting => "🎬",
            UploadStatus::Uploading => "📤",
            UploadStatus::Generating => "✍️",
            UploadStatus::Success => "✅",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStatus::Waiting => "waiting",
            UploadStatus::Converting => "converting",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Generating => "generating",
            UploadStatus::Success => "success",
        };
        write!(f, "{}", name)
    }
}

/// Rejected transition: the status never moves backwards or repeats a stage.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("status cannot move from {from} to {to}")]
pub struct StatusRegression {
    pub from: UploadStatus,
    pub to: UploadStatus,
}

/// Enforces forward-only status transitions for one attempt.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    current: UploadStatus,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            current: UploadStatus::Waiting,
        }
    }

    pub fn current(&self) -> UploadStatus {
        self.current
    }

    pub fn advance(&mut self, next: UploadStatus) -> Result<UploadStatus, StatusRegression> {
        if next <= self.current {
            return Err(StatusRegression {
                from: self.current,
                to: next,
            });
        }
        self.current = next;
        Ok(next)
    }

    /// Validation failures put the attempt back at the start.
    pub fn reset(&mut self) -> UploadStatus {
        self.current = UploadStatus::Waiting;
        self.current
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Couples the tracker with a terminal spinner so every stage change is
/// visible to the user.
pub struct StatusReporter {
    tracker: StatusTracker,
    bar: ProgressBar,
}

impl StatusReporter {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap(),
            );
            bar
        };
        bar.set_message(UploadStatus::Waiting.message());

        Self {
            tracker: StatusTracker::new(),
            bar,
        }
    }

    pub fn current(&self) -> UploadStatus {
        self.tracker.current()
    }

    pub fn advance(&mut self, next: UploadStatus) -> crate::Result<UploadStatus> {
        let status = self.tracker.advance(next)?;
        if status.is_terminal() {
            self.bar
                .finish_with_message(format!("{} {}", status.icon(), status.message()));
        } else {
            self.bar
                .set_message(format!("{} {}", status.icon(), status.message()));
        }
        Ok(status)
    }

    /// Clears the spinner and rewinds to `Waiting` after a validation failure.
    pub fn reset(&mut self) -> UploadStatus {
        self.bar.finish_and_clear();
        self.tracker.reset()
    }

    /// Leaves the last stage visible when the attempt dies mid-flight.
    pub fn fail(&self) {
        self.bar.abandon();
    }
}
