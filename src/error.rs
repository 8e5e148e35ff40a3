use thiserror::Error;

/// Failure classes surfaced to the user.
///
/// Validation failures reset the upload status back to `waiting`; everything
/// else aborts the attempt at whatever stage it reached.
#[derive(Error, Debug)]
pub enum FacilitaError {
    #[error("no media source provided: pass a video/audio file or a YouTube link")]
    MissingInput,

    #[error("not a valid YouTube link: {0}")]
    InvalidYoutubeUrl(String),

    #[error("could not resolve a downloadable audio link: {0}")]
    UnresolvedVideo(String),

    #[error("unsupported media source: {0}")]
    UnsupportedSource(String),

    #[error("invalid media file: {0}")]
    InvalidMediaFile(String),

    #[error("audio conversion failed: {0}")]
    ConversionFailed(String),

    #[error("transcription API returned HTTP {status}: {body}")]
    ApiFailure { status: u16, body: String },
}

impl FacilitaError {
    /// True for input-validation failures, the ones that reset the upload
    /// status to `waiting` instead of abandoning it mid-stage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FacilitaError::MissingInput
                | FacilitaError::InvalidYoutubeUrl(_)
                | FacilitaError::UnresolvedVideo(_)
                | FacilitaError::UnsupportedSource(_)
                | FacilitaError::InvalidMediaFile(_)
        )
    }
}
