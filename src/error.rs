use thiserror::Error;

use crate::model::MediaKind;

/// Every failure the coordinators can report to the user.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Please enter a valid URL.")]
    EmptyUrl,
    #[error("No {0} selected.")]
    NothingSelected(MediaKind),
    #[error("Select both video and audio first.")]
    IncompleteSelection,
    #[error("{0} was not found. Install it or point the config at it.")]
    ToolNotFound(String),
    #[error("{0}")]
    Extraction(String),
    #[error("download failed: {0}")]
    Download(String),
    #[error("merge failed: {0}")]
    Mux(String),
    #[error("thumbnail unavailable: {0}")]
    Thumbnail(String),
    #[error("theme {0}")]
    Theme(String),
    #[error("Cancelled.")]
    Cancelled,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Raised before any collaborator is contacted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyUrl | Self::NothingSelected(_) | Self::IncompleteSelection
        )
    }

    /// Maps a failed process spawn, so a missing binary gets its own message.
    pub fn from_spawn(tool: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotFound(tool.to_string())
        } else {
            Self::Io(err)
        }
    }
}
