use std::path::PathBuf;

use eframe::egui::ColorImage;
use tokio_util::sync::CancellationToken;

use crate::{
    download::DownloadRequest,
    error::AppError,
    events::UiMessage,
    model::{MediaKind, OutputMode, Progress, Status, VideoSession},
    selection::Selection,
};

const THUMBNAIL_PLACEHOLDER: &str = "(Thumbnail will appear here)";

/// All state the window shows, owned by the UI thread.
pub struct Session {
    /// URL text field
    pub url_input: String,
    /// Output filename text field
    pub filename_input: String,
    /// Output folder text field
    pub output_dir: String,
    /// Video / audio / both
    pub mode: OutputMode,
    /// Name of the active theme
    pub theme: String,
    video: Option<VideoSession>,
    selection: Selection,
    headline: String,
    status: Status,
    progress: Progress,
    thumbnail_note: String,
    last_output: Option<PathBuf>,
    fetch_task: Option<CancellationToken>,
    download_task: Option<CancellationToken>,
}

impl Session {
    pub fn new(output_dir: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            url_input: String::new(),
            filename_input: "output".to_string(),
            output_dir: output_dir.into(),
            mode: OutputMode::default(),
            theme: theme.into(),
            video: None,
            selection: Selection::default(),
            headline: "Ready to fetch a URL.".to_string(),
            status: Status::neutral("Awaiting link."),
            progress: Progress::default(),
            thumbnail_note: "(Thumbnail)".to_string(),
            last_output: None,
            fetch_task: None,
            download_task: None,
        }
    }

    /// Clears the previous video and selection and hands out the URL to
    /// fetch. `None` while a fetch is already running.
    pub fn begin_fetch(&mut self) -> Option<(String, CancellationToken)> {
        if self.fetch_task.is_some() {
            return None;
        }
        self.selection.clear();
        self.video = None;
        self.last_output = None;
        self.headline = "Fetching info… please wait.".to_string();
        self.status = Status::default();
        self.progress = Progress::default();
        self.thumbnail_note = THUMBNAIL_PLACEHOLDER.to_string();

        let token = CancellationToken::new();
        self.fetch_task = Some(token.clone());
        Some((self.url_input.trim().to_string(), token))
    }

    /// Snapshot of mode, selection and names for the download task.
    /// `None` while a download runs or before any fetch succeeded.
    pub fn begin_download(&mut self) -> Option<(DownloadRequest, CancellationToken)> {
        if !self.can_download() {
            return None;
        }
        let request = DownloadRequest {
            mode: self.mode,
            video: self.selection.stream(MediaKind::Video).cloned(),
            audio: self.selection.stream(MediaKind::Audio).cloned(),
            title: self.video.as_ref().map(|v| v.title.clone()),
            custom_name: self.filename_input.clone(),
            output_dir: PathBuf::from(self.output_dir.trim()),
        };
        self.last_output = None;
        let token = CancellationToken::new();
        self.download_task = Some(token.clone());
        Some((request, token))
    }

    pub fn cancel_download(&self) {
        if let Some(token) = &self.download_task {
            tracing::info!("download cancel requested");
            token.cancel();
        }
    }

    /// Chooses row `row` of the `kind` list. Returns whether anything changed.
    pub fn select(&mut self, kind: MediaKind, row: usize) -> bool {
        let Some(stream) = self.video.as_ref().and_then(|v| v.streams(kind).get(row)) else {
            return false;
        };
        self.selection.select(row, stream)
    }

    /// Folds one queued message into the state. A decoded thumbnail is
    /// handed back for upload as a texture.
    pub fn apply(&mut self, msg: UiMessage) -> Option<ColorImage> {
        match msg {
            UiMessage::SessionLoaded { session, default_filename } => {
                self.headline = session.title.clone();
                self.filename_input = default_filename;
                self.video = Some(session);
            }
            UiMessage::FetchFailed(e) => {
                self.headline = if e.is_validation() {
                    e.to_string()
                } else {
                    format!("Error: {e}")
                };
                self.video = None;
            }
            UiMessage::FetchFinished => self.fetch_task = None,
            UiMessage::Thumbnail(image) => {
                self.thumbnail_note.clear();
                return Some(image);
            }
            UiMessage::ThumbnailFailed(msg) => self.thumbnail_note = format!("Image error: {msg}"),
            UiMessage::Progress(p) => self.progress = Progress::Determinate(p),
            UiMessage::Indeterminate => self.progress = Progress::Indeterminate,
            UiMessage::Status(status) => self.status = status,
            UiMessage::DownloadFinished { status, output } => {
                self.progress = Progress::Determinate(if output.is_some() { 1.0 } else { 0.0 });
                self.status = status;
                self.last_output = output;
                self.download_task = None;
            }
            UiMessage::ToolMissing(tool) => {
                self.status = Status::warning(AppError::ToolNotFound(tool).to_string());
            }
        }
        None
    }

    pub fn video(&self) -> Option<&VideoSession> {
        self.video.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn thumbnail_note(&self) -> &str {
        &self.thumbnail_note
    }

    pub fn last_output(&self) -> Option<&PathBuf> {
        self.last_output.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_task.is_some()
    }

    pub fn is_downloading(&self) -> bool {
        self.download_task.is_some()
    }

    pub fn can_download(&self) -> bool {
        self.video.is_some() && !self.is_downloading()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for token in self.fetch_task.iter().chain(self.download_task.iter()) {
            token.cancel();
        }
    }
}
