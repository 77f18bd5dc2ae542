use std::{future::Future, path::PathBuf};

use eframe::egui;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;

use crate::{
    error::AppError,
    model::{Status, VideoSession},
};

/// Everything a background task may tell the UI thread
pub enum UiMessage {
    /// A fetch succeeded; streams are already sorted
    SessionLoaded {
        session: VideoSession,
        default_filename: String,
    },
    /// A fetch failed before any stream was published
    FetchFailed(AppError),
    /// Terminal message of every fetch task
    FetchFinished,
    /// Thumbnail decoded and scaled
    Thumbnail(egui::ColorImage),
    /// Thumbnail could not be loaded; streams stay usable
    ThumbnailFailed(String),
    /// Download progress (0.0 to 1.0)
    Progress(f32),
    /// Work of unknown length started (merging)
    Indeterminate,
    /// Replaces the status line
    Status(Status),
    /// Terminal message of every download task, sent after cleanup
    DownloadFinished {
        status: Status,
        output: Option<PathBuf>,
    },
    /// A required external tool is missing
    ToolMissing(String),
}

/// Posts messages to the UI thread and wakes it up.
#[derive(Clone)]
pub struct UiSender {
    tx: UnboundedSender<UiMessage>,
    repaint: Option<egui::Context>,
}

/// UI-thread end of the queue
pub struct UiReceiver {
    rx: UnboundedReceiver<UiMessage>,
}

/// Creates the queue; pass the egui context so posts trigger a repaint.
pub fn ui_queue(repaint: Option<egui::Context>) -> (UiSender, UiReceiver) {
    let (tx, rx) = unbounded_channel();
    (UiSender { tx, repaint }, UiReceiver { rx })
}

impl UiSender {
    pub fn send(&self, msg: UiMessage) {
        if self.tx.send(msg).is_err() {
            // window already closed
            tracing::debug!("ui queue closed, dropping message");
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }

    pub fn status(&self, status: Status) {
        self.send(UiMessage::Status(status));
    }

    pub fn progress(&self, fraction: f32) {
        self.send(UiMessage::Progress(fraction.clamp(0.0, 1.0)));
    }
}

impl UiReceiver {
    /// Everything queued so far, without blocking.
    pub fn drain(&mut self) -> Vec<UiMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

/// Runs `fut` unless `cancel` fires first. Dropping the future kills any
/// subprocess spawned with `kill_on_drop`.
pub async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        res = fut => res,
    }
}
