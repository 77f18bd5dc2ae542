//! In-memory collaborators for coordinator tests

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use eframe::egui::ColorImage;

use crate::{
    error::AppError,
    extractor::{Extractor, ProgressCallback},
    model::{StreamDescriptor, VideoInfo},
    muxer::Muxer,
    services::Services,
    thumbnail::ThumbnailSource,
};

/// In-memory extractor: returns `info`, writes a few bytes per download
/// plus a fragment side file the way segmented yt-dlp downloads do.
#[derive(Default)]
pub struct FakeExtractor {
    pub info: Option<VideoInfo>,
    pub fetch_error: Option<String>,
    pub fail_download_of: Option<String>,
    /// Report progress without a known total size
    pub unknown_total: bool,
    pub fetches: AtomicUsize,
    pub downloads: Mutex<Vec<PathBuf>>,
}

impl FakeExtractor {
    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn fetch(&self, _url: &str) -> Result<VideoInfo, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.fetch_error {
            return Err(AppError::Extraction(msg.clone()));
        }
        Ok(self.info.clone().unwrap_or_default())
    }

    async fn download(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<PathBuf, AppError> {
        self.downloads.lock().unwrap().push(dest.to_path_buf());
        tokio::fs::write(dest, b"partial").await?;
        tokio::fs::write(format!("{}-Frag1", dest.display()), b"frag").await?;
        if self.fail_download_of.as_deref() == Some(stream.handle.format_id.as_str()) {
            return Err(AppError::Download("HTTP Error 403: Forbidden".into()));
        }
        if let Some(cb) = progress {
            if self.unknown_total {
                cb(400, None);
                cb(600, None);
            } else {
                cb(400, Some(600));
                cb(600, Some(0));
            }
        }
        Ok(dest.to_path_buf())
    }
}

/// Muxer that writes the output file or fails with ffmpeg's message.
#[derive(Default)]
pub struct FakeMuxer {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Muxer for FakeMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(video.exists() && audio.exists());
        if self.fail {
            return Err(AppError::Mux("Invalid data found when processing input".into()));
        }
        tokio::fs::write(output, b"merged").await?;
        Ok(())
    }
}

pub struct FakeThumbnails {
    pub fail: bool,
}

impl ThumbnailSource for FakeThumbnails {
    fn fetch(&self, _url: &str) -> Result<ColorImage, AppError> {
        if self.fail {
            return Err(AppError::Thumbnail("404".into()));
        }
        Ok(ColorImage::new([2, 2], Default::default()))
    }
}

pub fn services(
    extractor: Arc<FakeExtractor>,
    muxer: Arc<FakeMuxer>,
    thumbnails_fail: bool,
) -> Services {
    Services {
        extractor,
        muxer,
        thumbnails: Arc::new(FakeThumbnails { fail: thumbnails_fail }),
    }
}
