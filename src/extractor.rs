use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
    process::Command,
};

use crate::{
    error::AppError,
    model::{MediaKind, StreamDescriptor, StreamHandle, VideoInfo},
    progress::{PROGRESS_TEMPLATE, ProgressTracker, parse_progress_from_line},
};

/// Called as bytes arrive with `(bytes_downloaded_delta, bytes_remaining)`;
/// `bytes_remaining` is `None` when the size is unknown.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Lists the streams behind a URL and downloads them.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<VideoInfo, AppError>;

    /// Writes `stream` to exactly `dest`. Fragment files may be left next to it.
    async fn download(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<PathBuf, AppError>;
}

/// yt-dlp subprocess backend
pub struct YtDlp {
    bin: PathBuf,
}

impl YtDlp {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn tool_name(&self) -> String {
        self.bin.display().to_string()
    }
}

#[async_trait]
impl Extractor for YtDlp {
    async fn fetch(&self, url: &str) -> Result<VideoInfo, AppError> {
        tracing::info!(url, "fetching stream list");
        let output = Command::new(&self.bin)
            .args(["-J", "--no-playlist", "--no-warnings", url])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::from_spawn(&self.tool_name(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Extraction(last_error_line(&stderr, output.status)));
        }
        parse_video_info(url, &output.stdout)
    }

    async fn download(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<PathBuf, AppError> {
        tracing::info!(
            format = %stream.handle.format_id,
            dest = %dest.display(),
            "downloading {} stream",
            stream.kind
        );
        let mut child = Command::new(&self.bin)
            .arg("-f")
            .arg(&stream.handle.format_id)
            .args(["--newline", "--no-part", "--no-playlist", "--force-overwrites"])
            .args(["--progress-template", PROGRESS_TEMPLATE])
            .arg("-o")
            .arg(dest)
            .arg(&stream.handle.source_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::from_spawn(&self.tool_name(), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Download("yt-dlp stdout unavailable".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Download("yt-dlp stderr unavailable".into()))?;
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut tracker = ProgressTracker::new(stream.filesize);
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_progress_from_line(&line) {
                Some(sample) => {
                    let (delta, remaining) = tracker.update(sample);
                    if let Some(cb) = &progress {
                        cb(delta, remaining);
                    }
                }
                None => tracing::trace!("yt-dlp> {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();
        if !status.success() {
            return Err(AppError::Download(last_error_line(&stderr, status)));
        }
        Ok(dest.to_path_buf())
    }
}

/// Picks the most useful line out of a tool's stderr.
pub(crate) fn last_error_line(stderr: &str, status: std::process::ExitStatus) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| format!("process exited with {status}"))
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    fps: Option<f64>,
    abr: Option<f64>,
    filesize: Option<u64>,
    filesize_approx: Option<f64>,
}

impl RawFormat {
    fn has(codec: &Option<String>) -> bool {
        codec.as_deref().is_some_and(|c| c != "none" && !c.is_empty())
    }

    // progressive formats carry both tracks and are left out
    fn kind(&self) -> Option<MediaKind> {
        match (Self::has(&self.vcodec), Self::has(&self.acodec)) {
            (true, false) => Some(MediaKind::Video),
            (false, true) => Some(MediaKind::Audio),
            _ => None,
        }
    }

    fn into_descriptor(self, kind: MediaKind, source_url: &str) -> StreamDescriptor {
        let filesize = self
            .filesize
            .or_else(|| self.filesize_approx.filter(|v| *v > 0.0).map(|v| v as u64));
        StreamDescriptor {
            kind,
            ext: self.ext.unwrap_or_else(|| "bin".into()),
            height: self.height.filter(|_| kind == MediaKind::Video),
            fps: self.fps.filter(|_| kind == MediaKind::Video).map(|f| f as f32),
            abr: self.abr.filter(|_| kind == MediaKind::Audio).map(|b| b as f32),
            filesize,
            handle: StreamHandle {
                source_url: source_url.to_string(),
                format_id: self.format_id,
            },
        }
    }
}

fn parse_video_info(url: &str, stdout: &[u8]) -> Result<VideoInfo, AppError> {
    let raw: RawInfo = serde_json::from_slice(stdout)?;
    let mut info = VideoInfo {
        title: raw.title.unwrap_or_else(|| "Untitled".into()),
        thumbnail_url: raw.thumbnail.filter(|t| !t.is_empty()),
        ..Default::default()
    };
    for format in raw.formats {
        match format.kind() {
            Some(MediaKind::Video) => info.video_streams.push(format.into_descriptor(MediaKind::Video, url)),
            Some(MediaKind::Audio) => info.audio_streams.push(format.into_descriptor(MediaKind::Audio, url)),
            None => {}
        }
    }
    tracing::debug!(
        video = info.video_streams.len(),
        audio = info.audio_streams.len(),
        "parsed stream list for {:?}",
        info.title
    );
    Ok(info)
}
