use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{error::AppError, extractor::last_error_line};

/// Combines a video-only and an audio-only file into one container.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), AppError>;
}

/// ffmpeg subprocess, stream copy only
pub struct Ffmpeg {
    bin: PathBuf,
}

impl Ffmpeg {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl Muxer for Ffmpeg {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), AppError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tracing::info!(
            video = %video.display(),
            audio = %audio.display(),
            output = %output.display(),
            "merging streams"
        );

        let result = Command::new(&self.bin)
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c", "copy"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::from_spawn(&self.bin.display().to_string(), e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AppError::Mux(last_error_line(&stderr, result.status)));
        }
        Ok(())
    }
}
