use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    error::AppError,
    events::{UiMessage, UiSender, cancellable},
    extractor::ProgressCallback,
    filename::clean_filename,
    model::{MediaKind, OutputMode, Status, StreamDescriptor},
    services::Services,
};

/// Snapshot of the session taken when Download is clicked
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// What to produce
    pub mode: OutputMode,
    /// Chosen video stream, if any
    pub video: Option<StreamDescriptor>,
    /// Chosen audio stream, if any
    pub audio: Option<StreamDescriptor>,
    /// Title of the fetched video, used for the merged file name
    pub title: Option<String>,
    /// Output filename typed by the user (may be blank)
    pub custom_name: String,
    /// Directory the result lands in
    pub output_dir: PathBuf,
}

/// Download task body. Temporary files are gone before the terminal
/// [`UiMessage::DownloadFinished`] is sent.
pub async fn run(services: Services, request: DownloadRequest, ui: UiSender, cancel: CancellationToken) {
    tracing::info!(mode = ?request.mode, "download started");
    ui.status(Status::neutral("Downloading..."));
    ui.progress(0.0);

    let mut temps = TempFiles::default();
    let result = perform(&services, &request, &ui, &cancel, &mut temps).await;
    temps.remove_all().await;

    let status = match &result {
        Ok(path) => {
            let name = display_name(path);
            tracing::info!(output = %path.display(), "download finished");
            match request.mode {
                OutputMode::Both => Status::success(format!("Merged and saved as {name}")),
                _ => Status::success(format!("Download complete! Saved as {name}")),
            }
        }
        Err(e) if e.is_validation() => Status::warning(e.to_string()),
        Err(AppError::Cancelled) => Status::warning(AppError::Cancelled.to_string()),
        Err(e) => {
            tracing::error!("download error: {}", e);
            Status::error(format!("Error: {e}"))
        }
    };
    ui.send(UiMessage::DownloadFinished { status, output: result.ok() });
}

/// Validates the selection, then downloads and (in `Both` mode) merges.
/// Every intermediate path is registered in `temps`.
pub async fn perform(
    services: &Services,
    request: &DownloadRequest,
    ui: &UiSender,
    cancel: &CancellationToken,
    temps: &mut TempFiles,
) -> Result<PathBuf, AppError> {
    match request.mode {
        OutputMode::VideoOnly => {
            let stream = request
                .video
                .as_ref()
                .ok_or(AppError::NothingSelected(MediaKind::Video))?;
            download_single(services, stream, &request.output_dir, ui, cancel, temps).await
        }
        OutputMode::AudioOnly => {
            let stream = request
                .audio
                .as_ref()
                .ok_or(AppError::NothingSelected(MediaKind::Audio))?;
            download_single(services, stream, &request.output_dir, ui, cancel, temps).await
        }
        OutputMode::Both => {
            let (Some(video), Some(audio)) = (&request.video, &request.audio) else {
                return Err(AppError::IncompleteSelection);
            };
            tokio::fs::create_dir_all(&request.output_dir).await?;

            ui.status(Status::neutral("Downloading video stream..."));
            let video_path = temps.create(&request.output_dir, video).await?;
            cancellable(
                cancel,
                services.extractor.download(video, &video_path, Some(progress_reporter(ui))),
            )
            .await?;

            ui.progress(0.0);
            ui.status(Status::neutral("Downloading audio stream..."));
            let audio_path = temps.create(&request.output_dir, audio).await?;
            cancellable(
                cancel,
                services.extractor.download(audio, &audio_path, Some(progress_reporter(ui))),
            )
            .await?;

            let name = output_name(&request.custom_name, request.title.as_deref());
            let output = request.output_dir.join(format!("{name}.mp4"));
            ui.status(Status::neutral("Merging streams... (This may take a moment)"));
            ui.send(UiMessage::Indeterminate);
            cancellable(cancel, services.muxer.mux(&video_path, &audio_path, &output)).await?;
            ui.progress(1.0);
            Ok(output)
        }
    }
}

async fn download_single(
    services: &Services,
    stream: &StreamDescriptor,
    output_dir: &Path,
    ui: &UiSender,
    cancel: &CancellationToken,
    temps: &mut TempFiles,
) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(output_dir).await?;
    let temp = temps.create(output_dir, stream).await?;
    cancellable(
        cancel,
        services.extractor.download(stream, &temp, Some(progress_reporter(ui))),
    )
    .await?;

    let target = output_dir.join(format!("{}.{}", stream.kind, stream.ext));
    tokio::fs::rename(&temp, &target).await?;
    ui.progress(1.0);
    Ok(target)
}

/// User-supplied name when present, else the sanitized title, else `output`.
pub fn output_name(custom: &str, title: Option<&str>) -> String {
    let custom = custom.trim();
    let custom = custom.strip_suffix(".mp4").unwrap_or(custom).trim();
    // keep the result inside the output directory
    let custom = Path::new(custom)
        .file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .unwrap_or_default();
    if !custom.is_empty() {
        return custom;
    }
    title
        .map(clean_filename)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "output".to_string())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turns `(delta, remaining)` callbacks into progress fractions on the UI
/// queue. An unknown size switches the bar to indeterminate.
fn progress_reporter(ui: &UiSender) -> ProgressCallback {
    let ui = ui.clone();
    let downloaded = AtomicU64::new(0);
    Arc::new(move |delta: u64, remaining: Option<u64>| {
        let done = downloaded.fetch_add(delta, Ordering::Relaxed) + delta;
        match remaining {
            Some(remaining) if done + remaining > 0 => {
                ui.progress(done as f32 / (done + remaining) as f32);
            }
            Some(_) => {}
            None => ui.send(UiMessage::Indeterminate),
        }
    })
}

/// Scratch directory of one download invocation. Streams and any fragment
/// files yt-dlp leaves beside them live inside it.
#[derive(Debug, Default)]
pub struct TempFiles {
    dir: Option<PathBuf>,
}

impl TempFiles {
    /// Path for `stream` inside a hidden directory under `output_dir`,
    /// created on first use.
    pub async fn create(&mut self, output_dir: &Path, stream: &StreamDescriptor) -> Result<PathBuf, AppError> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => {
                let dir = output_dir.join(format!(".yt-stream-picker-{}", Uuid::new_v4().simple()));
                tokio::fs::create_dir_all(&dir).await?;
                self.dir = Some(dir.clone());
                dir
            }
        };
        Ok(dir.join(format!("{}.{}", stream.kind, stream.ext)))
    }

    /// Deletes the scratch directory. Failures are logged, never returned.
    pub async fn remove_all(self) {
        let Some(dir) = self.dir else {
            return;
        };
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!("Cleaned up {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Error cleaning up {}: {}", dir.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        events::ui_queue,
        fakes::{FakeExtractor, FakeMuxer, services},
        model::{
            Tone,
            fixtures::{audio, video},
        },
    };

    struct Scratch(PathBuf);

    impl Scratch {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("yt-stream-picker-test-{}", Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            Scratch(dir)
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn request(mode: OutputMode, dir: &Path, with_video: bool, with_audio: bool) -> DownloadRequest {
        DownloadRequest {
            mode,
            video: with_video.then(|| video("137", "mp4", Some(1080))),
            audio: with_audio.then(|| audio("140", "m4a", Some(128.0))),
            title: Some("Test: Video! #1".into()),
            custom_name: String::new(),
            output_dir: dir.to_path_buf(),
        }
    }

    fn finished(msgs: Vec<UiMessage>) -> (Status, Option<PathBuf>, Vec<f32>) {
        let mut progress = Vec::new();
        let mut last = None;
        for msg in msgs {
            match msg {
                UiMessage::Progress(p) => progress.push(p),
                UiMessage::DownloadFinished { status, output } => last = Some((status, output)),
                _ => {}
            }
        }
        let (status, output) = last.expect("no DownloadFinished message");
        (status, output, progress)
    }

    fn leftover_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn both_mode_without_audio_downloads_nothing() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor::default());
        let (tx, mut rx) = ui_queue(None);
        run(
            services(extractor.clone(), Arc::default(), false),
            request(OutputMode::Both, &scratch.0, true, false),
            tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(extractor.download_count(), 0);
        let (status, output, _) = finished(rx.drain());
        assert_eq!(status, Status::warning("Select both video and audio first."));
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn single_modes_need_their_stream() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor::default());
        let svc = services(extractor.clone(), Arc::default(), false);

        let (tx, mut rx) = ui_queue(None);
        run(
            svc.clone(),
            request(OutputMode::VideoOnly, &scratch.0, false, true),
            tx,
            CancellationToken::new(),
        )
        .await;
        assert_eq!(finished(rx.drain()).0.text, "No video selected.");

        let (tx, mut rx) = ui_queue(None);
        run(
            svc,
            request(OutputMode::AudioOnly, &scratch.0, true, false),
            tx,
            CancellationToken::new(),
        )
        .await;
        assert_eq!(finished(rx.drain()).0.text, "No audio selected.");
        assert_eq!(extractor.download_count(), 0);
    }

    #[tokio::test]
    async fn merge_names_output_after_title_and_cleans_up() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor::default());
        let muxer = Arc::new(FakeMuxer::default());
        let (tx, mut rx) = ui_queue(None);
        run(
            services(extractor.clone(), muxer.clone(), false),
            request(OutputMode::Both, &scratch.0, true, true),
            tx,
            CancellationToken::new(),
        )
        .await;

        let (status, output, progress) = finished(rx.drain());
        assert_eq!(status.tone, Tone::Success);
        assert!(status.text.contains("Test Video 1.mp4"), "{}", status.text);
        assert_eq!(output, Some(scratch.0.join("Test Video 1.mp4")));
        assert!(progress.contains(&1.0));
        assert_eq!(muxer.calls.load(Ordering::SeqCst), 1);

        let temps = extractor.downloads.lock().unwrap().clone();
        assert_eq!(temps.len(), 2);
        assert!(temps.iter().all(|p| !p.exists()));
        assert_eq!(leftover_files(&scratch.0), vec!["Test Video 1.mp4".to_string()]);
    }

    #[tokio::test]
    async fn failed_merge_still_removes_temp_files() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor::default());
        let muxer = Arc::new(FakeMuxer { fail: true, ..Default::default() });
        let (tx, mut rx) = ui_queue(None);
        run(
            services(extractor.clone(), muxer, false),
            request(OutputMode::Both, &scratch.0, true, true),
            tx,
            CancellationToken::new(),
        )
        .await;

        let (status, output, _) = finished(rx.drain());
        assert_eq!(status.tone, Tone::Error);
        assert!(status.text.starts_with("Error: merge failed"));
        assert!(output.is_none());
        assert_eq!(extractor.download_count(), 2);
        assert!(leftover_files(&scratch.0).is_empty());
    }

    #[tokio::test]
    async fn failed_audio_download_removes_video_temp() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor {
            fail_download_of: Some("140".into()),
            ..Default::default()
        });
        let muxer = Arc::new(FakeMuxer::default());
        let (tx, mut rx) = ui_queue(None);
        run(
            services(extractor.clone(), muxer.clone(), false),
            request(OutputMode::Both, &scratch.0, true, true),
            tx,
            CancellationToken::new(),
        )
        .await;

        let (status, _, _) = finished(rx.drain());
        assert!(status.text.contains("403"));
        assert_eq!(muxer.calls.load(Ordering::SeqCst), 0);
        assert!(leftover_files(&scratch.0).is_empty());
    }

    #[tokio::test]
    async fn video_only_lands_at_final_name() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor::default());
        let (tx, mut rx) = ui_queue(None);
        run(
            services(extractor, Arc::default(), false),
            request(OutputMode::VideoOnly, &scratch.0, true, false),
            tx,
            CancellationToken::new(),
        )
        .await;

        let (status, output, progress) = finished(rx.drain());
        assert_eq!(status, Status::success("Download complete! Saved as video.mp4"));
        assert_eq!(output, Some(scratch.0.join("video.mp4")));
        assert_eq!(progress.last(), Some(&1.0));
        assert!(progress.contains(&0.4));
        assert_eq!(leftover_files(&scratch.0), vec!["video.mp4".to_string()]);
    }

    #[tokio::test]
    async fn audio_only_keeps_its_extension() {
        let scratch = Scratch::new();
        let (tx, mut rx) = ui_queue(None);
        run(
            services(Arc::default(), Arc::default(), false),
            request(OutputMode::AudioOnly, &scratch.0, false, true),
            tx,
            CancellationToken::new(),
        )
        .await;

        let (_, output, _) = finished(rx.drain());
        assert_eq!(output, Some(scratch.0.join("audio.m4a")));
    }

    #[tokio::test]
    async fn custom_name_wins_over_title() {
        let scratch = Scratch::new();
        let mut req = request(OutputMode::Both, &scratch.0, true, true);
        req.custom_name = "  my clip.mp4 ".into();
        let (tx, mut rx) = ui_queue(None);
        run(
            services(Arc::default(), Arc::default(), false),
            req,
            tx,
            CancellationToken::new(),
        )
        .await;

        let (status, output, _) = finished(rx.drain());
        assert_eq!(status.text, "Merged and saved as my clip.mp4");
        assert_eq!(output, Some(scratch.0.join("my clip.mp4")));
    }

    #[tokio::test]
    async fn cancellation_reports_and_cleans_up() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor::default());
        let token = CancellationToken::new();
        token.cancel();
        let (tx, mut rx) = ui_queue(None);
        run(
            services(extractor, Arc::default(), false),
            request(OutputMode::Both, &scratch.0, true, true),
            tx,
            token,
        )
        .await;

        let (status, output, _) = finished(rx.drain());
        assert_eq!(status, Status::warning("Cancelled."));
        assert!(output.is_none());
        assert!(leftover_files(&scratch.0).is_empty());
    }

    #[test]
    fn output_name_fallbacks() {
        assert_eq!(output_name("", Some("Test: Video! #1")), "Test Video 1");
        assert_eq!(output_name("   ", Some("?!")), "output");
        assert_eq!(output_name("", None), "output");
        assert_eq!(output_name("clip.mp4", None), "clip");
        assert_eq!(output_name("../../elsewhere/clip", None), "clip");
    }

    #[tokio::test]
    async fn remove_all_takes_fragment_files_with_it() {
        let scratch = Scratch::new();
        let mut temps = TempFiles::default();
        let kept = temps.create(&scratch.0, &video("1", "mp4", None)).await.unwrap();
        let _never_written = temps.create(&scratch.0, &audio("2", "m4a", None)).await.unwrap();
        std::fs::write(&kept, b"x").unwrap();
        std::fs::write(format!("{}.ytdl", kept.display()), b"state").unwrap();
        std::fs::write(format!("{}-Frag7", kept.display()), b"frag").unwrap();

        temps.remove_all().await;
        assert!(!kept.exists());
        assert!(leftover_files(&scratch.0).is_empty());
    }

    #[tokio::test]
    async fn unused_temp_files_touch_nothing() {
        let scratch = Scratch::new();
        TempFiles::default().remove_all().await;
        assert!(leftover_files(&scratch.0).is_empty());
    }

    #[tokio::test]
    async fn unknown_size_shows_indeterminate_not_full() {
        let scratch = Scratch::new();
        let extractor = Arc::new(FakeExtractor { unknown_total: true, ..Default::default() });
        let (tx, mut rx) = ui_queue(None);
        run(
            services(extractor, Arc::default(), false),
            request(OutputMode::VideoOnly, &scratch.0, true, false),
            tx,
            CancellationToken::new(),
        )
        .await;

        let msgs = rx.drain();
        let indeterminate = msgs.iter().filter(|m| matches!(m, UiMessage::Indeterminate)).count();
        assert_eq!(indeterminate, 2);
        let (status, _, progress) = finished(msgs);
        assert_eq!(status.tone, Tone::Success);
        // only the initial reset and the completion mark
        assert_eq!(progress, vec![0.0, 1.0]);
    }
}
