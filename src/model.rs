use std::fmt;

/// Which elementary track a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Video-only (adaptive) track
    Video,
    /// Audio-only track
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => f.write_str("video"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

/// Opaque handle the extractor needs to download a stream again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    /// Page URL the stream was listed for
    pub source_url: String,
    /// Extractor-specific format identifier
    pub format_id: String,
}

/// One downloadable video or audio track, as listed by the extractor
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Video or audio
    pub kind: MediaKind,
    /// Container extension (mp4, webm, m4a, ...)
    pub ext: String,
    /// Height in pixels, video only
    pub height: Option<u32>,
    /// Frames per second, video only
    pub fps: Option<f32>,
    /// Average bitrate in kbps, audio only
    pub abr: Option<f32>,
    /// Size in bytes, when the extractor knows it
    pub filesize: Option<u64>,
    /// Handle used to trigger the download
    pub handle: StreamHandle,
}

impl StreamDescriptor {
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.kind, self.ext)
    }

    /// mp4 video and m4a audio share the mp4 family.
    pub fn is_preferred_container(&self) -> bool {
        matches!(self.ext.as_str(), "mp4" | "m4a")
    }

    /// Resolution for video, bitrate for audio; zero when unknown.
    pub fn quality_score(&self) -> u32 {
        match self.kind {
            MediaKind::Video => self.height.unwrap_or(0),
            MediaKind::Audio => self.abr.map(|b| b.max(0.0) as u32).unwrap_or(0),
        }
    }

    /// Row text shown in the stream lists.
    pub fn label(&self) -> String {
        let ext = self.ext.to_uppercase();
        let size = self
            .filesize
            .map(|b| format!(" | {:.1} MB", b as f64 / 1_048_576.0))
            .unwrap_or_default();
        match self.kind {
            MediaKind::Video => {
                let res = self
                    .height
                    .map(|h| format!("{h}p"))
                    .unwrap_or_else(|| "N/A".into());
                let fps = self
                    .fps
                    .map(|f| format!("{}", f.round() as u32))
                    .unwrap_or_else(|| "N/A".into());
                format!("{res} | {fps}fps | {ext}{size}")
            }
            MediaKind::Audio => {
                let abr = self
                    .abr
                    .map(|b| format!("{}kbps", b.round() as u32))
                    .unwrap_or_else(|| "N/A".into());
                format!("{abr} | {ext}{size}")
            }
        }
    }
}

/// Everything the extractor returns for one URL
#[derive(Debug, Clone, Default)]
pub struct VideoInfo {
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub video_streams: Vec<StreamDescriptor>,
    pub audio_streams: Vec<StreamDescriptor>,
}

/// Metadata of the currently fetched video, replaced on every fetch
#[derive(Debug, Clone, Default)]
pub struct VideoSession {
    /// Video title as reported by the extractor
    pub title: String,
    /// Thumbnail address, fetched separately
    pub thumbnail_url: Option<String>,
    /// Video-only streams, sorted
    pub video_streams: Vec<StreamDescriptor>,
    /// Audio-only streams, sorted
    pub audio_streams: Vec<StreamDescriptor>,
}

impl VideoSession {
    pub fn streams(&self, kind: MediaKind) -> &[StreamDescriptor] {
        match kind {
            MediaKind::Video => &self.video_streams,
            MediaKind::Audio => &self.audio_streams,
        }
    }
}

/// What the Download button produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Only the chosen video stream
    VideoOnly,
    /// Only the chosen audio stream
    AudioOnly,
    /// Both streams merged into one mp4
    #[default]
    Both,
}

/// Colour of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Neutral,
    Success,
    Warning,
    Error,
}

/// Status line text shown under the title
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub text: String,
    pub tone: Tone,
}

impl Status {
    pub fn neutral(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: Tone::Neutral }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: Tone::Success }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: Tone::Warning }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: Tone::Error }
    }
}

/// State of the progress bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Fraction complete (0.0 to 1.0)
    Determinate(f32),
    /// Work is running but its length is unknown (merging)
    Indeterminate,
}

impl Default for Progress {
    fn default() -> Self {
        Progress::Determinate(0.0)
    }
}
