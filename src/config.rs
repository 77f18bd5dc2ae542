use std::path::PathBuf;

const YTDLP_VAR: &str = "YT_STREAM_PICKER_YTDLP";
const FFMPEG_VAR: &str = "YT_STREAM_PICKER_FFMPEG";
const OUTPUT_DIR_VAR: &str = "YT_STREAM_PICKER_OUTPUT_DIR";
const THEME_FILE_VAR: &str = "YT_STREAM_PICKER_THEME_FILE";

/// Tool locations and paths, overridable from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// yt-dlp executable
    pub ytdlp_bin: PathBuf,
    /// ffmpeg executable
    pub ffmpeg_bin: PathBuf,
    /// Where finished files are written
    pub output_dir: PathBuf,
    /// File holding the chosen theme name
    pub theme_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: PathBuf::from(if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }),
            ffmpeg_bin: PathBuf::from(if cfg!(target_os = "windows") { "ffmpeg.exe" } else { "ffmpeg" }),
            output_dir: PathBuf::from("."),
            theme_file: PathBuf::from("theme_preference.txt"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        if let Some(v) = var(YTDLP_VAR) {
            config.ytdlp_bin = v;
        }
        if let Some(v) = var(FFMPEG_VAR) {
            config.ffmpeg_bin = v;
        }
        if let Some(v) = var(OUTPUT_DIR_VAR) {
            config.output_dir = v;
        }
        if let Some(v) = var(THEME_FILE_VAR) {
            config.theme_file = v;
        }
        tracing::debug!(?config, "configuration loaded");
        config
    }
}
