use std::{path::Path, process::Stdio};

use tokio::process::Command;

use crate::{
    config::AppConfig,
    events::{UiMessage, UiSender},
};

/// Runs `<bin> <version_flag>` and reports whether it exited cleanly.
pub async fn is_available(bin: &Path, version_flag: &str) -> bool {
    Command::new(bin)
        .arg(version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Startup probe; posts one [`UiMessage::ToolMissing`] per missing tool.
pub async fn check_tools(config: AppConfig, ui: UiSender) {
    let tools = [
        (config.ytdlp_bin.as_path(), "--version"),
        (config.ffmpeg_bin.as_path(), "-version"),
    ];
    for (bin, flag) in tools {
        if is_available(bin, flag).await {
            tracing::debug!(tool = %bin.display(), "tool found");
        } else {
            tracing::warn!(tool = %bin.display(), "tool not found");
            ui.send(UiMessage::ToolMissing(bin.display().to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ui_queue;
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_tools_are_reported() {
        let config = AppConfig {
            ytdlp_bin: PathBuf::from("no-such-yt-dlp-binary"),
            ffmpeg_bin: PathBuf::from("no-such-ffmpeg-binary"),
            ..AppConfig::default()
        };
        let (tx, mut rx) = ui_queue(None);
        check_tools(config, tx).await;

        let missing: Vec<String> = rx
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                UiMessage::ToolMissing(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec!["no-such-yt-dlp-binary", "no-such-ffmpeg-binary"]);
    }
}
