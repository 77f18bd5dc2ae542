use std::path::Path;

use crate::{error::AppError, theme};

/// Theme saved by the previous session, or the default theme.
pub fn load_theme_preference(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(saved) => {
            let saved = saved.trim();
            if theme::is_known(saved) {
                return saved.to_string();
            }
            tracing::warn!("ignoring unknown saved theme {:?}", saved);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not read {}: {}", path.display(), e),
    }
    theme::default_theme().to_string()
}

pub fn save_theme_preference(path: &Path, name: &str) -> Result<(), AppError> {
    std::fs::write(path, name)?;
    tracing::debug!(theme = name, "theme preference saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file() -> PathBuf {
        std::env::temp_dir().join(format!("theme-pref-{}.txt", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_file_gives_default() {
        assert_eq!(load_theme_preference(&scratch_file()), "Dark Blue");
    }

    #[test]
    fn saved_theme_round_trips() {
        let path = scratch_file();
        save_theme_preference(&path, "Lavender").unwrap();
        assert_eq!(load_theme_preference(&path), "Lavender");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unknown_saved_theme_gives_default() {
        let path = scratch_file();
        std::fs::write(&path, "Neon Pink\n").unwrap();
        assert_eq!(load_theme_preference(&path), "Dark Blue");
        std::fs::remove_file(&path).unwrap();
    }
}
