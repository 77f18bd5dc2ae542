use once_cell::sync::Lazy;
use regex::Regex;

/// Longest name, in characters, that `clean_filename` returns.
pub const MAX_FILENAME_CHARS: usize = 100;

static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s_-]").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strips everything but letters, digits, whitespace, `-` and `_`, collapses
/// whitespace and caps the length.
pub fn clean_filename(title: &str) -> String {
    let kept = DISALLOWED_RE.replace_all(title, "");
    let collapsed = WS_RE.replace_all(kept.trim(), " ");
    let truncated: String = collapsed.chars().take(MAX_FILENAME_CHARS).collect();
    // truncation can expose a trailing space
    truncated.trim_end().to_string()
}
