/// Template handed to `yt-dlp --progress-template`; each update becomes one
/// `progress:<downloaded>:<total>:<estimate>` line on stdout.
pub const PROGRESS_TEMPLATE: &str = "download:progress:%(progress.downloaded_bytes)s:%(progress.total_bytes)s:%(progress.total_bytes_estimate)s";

/// One progress update reported by yt-dlp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    /// Bytes written so far
    pub downloaded: u64,
    /// Exact or estimated total, when yt-dlp knows one
    pub total: Option<u64>,
}

pub fn parse_progress_from_line(line: &str) -> Option<ProgressSample> {
    let rest = line.trim().strip_prefix("progress:")?;
    let mut fields = rest.split(':');
    let downloaded = parse_bytes(fields.next()?)?;
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);
    Some(ProgressSample { downloaded, total: total.or(estimate) })
}

// yt-dlp prints "NA" for unknown fields and floats for estimates
fn parse_bytes(field: &str) -> Option<u64> {
    let field = field.trim();
    if let Ok(v) = field.parse::<u64>() {
        return Some(v);
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64)
}

/// Turns cumulative samples into `(delta, remaining)` pairs. `remaining` is
/// `None` while neither yt-dlp nor the format metadata know the total.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: u64,
    fallback_total: Option<u64>,
}

impl ProgressTracker {
    /// `fallback_total` is used when yt-dlp reports no total of its own.
    pub fn new(fallback_total: Option<u64>) -> Self {
        Self { last: 0, fallback_total }
    }

    pub fn update(&mut self, sample: ProgressSample) -> (u64, Option<u64>) {
        let delta = sample.downloaded.saturating_sub(self.last);
        self.last = self.last.max(sample.downloaded);
        let remaining = sample
            .total
            .or(self.fallback_total)
            .map(|total| total.saturating_sub(sample.downloaded));
        (delta, remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_total() {
        assert_eq!(
            parse_progress_from_line("progress:1024:4096:NA"),
            Some(ProgressSample { downloaded: 1024, total: Some(4096) })
        );
    }

    #[test]
    fn falls_back_to_estimate() {
        assert_eq!(
            parse_progress_from_line("progress:10:NA:2000.5\n"),
            Some(ProgressSample { downloaded: 10, total: Some(2000) })
        );
    }

    #[test]
    fn unknown_total_is_none() {
        assert_eq!(
            parse_progress_from_line("progress:10:NA:NA"),
            Some(ProgressSample { downloaded: 10, total: None })
        );
    }

    #[test]
    fn ignores_other_output() {
        assert_eq!(parse_progress_from_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress_from_line("progress:NA:NA:NA"), None);
    }

    #[test]
    fn tracker_reports_deltas_and_remaining() {
        let mut t = ProgressTracker::new(None);
        assert_eq!(t.update(ProgressSample { downloaded: 100, total: Some(1000) }), (100, Some(900)));
        assert_eq!(t.update(ProgressSample { downloaded: 600, total: Some(1000) }), (500, Some(400)));
        assert_eq!(t.update(ProgressSample { downloaded: 1000, total: Some(1000) }), (400, Some(0)));
    }

    #[test]
    fn tracker_uses_fallback_total() {
        let mut t = ProgressTracker::new(Some(50));
        assert_eq!(t.update(ProgressSample { downloaded: 20, total: None }), (20, Some(30)));
    }

    #[test]
    fn tracker_without_any_total_reports_unknown_remaining() {
        let mut t = ProgressTracker::new(None);
        let sample = parse_progress_from_line("progress:1048576:NA:NA").unwrap();
        assert_eq!(t.update(sample), (1048576, None));
        let sample = parse_progress_from_line("progress:2097152:NA:NA").unwrap();
        assert_eq!(t.update(sample), (1048576, None));
    }
}
