use crate::model::{MediaKind, StreamDescriptor};

/// A chosen stream and the list row that shows it as selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Chosen {
    pub row: usize,
    pub stream: StreamDescriptor,
}

/// At most one video and one audio stream, chosen independently.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    video: Option<Chosen>,
    audio: Option<Chosen>,
}

impl Selection {
    /// Replaces the choice for `stream.kind`. Returns `false` when that
    /// stream was already chosen, leaving everything as it was.
    pub fn select(&mut self, row: usize, stream: &StreamDescriptor) -> bool {
        let slot = self.slot_mut(stream.kind);
        if slot.as_ref().is_some_and(|c| c.stream == *stream) {
            return false;
        }
        tracing::info!(
            kind = %stream.kind,
            format = %stream.handle.format_id,
            "selected {} | {}",
            stream.label(),
            stream.mime_type()
        );
        *slot = Some(Chosen { row, stream: stream.clone() });
        true
    }

    pub fn chosen(&self, kind: MediaKind) -> Option<&Chosen> {
        match kind {
            MediaKind::Video => self.video.as_ref(),
            MediaKind::Audio => self.audio.as_ref(),
        }
    }

    pub fn stream(&self, kind: MediaKind) -> Option<&StreamDescriptor> {
        self.chosen(kind).map(|c| &c.stream)
    }

    /// Whether list row `row` of `kind` is drawn highlighted.
    pub fn is_highlighted(&self, kind: MediaKind, row: usize) -> bool {
        self.chosen(kind).is_some_and(|c| c.row == row)
    }

    pub fn clear(&mut self) {
        self.video = None;
        self.audio = None;
    }

    fn slot_mut(&mut self, kind: MediaKind) -> &mut Option<Chosen> {
        match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{audio, video};

    #[test]
    fn selecting_same_stream_twice_is_a_no_op() {
        let mut sel = Selection::default();
        let v = video("137", "mp4", Some(1080));
        assert!(sel.select(0, &v));
        let before = sel.chosen(MediaKind::Video).cloned();

        assert!(!sel.select(0, &v));
        assert_eq!(sel.chosen(MediaKind::Video).cloned(), before);
        assert!(sel.is_highlighted(MediaKind::Video, 0));
    }

    #[test]
    fn new_choice_moves_the_highlight() {
        let mut sel = Selection::default();
        sel.select(0, &video("137", "mp4", Some(1080)));
        assert!(sel.select(2, &video("136", "mp4", Some(720))));

        assert!(!sel.is_highlighted(MediaKind::Video, 0));
        assert!(sel.is_highlighted(MediaKind::Video, 2));
        assert_eq!(sel.stream(MediaKind::Video).unwrap().handle.format_id, "136");
    }

    #[test]
    fn video_choice_leaves_audio_alone() {
        let mut sel = Selection::default();
        let a = audio("140", "m4a", Some(128.0));
        sel.select(1, &a);
        sel.select(0, &video("137", "mp4", Some(1080)));
        sel.select(3, &video("248", "webm", Some(1080)));

        let chosen = sel.chosen(MediaKind::Audio).unwrap();
        assert_eq!(chosen.stream, a);
        assert_eq!(chosen.row, 1);
    }

    #[test]
    fn clear_drops_both_kinds() {
        let mut sel = Selection::default();
        sel.select(0, &video("137", "mp4", Some(1080)));
        sel.select(0, &audio("140", "m4a", Some(128.0)));
        sel.clear();
        assert!(sel.stream(MediaKind::Video).is_none());
        assert!(sel.stream(MediaKind::Audio).is_none());
        assert!(!sel.is_highlighted(MediaKind::Audio, 0));
    }
}
