use std::cmp::Reverse;

use crate::model::StreamDescriptor;

/// Orders streams of one kind: mp4-family containers first, then best quality first.
///
/// `sort_by_key` is stable, so equal keys keep the extractor's order.
pub fn sort_streams(mut streams: Vec<StreamDescriptor>) -> Vec<StreamDescriptor> {
    streams.sort_by_key(|s| (!s.is_preferred_container(), Reverse(s.quality_score())));
    streams
}
