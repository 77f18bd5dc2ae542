use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::AppError,
    extractor::{Extractor, YtDlp},
    muxer::{Ffmpeg, Muxer},
    thumbnail::{HttpThumbnails, ThumbnailSource},
};

/// External collaborators the coordinators talk to.
#[derive(Clone)]
pub struct Services {
    pub extractor: Arc<dyn Extractor>,
    pub muxer: Arc<dyn Muxer>,
    pub thumbnails: Arc<dyn ThumbnailSource>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            extractor: Arc::new(YtDlp::new(&config.ytdlp_bin)),
            muxer: Arc::new(Ffmpeg::new(&config.ffmpeg_bin)),
            thumbnails: Arc::new(HttpThumbnails::new()?),
        })
    }
}
