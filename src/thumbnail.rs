use std::time::Duration;

use eframe::egui::ColorImage;
use image::imageops::FilterType;

use crate::error::AppError;

/// Size the thumbnail is scaled to before it reaches the UI.
pub const THUMBNAIL_SIZE: [u32; 2] = [240, 135];

/// Blocking thumbnail loader; callers run it on a blocking thread.
pub trait ThumbnailSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<ColorImage, AppError>;
}

/// Downloads thumbnails over HTTP and decodes them with `image`.
pub struct HttpThumbnails {
    client: reqwest::blocking::Client,
}

impl HttpThumbnails {
    pub fn new() -> Result<Self, AppError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

impl ThumbnailSource for HttpThumbnails {
    fn fetch(&self, url: &str) -> Result<ColorImage, AppError> {
        tracing::debug!(url, "fetching thumbnail");
        let bytes = self.client.get(url).send()?.error_for_status()?.bytes()?;
        if bytes.is_empty() {
            return Err(AppError::Thumbnail(format!("empty response from {url}")));
        }
        decode_thumbnail(&bytes)
    }
}

/// Decodes image bytes and scales them to [`THUMBNAIL_SIZE`].
pub fn decode_thumbnail(bytes: &[u8]) -> Result<ColorImage, AppError> {
    let [w, h] = THUMBNAIL_SIZE;
    let img = image::load_from_memory(bytes)?
        .resize_exact(w, h, FilterType::Triangle)
        .to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, &img))
}
