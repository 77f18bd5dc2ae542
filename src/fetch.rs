use tokio_util::sync::CancellationToken;

use crate::{
    error::AppError,
    events::{UiMessage, UiSender, cancellable},
    filename::clean_filename,
    model::VideoSession,
    services::Services,
    sorter::sort_streams,
};

/// Fetch task body. Always ends with [`UiMessage::FetchFinished`].
pub async fn run(services: Services, url: String, ui: UiSender, cancel: CancellationToken) {
    match load_session(&services, &url, &cancel).await {
        Ok(session) => {
            let thumbnail_url = session.thumbnail_url.clone();
            let default_filename = clean_filename(&session.title);
            ui.send(UiMessage::SessionLoaded { session, default_filename });
            if let Some(thumb) = thumbnail_url {
                load_thumbnail(&services, thumb, &ui).await;
            }
        }
        Err(e) => {
            if e.is_validation() {
                tracing::info!("fetch rejected: {}", e);
            } else {
                tracing::warn!(url = %url, "fetch failed: {}", e);
            }
            ui.send(UiMessage::FetchFailed(e));
        }
    }
    ui.send(UiMessage::FetchFinished);
}

/// Validates the URL, asks the extractor and sorts both stream lists.
pub async fn load_session(
    services: &Services,
    url: &str,
    cancel: &CancellationToken,
) -> Result<VideoSession, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::EmptyUrl);
    }
    let info = cancellable(cancel, services.extractor.fetch(url)).await?;
    Ok(VideoSession {
        title: info.title,
        thumbnail_url: info.thumbnail_url,
        video_streams: sort_streams(info.video_streams),
        audio_streams: sort_streams(info.audio_streams),
    })
}

async fn load_thumbnail(services: &Services, url: String, ui: &UiSender) {
    let source = services.thumbnails.clone();
    let result = tokio::task::spawn_blocking(move || source.fetch(&url)).await;
    match result {
        Ok(Ok(image)) => ui.send(UiMessage::Thumbnail(image)),
        Ok(Err(e)) => {
            tracing::warn!("thumbnail failed: {}", e);
            ui.send(UiMessage::ThumbnailFailed(e.to_string()));
        }
        Err(e) => {
            tracing::error!("thumbnail task panicked: {}", e);
            ui.send(UiMessage::ThumbnailFailed(e.to_string()));
        }
    }
}
