//! Main application for the stream picker GUI

// Environment-driven tool paths and output folder
mod config;
// Download/merge coordinator
mod download;
// Error type shared by every coordinator
mod error;
// UI message queue and cancellation helper
mod events;
// yt-dlp metadata and stream download
mod extractor;
// In-memory collaborators for tests
#[cfg(test)]
mod fakes;
// Fetch coordinator
mod fetch;
// Output filename sanitizing
mod filename;
// Data models for streams, sessions and status
mod model;
// ffmpeg stream-copy merge
mod muxer;
// Progress parsing utilities
mod progress;
// Chosen video/audio streams
mod selection;
// Collaborator bundle handed to background tasks
mod services;
// Window state owned by the UI thread
mod session;
// Theme preference persistence
mod settings;
// Stream ordering by container and quality
mod sorter;
// Colour themes
mod theme;
// Thumbnail fetching module
mod thumbnail;
// External tool availability probe
mod tools;

use std::{future::Future, path::Path, sync::Arc};

// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::{Color32, RichText, TextureOptions};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use tokio::runtime::Runtime;

use config::AppConfig;
use events::{UiReceiver, UiSender, ui_queue};
use model::{MediaKind, OutputMode, Progress, Tone};
use services::Services;
use session::Session;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

/// Program entry point: initializes logging and runtime, then launches the GUI
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let rt = Arc::new(Runtime::new()?);
    let _ = RUNTIME.set(rt);

    let config = AppConfig::from_env();
    let services = Services::from_config(&config)?;
    let theme_name = settings::load_theme_preference(&config.theme_file);
    tracing::info!(theme = %theme_name, "starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([850.0, 750.0]),
        ..Default::default()
    };
    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| Box::new(StreamPickerApp::new(&cc.egui_ctx, config, services, theme_name))),
    )?;
    Ok(())
}

/// Hands a task to the global runtime.
fn spawn<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match RUNTIME.get() {
        Some(rt) => {
            rt.spawn(fut);
        }
        None => tracing::error!("runtime not initialised, task dropped"),
    }
}

/// Application state for the GUI
struct StreamPickerApp {
    /// Everything the window shows
    session: Session,
    /// Collaborators for background tasks
    services: Services,
    /// Paths and tool locations
    config: AppConfig,
    /// Background tasks post here
    ui_tx: UiSender,
    /// Drained once per frame
    ui_rx: UiReceiver,
    /// Uploaded thumbnail of the current video
    thumbnail: Option<egui::TextureHandle>,
    /// Colours of the active theme
    palette: theme::Palette,
}

impl StreamPickerApp {
    fn new(ctx: &egui::Context, config: AppConfig, services: Services, theme: String) -> Self {
        let (ui_tx, ui_rx) = ui_queue(Some(ctx.clone()));
        spawn(tools::check_tools(config.clone(), ui_tx.clone()));
        let palette = theme::palette_or_fallback(&theme);
        ctx.set_visuals(palette.visuals());
        Self {
            session: Session::new(config.output_dir.display().to_string(), theme),
            services,
            config,
            ui_tx,
            ui_rx,
            thumbnail: None,
            palette,
        }
    }

    fn start_fetch(&mut self) {
        let Some((url, token)) = self.session.begin_fetch() else {
            return;
        };
        self.thumbnail = None;
        spawn(fetch::run(self.services.clone(), url, self.ui_tx.clone(), token));
    }

    fn start_download(&mut self) {
        let Some((request, token)) = self.session.begin_download() else {
            return;
        };
        spawn(download::run(self.services.clone(), request, self.ui_tx.clone(), token));
    }

    fn change_theme(&mut self, ctx: &egui::Context, name: String) {
        self.palette = theme::palette_or_fallback(&name);
        ctx.set_visuals(self.palette.visuals());
        if let Err(e) = settings::save_theme_preference(&self.config.theme_file, &name) {
            tracing::warn!("could not save theme preference: {}", e);
        }
        self.session.theme = name;
    }

    fn input_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let fetch_width = 120.0;
            ui.add_sized(
                [ui.available_width() - fetch_width - 8.0, 24.0],
                egui::TextEdit::singleline(&mut self.session.url_input)
                    .hint_text("Enter YouTube URL here..."),
            );
            let fetch = ui.add_enabled(
                !self.session.is_fetching(),
                egui::Button::new("Fetch Info").min_size(egui::vec2(fetch_width, 24.0)),
            );
            if fetch.clicked() {
                self.start_fetch();
            }
        });
    }

    fn info_panel(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                let [w, h] = thumbnail::THUMBNAIL_SIZE;
                let size = egui::vec2(w as f32, h as f32);
                match &self.thumbnail {
                    Some(tex) => {
                        ui.add(egui::Image::new(tex).fit_to_exact_size(size));
                    }
                    None => {
                        ui.add_sized(size, egui::Label::new(self.session.thumbnail_note()));
                    }
                }
                ui.vertical(|ui| {
                    ui.add(egui::Label::new(RichText::new(self.session.headline()).strong().size(16.0)).wrap(true));
                    let status = self.session.status();
                    let color = match status.tone {
                        Tone::Neutral => ui.visuals().text_color(),
                        Tone::Success => Color32::LIGHT_GREEN,
                        Tone::Warning => Color32::YELLOW,
                        Tone::Error => Color32::LIGHT_RED,
                    };
                    ui.label(RichText::new(&status.text).color(color));
                    let bar = match self.session.progress() {
                        Progress::Determinate(p) => egui::ProgressBar::new(p).show_percentage(),
                        Progress::Indeterminate => egui::ProgressBar::new(0.0).animate(true),
                    };
                    ui.add(bar);
                });
            });
        });
    }

    /// Draws one stream list; returns the clicked row.
    fn stream_list(&self, ui: &mut egui::Ui, kind: MediaKind, heading: &str) -> Option<usize> {
        let mut clicked = None;
        let accent = self.palette.accent;
        ui.strong(heading);
        egui::ScrollArea::vertical()
            .id_source(heading)
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                let Some(video) = self.session.video() else {
                    return;
                };
                for (row, stream) in video.streams(kind).iter().enumerate() {
                    let mut button = egui::Button::new(stream.label());
                    if self.session.selection().is_highlighted(kind, row) {
                        button = button.fill(accent);
                    }
                    if ui.add_sized([ui.available_width(), 24.0], button).clicked() {
                        clicked = Some(row);
                    }
                }
            });
        clicked
    }

    fn stream_lists(&mut self, ui: &mut egui::Ui) {
        let mut clicks = Vec::new();
        ui.columns(2, |cols| {
            if let Some(row) = self.stream_list(&mut cols[0], MediaKind::Video, "Video Streams (MP4/WEBM Sorted by Quality)") {
                clicks.push((MediaKind::Video, row));
            }
            if let Some(row) = self.stream_list(&mut cols[1], MediaKind::Audio, "Audio Streams (M4A/WEBM Sorted by Bitrate)") {
                clicks.push((MediaKind::Audio, row));
            }
        });
        for (kind, row) in clicks {
            self.session.select(kind, row);
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.label("Output Filename:");
            ui.add(
                egui::TextEdit::singleline(&mut self.session.filename_input)
                    .hint_text("Enter custom filename...")
                    .desired_width(f32::INFINITY),
            );
        });

        // Folder selection
        ui.horizontal(|ui| {
            ui.label("Output folder:");
            ui.text_edit_singleline(&mut self.session.output_dir);
            if ui.button("Browse…").clicked() {
                if let Some(folder) = FileDialog::new().set_directory(&self.session.output_dir).pick_folder() {
                    self.session.output_dir = folder.display().to_string();
                }
            }
        });

        ui.horizontal(|ui| {
            ui.radio_value(&mut self.session.mode, OutputMode::VideoOnly, "Video Only");
            ui.radio_value(&mut self.session.mode, OutputMode::AudioOnly, "Audio Only");
            ui.radio_value(&mut self.session.mode, OutputMode::Both, "Both");
            ui.separator();

            let download = ui.add_enabled(
                self.session.can_download(),
                egui::Button::new("Download").min_size(egui::vec2(150.0, 24.0)),
            );
            if download.clicked() {
                self.start_download();
            }
            if self.session.is_downloading() && ui.button("Cancel").clicked() {
                self.session.cancel_download();
            }
            if let Some(output) = self.session.last_output() {
                if ui.button("Open Folder").clicked() {
                    let folder = output.parent().unwrap_or(Path::new(".")).to_path_buf();
                    open_folder(folder);
                }
            }

            ui.separator();
            ui.label("Theme:");
            let mut chosen = self.session.theme.clone();
            egui::ComboBox::from_id_source("theme")
                .selected_text(chosen.clone())
                .show_ui(ui, |ui| {
                    for name in theme::theme_names() {
                        ui.selectable_value(&mut chosen, name.to_string(), name);
                    }
                });
            if chosen != self.session.theme {
                self.change_theme(ctx, chosen);
            }
        });
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for StreamPickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Apply everything background tasks posted since the last frame
        for msg in self.ui_rx.drain() {
            if let Some(image) = self.session.apply(msg) {
                self.thumbnail = Some(ctx.load_texture("thumbnail", image, TextureOptions::default()));
            }
        }

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(6.0);
            self.controls(ui, ctx);
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.input_row(ui);
            ui.add_space(8.0);
            self.info_panel(ui);
            ui.add_space(8.0);
            self.stream_lists(ui);
        });

        // Keep the merge spinner moving
        if self.session.progress() == Progress::Indeterminate {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

/// Opens `folder` in the platform file manager
fn open_folder(folder: std::path::PathBuf) {
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let result = std::process::Command::new("explorer").arg(&folder).spawn();
        #[cfg(target_os = "macos")]
        let result = std::process::Command::new("open").arg(&folder).spawn();
        #[cfg(all(unix, not(target_os = "macos")))]
        let result = std::process::Command::new("xdg-open").arg(&folder).spawn();
        if let Err(e) = result {
            tracing::warn!("could not open {}: {}", folder.display(), e);
        }
    });
}
