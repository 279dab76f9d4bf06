use chrono::Local;
use iced::widget::image as image_widget;
use iced::widget::{button, column, container, progress_bar, row, scrollable, text, text_input, Column};
use iced::{window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod state;
mod store;
mod ui;

use config::AppConfig;
use state::{AnnotationSession, DefaultReason, Outcome, SnapshotLoad};
use ui::preview::{self, Zoom};

/// Main application state
///
/// Everything about the images, labels and progress lives in the session;
/// this struct only keeps what the widgets need on top of it.
struct LabelAnnotator {
    session: AnnotationSession,
    config: AppConfig,
    /// Text currently in the label field, not yet committed
    draft: String,
    zoom: Zoom,
    /// Pixel size of the current image, if readable
    preview_size: Option<(u32, u32)>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    PickImageFolder,
    PickLabelFolder,
    Select(usize),
    Next,
    Previous,
    DraftChanged(String),
    SubmitLabel,
    Classify(Outcome),
    DeleteCurrent,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    SaveSession,
    CloseRequested(window::Id),
}

impl LabelAnnotator {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring config file, using defaults");
            AppConfig::default()
        });

        let session = AnnotationSession::new(config.navigation)
            .with_extensions(config.image_extensions.clone());

        let mut app = LabelAnnotator {
            session,
            config,
            draft: String::new(),
            zoom: Zoom::default(),
            preview_size: None,
            status: String::new(),
        };
        app.resume();

        (app, Task::none())
    }

    /// Restore the last session, then apply folders from the config
    fn resume(&mut self) {
        let snapshot_path = self.config.snapshot_path.clone();
        let outcome = self.session.load_snapshot(&snapshot_path);

        let mut message = match &outcome {
            SnapshotLoad::Loaded(_) => format!(
                "Resumed session: {} images, {} done.",
                self.session.len(),
                self.session.completed_count()
            ),
            SnapshotLoad::DefaultedEmpty(DefaultReason::Missing) => {
                "Ready. Pick an image folder and a label folder.".to_string()
            }
            SnapshotLoad::DefaultedEmpty(DefaultReason::Malformed(_)) => {
                format!("Ignored unreadable {}, starting fresh.", snapshot_path.display())
            }
        };

        if !outcome.is_loaded() {
            if let Some(dir) = self.config.image_dir.clone() {
                let report = self.session.open(&dir);
                message = format!("Loaded {} images from {}.", report.entries.len(), dir.display());
            }
        }
        if let Some(dir) = self.config.label_dir.clone() {
            if let Err(e) = self.session.set_label_store(&dir, self.config.create_label_dir) {
                error!(error = %e, "cannot use configured label folder");
                message = format!("Label folder error: {e}");
            }
        }

        self.refresh_current();
        self.set_status(message);
    }

    /// Reload the draft and preview size after the cursor moved
    fn refresh_current(&mut self) {
        self.draft = self.session.current_label().to_string();
        self.preview_size = self
            .session
            .current()
            .and_then(|entry| preview::image_size(&entry.path));
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = format!("[{}] {}", Local::now().format("%H:%M:%S"), message.into());
    }

    fn save_session(&mut self) {
        match self.session.save_snapshot(&self.config.snapshot_path) {
            Ok(()) => {
                let message = format!("Session saved to {}.", self.config.snapshot_path.display());
                self.set_status(message);
            }
            Err(e) => {
                error!(error = %e, "failed to save session");
                self.set_status(format!("Could not save session: {e}"));
            }
        }
    }

    fn pick_folder(title: &str) -> Option<PathBuf> {
        FileDialog::new().set_title(title).pick_folder()
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImageFolder => {
                if let Some(dir) = Self::pick_folder("Select Image Folder") {
                    let report = self.session.open(&dir);
                    self.zoom.reset();
                    self.refresh_current();

                    let status = if report.entries.is_empty() {
                        format!("No images found in {}.", dir.display())
                    } else if report.collisions.is_empty() {
                        format!("Loaded {} images from {}.", report.entries.len(), dir.display())
                    } else {
                        format!(
                            "Loaded {} images, skipped {} with a duplicate name.",
                            report.entries.len(),
                            report.collisions.len()
                        )
                    };
                    self.set_status(status);
                }
            }
            Message::PickLabelFolder => {
                if let Some(dir) = Self::pick_folder("Select Label Folder") {
                    match self.session.set_label_store(&dir, self.config.create_label_dir) {
                        Ok(count) => {
                            self.refresh_current();
                            self.set_status(format!("Loaded {} labels from {}.", count, dir.display()));
                        }
                        Err(e) => {
                            error!(error = %e, "cannot use label folder");
                            self.set_status(format!("Label folder error: {e}"));
                        }
                    }
                }
            }
            Message::Select(index) => {
                if self.session.jump_to(index) {
                    self.refresh_current();
                }
            }
            Message::Next => {
                self.session.advance();
                self.refresh_current();
            }
            Message::Previous => {
                self.session.retreat();
                self.refresh_current();
            }
            Message::DraftChanged(draft) => {
                self.draft = draft;
            }
            Message::SubmitLabel => {
                let key = self.session.current().map(|entry| entry.key.to_string());
                match self.session.commit_label(&self.draft) {
                    Ok(()) => {
                        info!(key = ?key, "label committed");
                        self.set_status(format!("Saved label for {}.", key.unwrap_or_default()));
                    }
                    Err(e) => {
                        error!(error = %e, "failed to save label");
                        self.set_status(format!("Could not save label: {e}"));
                    }
                }
            }
            Message::Classify(outcome) => {
                if self.session.classify(outcome) {
                    self.refresh_current();
                }
            }
            Message::DeleteCurrent => {
                let Some(entry) = self.session.current() else {
                    return Task::none();
                };
                let confirmed = MessageDialog::new()
                    .set_title("Delete image")
                    .set_description(format!(
                        "Delete {} and its label from disk?",
                        entry.file_name()
                    ))
                    .set_buttons(MessageButtons::YesNo)
                    .show();
                if !matches!(confirmed, MessageDialogResult::Yes) {
                    return Task::none();
                }

                match self.session.delete_current() {
                    Ok(Some(removed)) => {
                        self.refresh_current();
                        self.set_status(format!("Deleted {}.", removed.file_name()));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(error = %e, "failed to delete image");
                        self.set_status(format!("Could not delete: {e}"));
                    }
                }
            }
            Message::ZoomIn => self.zoom.zoom_in(),
            Message::ZoomOut => self.zoom.zoom_out(),
            Message::ZoomReset => self.zoom.reset(),
            Message::SaveSession => self.save_session(),
            Message::CloseRequested(id) => {
                self.save_session();
                return window::close(id);
            }
        }

        Task::none()
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let has_current = self.session.current().is_some();
        let on_current = |message: Message| has_current.then_some(message);

        let folder = |dir: Option<&std::path::Path>| {
            dir.map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        };
        let toolbar = row![
            button("Image Folder").on_press(Message::PickImageFolder).padding(8),
            button("Label Folder").on_press(Message::PickLabelFolder).padding(8),
            button("Save Session").on_press(Message::SaveSession).padding(8),
            text(format!(
                "Images: {}  Labels: {}",
                folder(self.session.image_dir()),
                folder(self.session.label_dir())
            ))
            .size(14),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        // Image list
        let position = self.session.position();
        let list = self.session.entries().iter().enumerate().fold(
            Column::new().spacing(2),
            |col, (index, entry)| {
                let marker = if entry.is_completed() { "✓" } else { "·" };
                let style: fn(&Theme, button::Status) -> button::Style = if index == position {
                    button::primary
                } else {
                    button::text
                };
                col.push(
                    button(text(format!("{} {}", marker, entry.file_name())).size(14))
                        .width(Length::Fill)
                        .style(style)
                        .on_press(Message::Select(index)),
                )
            },
        );
        let list = container(scrollable(list))
            .width(Length::Fixed(240.0))
            .height(Length::Fill);

        // Preview
        let preview: Element<Message> = match self.session.current() {
            Some(entry) => {
                let mut img = image_widget(image_widget::Handle::from_path(&entry.path));
                if let Some(size) = self.preview_size {
                    let (width, height) = self.zoom.scale(size);
                    img = img.width(Length::Fixed(width)).height(Length::Fixed(height));
                }
                column![text(entry.path.display().to_string()).size(14), img]
                    .spacing(10)
                    .align_x(Alignment::Center)
                    .into()
            }
            None => text("No image selected").size(20).into(),
        };
        let preview = container(preview)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill);

        // Controls
        let title = self
            .session
            .current()
            .map(|entry| entry.key.label_file_name())
            .unwrap_or_default();
        let counts = self.session.counts();
        let controls = column![
            text(title).size(20),
            text_input("Label", &self.draft)
                .on_input(Message::DraftChanged)
                .on_submit(Message::SubmitLabel)
                .padding(8),
            button("Submit")
                .on_press_maybe(on_current(Message::SubmitLabel))
                .padding(8),
            row![
                button("Previous").on_press_maybe(on_current(Message::Previous)),
                button("Next").on_press_maybe(on_current(Message::Next)),
            ]
            .spacing(10),
            row![
                button("OK")
                    .style(button::success)
                    .on_press_maybe(on_current(Message::Classify(Outcome::Ok))),
                button("Not OK")
                    .style(button::danger)
                    .on_press_maybe(on_current(Message::Classify(Outcome::NotOk))),
            ]
            .spacing(10),
            row![
                button("-").on_press(Message::ZoomOut),
                button(text(self.zoom.percent())).on_press(Message::ZoomReset),
                button("+").on_press(Message::ZoomIn),
            ]
            .spacing(10),
            button("Delete")
                .style(button::danger)
                .on_press_maybe(on_current(Message::DeleteCurrent)),
            progress_bar(0.0..=1.0, self.session.completion_fraction() as f32),
            text(format!(
                "{} / {} done",
                self.session.completed_count(),
                self.session.len()
            )),
            text(format!(
                "OK: {} | Not OK: {} ({} classified)",
                counts.ok,
                counts.not_ok,
                counts.total()
            )),
        ]
        .spacing(12)
        .width(Length::Fixed(300.0));

        let content = column![
            toolbar,
            row![list, preview, controls].spacing(20).height(Length::Fill),
            text(&self.status).size(14),
        ]
        .spacing(16)
        .padding(20);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        window::close_requests().map(Message::CloseRequested)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> iced::Result {
    init_tracing();

    iced::application(
        "Label Annotator",
        LabelAnnotator::update,
        LabelAnnotator::view,
    )
    .subscription(LabelAnnotator::subscription)
    .theme(LabelAnnotator::theme)
    .exit_on_close_request(false)
    .window_size(Size::new(1280.0, 820.0))
    .centered()
    .run_with(LabelAnnotator::new)
}
