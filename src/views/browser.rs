use std::time::Duration;

use iced::widget::{button, column, container, image, pick_list, row, text, text_input};
use iced::{Element, Length};

use crate::catalog::{ListEntry, SoundRecord};
use crate::controller::{CatalogView, Status};
use crate::message::Message;

#[derive(Debug, Default)]
struct IconSlot {
    path: Option<String>,
    handle: Option<image::Handle>,
    requested: bool,
}

/// What the browser window currently shows. The controller writes to it
/// through [`CatalogView`]; the iced `view` reads from it.
#[derive(Debug, Default)]
pub struct BrowserView {
    listing: Vec<ListEntry>,
    record: Option<SoundRecord>,
    status: String,
    status_is_error: bool,
    icon: IconSlot,
}

impl BrowserView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self) -> &[ListEntry] {
        &self.listing
    }

    pub fn record(&self) -> Option<&SoundRecord> {
        self.record.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn status_is_error(&self) -> bool {
        self.status_is_error
    }

    /// The icon path still waiting to be fetched, marked as requested.
    pub fn take_icon_request(&mut self) -> Option<String> {
        if self.icon.requested {
            return None;
        }
        self.icon.requested = true;
        self.icon.path.clone()
    }

    /// Install fetched icon bytes, unless the record changed meanwhile.
    pub fn set_icon(&mut self, path: &str, bytes: Vec<u8>) -> bool {
        if self.icon.path.as_deref() != Some(path) {
            return false;
        }
        self.icon.handle = Some(image::Handle::from_bytes(bytes));
        true
    }

    fn selected_entry(&self) -> Option<ListEntry> {
        self.record.as_ref().map(SoundRecord::list_entry)
    }
}

impl CatalogView for BrowserView {
    fn show_listing(&mut self, entries: &[ListEntry]) {
        self.listing = entries.to_vec();
    }

    fn show_record(&mut self, record: &SoundRecord) {
        if self.icon.path != record.icon {
            self.icon = IconSlot {
                path: record.icon.clone(),
                ..IconSlot::default()
            };
        }
        self.record = Some(record.clone());
    }

    fn clear_record(&mut self) {
        self.record = None;
        self.icon = IconSlot::default();
    }

    fn show_status(&mut self, status: &Status) {
        self.status = status.to_string();
        self.status_is_error = matches!(status, Status::Error(_));
    }
}

/// Playback facts the browser renders next to the play button.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackSummary {
    pub catalog_len: usize,
    /// Playing, or waiting for the clip to start.
    pub active: bool,
    pub can_play: bool,
    pub position: Duration,
}

// LCOV_EXCL_START

/// Build the catalog browser.
pub fn view<'a>(
    browser: &'a BrowserView,
    query: &'a str,
    playback: &PlaybackSummary,
) -> Element<'a, Message> {
    let toolbar = row![
        button(text("Open…")).on_press(Message::OpenCatalog),
        button(text("Reload")).on_press(Message::Reload),
        text(format!("{} sounds", playback.catalog_len)).size(13),
    ]
    .spacing(8);

    let search = text_input("Search by id, IPA, example or type…", query)
        .on_input(Message::SearchChanged)
        .width(Length::Fill);

    let picker = pick_list(
        browser.listing().to_vec(),
        browser.selected_entry(),
        Message::SoundSelected,
    )
    .placeholder("Select a sound…")
    .width(Length::Fill);

    let mut play_btn = button(text(if playback.active { "Stop" } else { "Play" }));
    if playback.can_play {
        play_btn = play_btn.on_press(Message::PlayToggle);
    }
    let elapsed = playback.position.as_secs();
    let position = text(format!("{:02}:{:02}", elapsed / 60, elapsed % 60)).size(12);

    let mut status = text(browser.status()).size(14);
    if browser.status_is_error() {
        status = status.style(text::danger);
    }

    column![
        text("Sound chart").size(24),
        toolbar,
        search,
        picker,
        record_panel(browser),
        row![play_btn, position].spacing(8),
        status,
    ]
    .spacing(12)
    .padding(20)
    .width(Length::Fill)
    .into()
}

/// Render the selected record's icon and metadata.
fn record_panel(browser: &BrowserView) -> Element<'_, Message> {
    let Some(record) = browser.record() else {
        return container(text("No sound selected.").size(14))
            .padding(12)
            .into();
    };

    let icon: Element<'_, Message> = match &browser.icon.handle {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(96.0))
            .height(Length::Fixed(96.0))
            .into(),
        None => container(text("No icon").size(12))
            .width(Length::Fixed(96.0))
            .height(Length::Fixed(96.0))
            .into(),
    };

    let field = |label: &'static str, value: &str| {
        let value = if value.is_empty() { "--" } else { value };
        row![
            text(label).size(13).width(Length::Fixed(80.0)),
            text(value.to_owned()).size(13)
        ]
        .spacing(8)
    };

    let details = column![
        field("ID", &record.id),
        field("Type", &record.kind),
        field("IPA", &record.ipa),
        field("Example", &record.example),
        text(&record.description).size(13),
    ]
    .spacing(4)
    .width(Length::Fill);

    row![icon, details].spacing(16).into()
}

// LCOV_EXCL_STOP
