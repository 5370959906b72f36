use std::time::Duration;

use iced::{Element, Subscription, Task, Theme};
use tracing::{debug, warn};

use crate::audio::RodioOutput;
use crate::catalog::{Catalog, CatalogLoader, Location};
use crate::config::AppConfig;
use crate::controller::{Controller, ControllerState, LoadTicket};
use crate::message::Message;
use crate::playback::{EngineState, MediaFetcher, StartRequest};
use crate::views::browser::{BrowserView, PlaybackSummary};

// ─── Application state ─────────────────────────────────────────

#[derive(Debug)]
pub struct Soundchart {
    config: AppConfig,
    controller: Controller<RodioOutput, BrowserView>,
    http: reqwest::Client,
    loader: CatalogLoader,
    media: MediaFetcher,
}

impl Soundchart {
    pub fn new() -> (Self, Task<Message>) {
        let config = crate::config::load();
        let http = reqwest::Client::new();
        let controller = Controller::new(RodioOutput::new(), BrowserView::new())
            .with_select_first_on_load(config.catalog.select_first_on_load);

        let mut app = Self {
            loader: CatalogLoader::new(http.clone(), config.media_convention()),
            media: MediaFetcher::new(http.clone(), config.root()),
            http,
            controller,
            config,
        };
        let task = app.load_configured();
        (app, task)
    }

    #[allow(clippy::unused_self)]
    pub fn title(&self) -> String {
        String::from("Sound chart")
    }

    pub fn theme(&self) -> Theme {
        if self.config.ui.dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            // ─── Catalog lifecycle ──────────────────────────
            Message::CatalogLoaded(generation, result) => {
                // Failures are reported on the status line by the controller.
                let _ = self.controller.finish_load(generation, result);
                Task::none()
            }
            Message::Reload => match self.controller.source().cloned() {
                Some(source) => self.start(source),
                None => self.load_configured(),
            },
            Message::OpenCatalog => Task::perform(
                async {
                    rfd::AsyncFileDialog::new()
                        .add_filter("Catalog", &["json"])
                        .set_title("Open sound catalog")
                        .pick_file()
                        .await
                        .map(|file| file.path().to_path_buf())
                },
                Message::CatalogPicked,
            ),
            Message::CatalogPicked(Some(path)) => match self.config.use_catalog_file(&path) {
                Ok(()) => {
                    if let Err(e) = crate::config::save(&self.config) {
                        warn!(error = %e, "failed to save config");
                    }
                    self.media = MediaFetcher::new(self.http.clone(), self.config.root());
                    self.load_configured()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unusable catalog file");
                    Task::none()
                }
            },
            Message::CatalogPicked(None) => Task::none(),

            // ─── Selection ──────────────────────────────────
            Message::SoundSelected(entry) if entry.is_placeholder() => Task::none(),
            Message::SoundSelected(entry) => {
                let _ = self.controller.select(&entry.id);
                Task::none()
            }
            Message::SearchChanged(query) => {
                let _ = self.controller.search(&query);
                Task::none()
            }

            // ─── Playback ───────────────────────────────────
            Message::PlayToggle => match self.controller.play_toggle() {
                Ok(Some(request)) => self.fetch_clip(request),
                Ok(None) | Err(_) => Task::none(),
            },
            Message::ClipFetched(request, result) => {
                let _ = self.controller.finish_play(request.ticket, result);
                Task::none()
            }
            Message::PlaybackTick => {
                self.controller.tick();
                Task::none()
            }

            // ─── Icons ──────────────────────────────────────
            Message::IconFetched(path, Ok(bytes)) => {
                if !self.controller.view_mut().set_icon(&path, bytes) {
                    debug!(%path, "dropped icon for a record no longer shown");
                }
                Task::none()
            }
            Message::IconFetched(path, Err(e)) => {
                debug!(%path, error = %e, "icon unavailable");
                Task::none()
            }
        };

        Task::batch([task, self.fetch_icon()])
    }

    pub fn view(&self) -> Element<'_, Message> {
        let engine = self.controller.engine();
        let playback = PlaybackSummary {
            catalog_len: self.controller.catalog().map_or(0, Catalog::len),
            active: engine.state() == EngineState::Playing || engine.is_starting(),
            can_play: self.controller.selection().is_some(),
            position: engine.position(),
        };
        crate::views::browser::view(self.controller.view(), self.controller.query(), &playback)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.controller.state() == ControllerState::Playing {
            iced::time::every(Duration::from_millis(250)).map(|_| Message::PlaybackTick)
        } else {
            Subscription::none()
        }
    }

    // ─── Tasks ──────────────────────────────────────────────────

    fn load_configured(&mut self) -> Task<Message> {
        match self.config.catalog_location() {
            Ok(source) => self.start(source),
            Err(e) => {
                // Loading the bare root fails and puts the error on the status line.
                warn!(error = %e, "invalid catalog location");
                let root = self.config.root();
                self.start(root)
            }
        }
    }

    fn start(&mut self, source: Location) -> Task<Message> {
        let LoadTicket { generation, source } = self.controller.start(source);
        let loader = self.loader.clone();
        Task::perform(
            async move { loader.load(&source).await },
            move |result| Message::CatalogLoaded(generation, result),
        )
    }

    fn fetch_clip(&self, request: StartRequest) -> Task<Message> {
        let media = self.media.clone();
        Task::perform(
            async move {
                let result = media.fetch_clip(&request.source).await;
                (request, result)
            },
            |(request, result)| Message::ClipFetched(request, result),
        )
    }

    fn fetch_icon(&mut self) -> Task<Message> {
        let Some(path) = self.controller.view_mut().take_icon_request() else {
            return Task::none();
        };
        let media = self.media.clone();
        Task::perform(
            async move {
                let result = media.fetch(&path).await.map_err(|e| e.to_string());
                (path, result)
            },
            |(path, result)| Message::IconFetched(path, result),
        )
    }
}
