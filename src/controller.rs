//! The catalog playback controller.
//!
//! Owns the loaded catalog, the active selection and the playback engine,
//! and reports every change to an injected [`CatalogView`]. All methods run
//! to completion synchronously; the two operations that suspend (loading the
//! catalog and fetching a clip) are split into a begin call that returns a
//! ticket and a finish call that checks the ticket before applying anything.

use std::fmt;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, ListEntry, LoadError, Location, SelectionError, SoundRecord, index};
use crate::playback::{
    AudioOutput, Clip, EngineState, PlaybackEngine, PlaybackError, PlaybackEvent, StartRequest,
    Toggle,
};

/// The UI collaborator driven by the controller.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogView {
    /// Replace the listing with `entries`, in order.
    fn show_listing(&mut self, entries: &[ListEntry]);
    fn show_record(&mut self, record: &SoundRecord);
    fn clear_record(&mut self);
    fn show_status(&mut self, status: &Status);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Loading,
    Ready,
    Selected,
    Playing,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("{0}")]
    NotReady(&'static str),
}

/// Status line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading,
    Ready,
    NoAudio,
    Starting,
    Playing,
    Stopped,
    Error(ControllerError),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("Loading catalog…"),
            Self::Ready => f.write_str("Ready."),
            Self::NoAudio => f.write_str("This sound has no audio assigned."),
            Self::Starting => f.write_str("Loading audio…"),
            Self::Playing => f.write_str("Playing…"),
            Self::Stopped => f.write_str("Stopped."),
            Self::Error(ControllerError::Load(err)) => write!(f, "Error loading catalog: {err}"),
            Self::Error(ControllerError::Playback(PlaybackError::NotFound(reason))) => write!(
                f,
                "Could not play the audio ({reason}). Check that the file exists \
                 and that its name matches the catalog, including letter case."
            ),
            Self::Error(err) => write!(f, "Error: {err}"),
        }
    }
}

/// Identifies one `start` call; results for older tickets are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub source: Location,
}

#[derive(Debug)]
pub struct Controller<O, V> {
    state: ControllerState,
    source: Option<Location>,
    catalog: Option<Catalog>,
    selection: Option<String>,
    query: String,
    engine: PlaybackEngine<O>,
    view: V,
    generation: u64,
    select_first_on_load: bool,
}

impl<O: AudioOutput, V: CatalogView> Controller<O, V> {
    pub fn new(output: O, view: V) -> Self {
        Self {
            state: ControllerState::Uninitialized,
            source: None,
            catalog: None,
            selection: None,
            query: String::new(),
            engine: PlaybackEngine::new(output),
            view,
            generation: 0,
            select_first_on_load: false,
        }
    }

    /// Select (prime, never play) the first record after each successful load.
    #[must_use]
    pub fn with_select_first_on_load(mut self, enabled: bool) -> Self {
        self.select_first_on_load = enabled;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn source(&self) -> Option<&Location> {
        self.source.as_ref()
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// The selected record, re-resolved against the current catalog.
    pub fn selection(&self) -> Option<&SoundRecord> {
        let id = self.selection.as_deref()?;
        index::resolve(self.catalog.as_ref()?, id).ok()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn engine(&self) -> &PlaybackEngine<O> {
        &self.engine
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    // ─── Loading ────────────────────────────────────────────────

    /// Begin (re)loading from `source`. Any current playback session and
    /// selection are torn down first, whatever the current state.
    pub fn start(&mut self, source: Location) -> LoadTicket {
        if self.engine.stop() {
            debug!("stopped playback before reload");
        }
        self.engine.clear();
        self.catalog = None;
        self.selection = None;
        self.query.clear();
        self.generation += 1;
        self.state = ControllerState::Loading;
        self.source = Some(source.clone());

        self.view.clear_record();
        self.view.show_listing(&[]);
        self.view.show_status(&Status::Loading);
        info!(%source, generation = self.generation, "loading catalog");

        LoadTicket {
            generation: self.generation,
            source,
        }
    }

    pub fn finish_load(
        &mut self,
        generation: u64,
        result: Result<Catalog, LoadError>,
    ) -> Result<(), ControllerError> {
        if generation != self.generation || self.state != ControllerState::Loading {
            debug!(generation, current = self.generation, "ignored stale catalog load");
            return Ok(());
        }

        match result {
            Ok(catalog) => {
                self.view.show_listing(&catalog.entries());
                let first = catalog.first().map(|r| r.id.clone());
                self.catalog = Some(catalog);
                self.state = ControllerState::Ready;
                self.view.show_status(&Status::Ready);

                match first {
                    Some(id) if self.select_first_on_load => self.select(&id),
                    _ => Ok(()),
                }
            }
            Err(err) => {
                self.state = ControllerState::Error;
                self.view
                    .show_listing(&[ListEntry::placeholder("Catalog unavailable")]);
                Err(self.fail(err.into()))
            }
        }
    }

    // ─── Selection and search ───────────────────────────────────

    /// Make `id` the active record. An empty id clears the selection.
    pub fn select(&mut self, id: &str) -> Result<(), ControllerError> {
        let Some(catalog) = &self.catalog else {
            return Err(self.fail(ControllerError::NotReady("no catalog is loaded")));
        };
        let id = id.trim();
        let resolved = (!id.is_empty()).then(|| index::resolve(catalog, id).cloned());

        match resolved {
            None => {
                self.clear_selection();
                self.view.show_status(&Status::Ready);
                Ok(())
            }
            Some(Ok(record)) => {
                self.activate(&record);
                Ok(())
            }
            Some(Err(err)) => {
                self.clear_selection();
                Err(self.fail(err.into()))
            }
        }
    }

    /// Re-derive the visible listing. Selection and playback are untouched,
    /// even if the selected record is filtered out.
    /// Without a catalog the status line is left alone, so a load error
    /// stays visible while the user types.
    pub fn search(&mut self, query: &str) -> Result<Vec<ListEntry>, ControllerError> {
        let Some(catalog) = &self.catalog else {
            debug!(state = ?self.state, "search ignored, no catalog is loaded");
            return Err(ControllerError::NotReady("no catalog is loaded"));
        };
        let entries: Vec<ListEntry> = index::filter(catalog, query)
            .into_iter()
            .map(SoundRecord::list_entry)
            .collect();
        query.clone_into(&mut self.query);
        self.view.show_listing(&entries);
        Ok(entries)
    }

    // ─── Playback ───────────────────────────────────────────────

    /// Handle a play-button press. Returns the clip to fetch when playback
    /// has to start; stopping completes immediately.
    pub fn play_toggle(&mut self) -> Result<Option<StartRequest>, ControllerError> {
        if !matches!(
            self.state,
            ControllerState::Selected | ControllerState::Playing
        ) {
            return Err(self.fail(ControllerError::NotReady("no sound is selected")));
        }
        if self.engine.state() == EngineState::Empty {
            return Err(self.fail(
                PlaybackError::NotFound("this sound has no audio assigned".to_owned()).into(),
            ));
        }

        match self.engine.toggle() {
            Toggle::Start(request) => {
                debug!(source = %request.source, ticket = request.ticket, "requested playback");
                self.view.show_status(&Status::Starting);
                Ok(Some(request))
            }
            Toggle::Stopped => self.apply(PlaybackEvent::Stopped).map(|()| None),
            Toggle::Rejected(err) => self.apply(PlaybackEvent::Failed(err)).map(|()| None),
        }
    }

    /// Apply a fetched clip (or the fetch failure) for `ticket`.
    pub fn finish_play(
        &mut self,
        ticket: u64,
        clip: Result<Clip, PlaybackError>,
    ) -> Result<(), ControllerError> {
        match self.engine.complete_start(ticket, clip) {
            Some(event) => self.apply(event),
            None => Ok(()),
        }
    }

    /// Poll the engine for the natural end of the clip.
    pub fn tick(&mut self) -> Option<PlaybackEvent> {
        let event = self.engine.poll()?;
        if let Err(err) = self.apply(event.clone()) {
            debug!(error = %err, "playback poll reported a failure");
        }
        Some(event)
    }

    // ─── Internals ──────────────────────────────────────────────

    fn activate(&mut self, record: &SoundRecord) {
        match record.audio.as_deref() {
            Some(audio) => self.engine.prime(audio),
            None => self.engine.clear(),
        }
        self.selection = Some(record.id.clone());
        self.state = ControllerState::Selected;
        self.view.show_record(record);
        self.view.show_status(if record.has_audio() {
            &Status::Ready
        } else {
            &Status::NoAudio
        });
        info!(id = %record.id, "selected sound");
    }

    fn clear_selection(&mut self) {
        self.engine.clear();
        self.selection = None;
        if matches!(
            self.state,
            ControllerState::Selected | ControllerState::Playing
        ) {
            self.state = ControllerState::Ready;
        }
        self.view.clear_record();
    }

    fn apply(&mut self, event: PlaybackEvent) -> Result<(), ControllerError> {
        match event {
            PlaybackEvent::Started => {
                self.state = ControllerState::Playing;
                self.view.show_status(&Status::Playing);
                Ok(())
            }
            PlaybackEvent::Stopped | PlaybackEvent::Ended => {
                self.state = ControllerState::Selected;
                self.view.show_status(&Status::Stopped);
                Ok(())
            }
            PlaybackEvent::Failed(err) => {
                self.state = ControllerState::Selected;
                Err(self.fail(err.into()))
            }
        }
    }

    fn fail(&mut self, err: ControllerError) -> ControllerError {
        warn!(error = %err, state = ?self.state, "controller operation failed");
        self.view.show_status(&Status::Error(err.clone()));
        err
    }
}
