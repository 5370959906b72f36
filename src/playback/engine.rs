use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

/// Encoded audio bytes for one clip, cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Clip(Arc<Vec<u8>>);

impl Clip {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        Arc::unwrap_or_clone(self.0)
    }
}

impl From<Vec<u8>> for Clip {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::new(bytes))
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Clip").field(&format_args!("{} bytes", self.len())).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The platform refused to start audio output.
    #[error("playback was blocked: {0}")]
    Blocked(String),
    /// The audio resource is missing, unreadable or not decodable.
    #[error("audio not available: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    #[error("audio output unavailable: {0}")]
    Blocked(String),
    #[error("could not decode audio: {0}")]
    Undecodable(String),
}

impl From<OutputError> for PlaybackError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Blocked(reason) => Self::Blocked(reason),
            OutputError::Undecodable(reason) => Self::NotFound(reason),
        }
    }
}

/// The audio device seam. Implementations play one clip at a time from its
/// beginning; `play` replaces whatever was playing.
#[cfg_attr(test, mockall::automock)]
pub trait AudioOutput {
    fn play(&mut self, clip: Clip) -> Result<(), OutputError>;
    fn stop(&mut self);
    /// True once the current clip has played to its end (or nothing is queued).
    fn is_drained(&self) -> bool;
    fn position(&self) -> Duration;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Empty,
    Primed,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Stopped,
    Ended,
    Failed(PlaybackError),
}

/// A playback start that has to fetch its clip before it can be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub ticket: u64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// Fetch `source` and hand the result to [`PlaybackEngine::complete_start`].
    Start(StartRequest),
    Stopped,
    Rejected(PlaybackError),
}

#[derive(Debug)]
struct Session {
    source: String,
    playing: bool,
    pending: Option<u64>,
}

/// Owns the single playback session and the output it drives.
///
/// Starting playback is split in two: [`toggle`](Self::toggle) issues a
/// ticketed [`StartRequest`], and [`complete_start`](Self::complete_start)
/// applies the fetched clip only if that ticket is still current. Any
/// `prime`, `stop` or `clear` in between invalidates the ticket, so a late
/// clip never plays over a newer selection.
#[derive(Debug)]
pub struct PlaybackEngine<O> {
    output: O,
    session: Option<Session>,
    next_ticket: u64,
}

impl<O: AudioOutput> PlaybackEngine<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            session: None,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.session {
            None => EngineState::Empty,
            Some(session) if session.playing => EngineState::Playing,
            Some(_) => EngineState::Primed,
        }
    }

    /// The bound audio source, if any.
    pub fn source(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.source.as_str())
    }

    pub fn is_starting(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.pending.is_some())
    }

    /// Playback position; zero unless playing.
    pub fn position(&self) -> Duration {
        if self.state() == EngineState::Playing {
            self.output.position()
        } else {
            Duration::ZERO
        }
    }

    /// Bind a new source, releasing the previous session first.
    pub fn prime(&mut self, source: impl Into<String>) {
        self.release();
        let source = source.into();
        debug!(%source, "primed playback");
        self.session = Some(Session {
            source,
            playing: false,
            pending: None,
        });
    }

    /// Unbind the source entirely.
    pub fn clear(&mut self) {
        self.release();
    }

    /// Stop playback (or abandon a pending start) and rewind.
    /// Returns whether anything was stopped.
    pub fn stop(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let was_active = session.playing || session.pending.is_some();
        if session.playing {
            self.output.stop();
        }
        session.playing = false;
        session.pending = None;
        was_active
    }

    pub fn toggle(&mut self) -> Toggle {
        let Some(session) = self.session.as_mut() else {
            return Toggle::Rejected(PlaybackError::NotFound(
                "no audio source is bound".to_owned(),
            ));
        };

        if session.playing {
            self.output.stop();
            session.playing = false;
            return Toggle::Stopped;
        }
        if session.pending.take().is_some() {
            debug!(source = %session.source, "abandoned pending playback start");
            return Toggle::Stopped;
        }

        self.next_ticket += 1;
        session.pending = Some(self.next_ticket);
        Toggle::Start(StartRequest {
            ticket: self.next_ticket,
            source: session.source.clone(),
        })
    }

    /// Apply the outcome of a start request. Returns `None` when the ticket
    /// is stale and the clip was discarded unplayed.
    pub fn complete_start(
        &mut self,
        ticket: u64,
        clip: Result<Clip, PlaybackError>,
    ) -> Option<PlaybackEvent> {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.pending == Some(ticket))
        else {
            debug!(ticket, "discarded stale playback start");
            return None;
        };
        session.pending = None;

        let outcome = match clip {
            Ok(clip) => self.output.play(clip).map_err(PlaybackError::from),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => {
                session.playing = true;
                Some(PlaybackEvent::Started)
            }
            Err(err) => {
                warn!(source = %session.source, error = %err, "playback did not start");
                Some(PlaybackEvent::Failed(err))
            }
        }
    }

    /// Detect the natural end of the clip.
    pub fn poll(&mut self) -> Option<PlaybackEvent> {
        let session = self.session.as_mut().filter(|s| s.playing)?;
        if !self.output.is_drained() {
            return None;
        }
        self.output.stop();
        session.playing = false;
        debug!(source = %session.source, "clip ended");
        Some(PlaybackEvent::Ended)
    }

    fn release(&mut self) {
        if let Some(session) = self.session.take()
            && session.playing
        {
            self.output.stop();
        }
    }
}
