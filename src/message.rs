use std::path::PathBuf;

use crate::catalog::{Catalog, ListEntry, LoadError};
use crate::playback::{Clip, PlaybackError, StartRequest};

#[derive(Debug, Clone)]
pub enum Message {
    /// A catalog load finished; carries the generation of its `start`.
    CatalogLoaded(u64, Result<Catalog, LoadError>),
    /// Reload from the current source.
    Reload,
    /// Ask the user for a local catalog file.
    OpenCatalog,
    CatalogPicked(Option<PathBuf>),

    SoundSelected(ListEntry),
    SearchChanged(String),

    PlayToggle,
    /// The clip for a start request was fetched (or not).
    ClipFetched(StartRequest, Result<Clip, PlaybackError>),
    /// Polls for the natural end of the clip while playing (every 250 ms).
    PlaybackTick,

    IconFetched(String, Result<Vec<u8>, String>),
}
