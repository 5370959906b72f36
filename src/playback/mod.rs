pub mod engine;
pub mod fetch;

pub use engine::{
    AudioOutput, Clip, EngineState, OutputError, PlaybackEngine, PlaybackError, PlaybackEvent,
    StartRequest, Toggle,
};
pub use fetch::{MediaError, MediaFetcher};
