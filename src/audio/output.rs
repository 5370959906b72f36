use std::io::Cursor;
use std::time::Duration;

use rodio::{Decoder, MixerDeviceSink, Player};
use tracing::info;

use crate::playback::{AudioOutput, Clip, OutputError};

/// The opened output device. The `MixerDeviceSink` (stream handle) must stay
/// alive for as long as the player is used; dropping it silences all audio.
struct Device {
    _stream: MixerDeviceSink,
    player: Player,
}

impl Device {
    fn open() -> Result<Self, OutputError> {
        let stream = rodio::DeviceSinkBuilder::open_default_sink()
            .map_err(|e| OutputError::Blocked(e.to_string()))?;
        let player = Player::connect_new(stream.mixer());
        info!("opened default audio output");
        Ok(Self {
            _stream: stream,
            player,
        })
    }
}

/// rodio-backed [`AudioOutput`].
///
/// The device is opened on the first `play`, so a machine without audio
/// output can still browse the catalog; playback then reports `Blocked`.
#[derive(Default)]
pub struct RodioOutput {
    device: Option<Device>,
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput")
            .field("open", &self.device.is_some())
            .finish_non_exhaustive()
    }
}

impl RodioOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self, clip: Clip) -> Result<(), OutputError> {
        let source = decode_clip(clip)?;
        if self.device.is_none() {
            self.device = Some(Device::open()?);
        }
        let Some(device) = &self.device else {
            return Err(OutputError::Blocked("audio device closed".to_owned()));
        };

        device.player.stop();
        device.player.append(source);
        device.player.play();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(device) = &self.device {
            device.player.stop();
        }
    }

    fn is_drained(&self) -> bool {
        self.device.as_ref().is_none_or(|d| d.player.empty())
    }

    fn position(&self) -> Duration {
        self.device
            .as_ref()
            .map_or(Duration::ZERO, |d| d.player.get_pos())
    }
}

/// Decode a clip up front so a corrupt file is reported before any output
/// state changes.
pub fn decode_clip(clip: Clip) -> Result<Decoder<Cursor<Vec<u8>>>, OutputError> {
    Decoder::try_from(Cursor::new(clip.into_bytes()))
        .map_err(|e| OutputError::Undecodable(e.to_string()))
}
