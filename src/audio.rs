use std::io::Cursor;
use std::time::Duration;

use bytes::Bytes;
use log::warn;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::ClientError;
use crate::player::MediaElement;

/// Plays one decoded track on the default output device.
pub struct RodioElement {
    sink: Sink,
    duration: Option<Duration>,
    volume: f32,
    muted: bool,
    _stream: OutputStream,
}

impl RodioElement {
    /// Decodes `bytes` into a paused sink.
    pub fn open(bytes: Bytes) -> Result<Self, ClientError> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| ClientError::Audio(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| ClientError::Audio(e.to_string()))?;
        let source = Decoder::new(Cursor::new(bytes)).map_err(|e| ClientError::Audio(e.to_string()))?;
        let duration = source.total_duration();

        sink.pause();
        sink.append(source);

        Ok(Self {
            sink,
            duration,
            volume: 1.0,
            muted: false,
            _stream: stream,
        })
    }

    fn apply_volume(&self) {
        self.sink.set_volume(if self.muted { 0.0 } else { self.volume });
    }
}

impl MediaElement for RodioElement {
    fn play(&mut self) -> Result<(), ClientError> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn duration(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64())
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.sink.get_pos().as_secs_f64())
    }

    fn set_current_time(&mut self, seconds: f64) {
        if let Err(e) = self.sink.try_seek(Duration::from_secs_f64(seconds.max(0.0))) {
            warn!("Seek failed: {:?}", e);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.apply_volume();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_volume();
    }

    fn ended(&self) -> bool {
        self.sink.empty()
    }
}
