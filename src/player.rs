use entity::prelude::Song;
use log::{debug, warn};

use crate::error::ClientError;

/// The native playback primitive a widget drives. Times are in seconds.
pub trait MediaElement {
    fn play(&mut self) -> Result<(), ClientError>;

    fn pause(&mut self);

    /// `None` until the media has loaded enough to know its length.
    fn duration(&self) -> Option<f64>;

    fn current_time(&self) -> Option<f64>;

    fn set_current_time(&mut self, seconds: f64);

    fn set_volume(&mut self, volume: f32);

    fn set_muted(&mut self, muted: bool);

    /// Whether playback ran to the end of the media.
    fn ended(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    /// Terminal until another track is selected.
    Ended,
}

/// Formats seconds as `m:ss`. Unknown or unusable values show as `0:00`.
pub fn format_time(seconds: Option<f64>) -> String {
    let seconds = match seconds {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => return "0:00".to_string(),
    };
    let minutes = (seconds / 60.0).floor() as u64;
    let rest = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, rest)
}

/// Transport controls around one media element for one track.
pub struct PlaybackWidget<M: MediaElement> {
    song: Song,
    element: M,
    state: PlaybackState,
    progress: f64,
    volume: f32,
    muted: bool,
}

impl<M: MediaElement> PlaybackWidget<M> {
    pub fn new(song: Song, element: M) -> Self {
        Self {
            song,
            element,
            state: PlaybackState::Idle,
            progress: 0.0,
            volume: 1.0,
            muted: false,
        }
    }

    pub fn play(&mut self) -> Result<(), ClientError> {
        match self.state {
            PlaybackState::Idle | PlaybackState::Paused => {
                self.element.play()?;
                self.state = PlaybackState::Playing;
                debug!("Playing {}", self.song.title);
            }
            PlaybackState::Playing => {}
            PlaybackState::Ended => debug!("{} already ended", self.song.title),
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.element.pause();
            self.state = PlaybackState::Paused;
        }
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), ClientError> {
        if self.state == PlaybackState::Playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Jumps to `percent` of the track. Position updates that land afterwards overwrite the
    /// displayed progress; nothing orders the two.
    pub fn seek(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        match self.element.duration() {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                self.element.set_current_time(percent / 100.0 * duration);
                self.progress = percent;
            }
            _ => warn!("Ignoring seek before the duration of {} is known", self.song.title),
        }
    }

    /// Position callback from the media element.
    pub fn on_time_update(&mut self, current: f64, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.progress = (current * 100.0 / duration).clamp(0.0, 100.0);
        }
    }

    /// Natural completion callback from the media element.
    pub fn on_ended(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Ended;
            debug!("Finished {}", self.song.title);
        }
    }

    /// Pulls position and completion from the element, for elements that don't push callbacks.
    pub fn poll(&mut self) {
        if let (Some(current), Some(duration)) = (self.element.current_time(), self.element.duration()) {
            self.on_time_update(current, duration);
        }
        if self.element.ended() {
            self.on_ended();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        self.element.set_volume(volume);
        self.muted = volume == 0.0;
        self.element.set_muted(self.muted);
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.element.set_muted(self.muted);
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn elapsed_label(&self) -> String {
        format_time(self.element.current_time())
    }

    pub fn duration_label(&self) -> String {
        format_time(self.element.duration())
    }

    pub fn remaining_label(&self) -> String {
        let remaining = match (self.element.duration(), self.element.current_time()) {
            (Some(duration), Some(current)) => Some(duration - current),
            (Some(duration), None) => Some(duration),
            _ => None,
        };
        format!("-{}", format_time(remaining))
    }
}

/// The bottom bar that hosts at most one widget. Selecting a track tears the old widget down
/// before the new element is created.
pub struct PlayerDock<M: MediaElement> {
    widget: Option<PlaybackWidget<M>>,
}

impl<M: MediaElement> PlayerDock<M> {
    pub fn new() -> Self {
        Self { widget: None }
    }

    pub fn select<F>(&mut self, song: Song, open: F) -> Result<&mut PlaybackWidget<M>, ClientError>
    where
        F: FnOnce(&Song) -> Result<M, ClientError>,
    {
        self.widget = None;
        let element = open(&song)?;
        Ok(self.widget.insert(PlaybackWidget::new(song, element)))
    }

    pub fn close(&mut self) {
        self.widget = None;
    }

    pub fn widget(&mut self) -> Option<&mut PlaybackWidget<M>> {
        self.widget.as_mut()
    }
}

impl<M: MediaElement> Default for PlayerDock<M> {
    fn default() -> Self {
        Self::new()
    }
}
