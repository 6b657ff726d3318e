//! Audio element seam
//!
//! The controller drives exactly one element through this trait. In the
//! browser it wraps an `HTMLAudioElement`; tests use an in-memory double.

use thiserror::Error;

/// Media readiness, ordered like HTMLMediaElement.readyState
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

/// Rejection of a `play()` request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    /// Autoplay policy refused playback without a user gesture
    #[error("playback not allowed without user interaction")]
    NotAllowed,

    /// Superseded by a new source or a pause
    #[error("play request aborted")]
    Aborted,

    #[error("media error: {0}")]
    Media(String),
}

/// A single audio output
pub trait AudioElement {
    /// Current source URL, `None` when unset
    fn src(&self) -> Option<&str>;

    /// Replace the source; any in-flight load is abandoned
    fn set_src(&mut self, src: &str);

    fn load(&mut self);

    fn play(&mut self) -> Result<(), PlayError>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Media duration in seconds, `None` until metadata has loaded
    fn duration(&self) -> Option<f64>;

    fn ready_state(&self) -> ReadyState;

    /// Volume in `[0, 1]`
    fn set_volume(&mut self, volume: f64);
}
