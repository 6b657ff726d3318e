//! Playback state controller
//!
//! Owns the audio element, the playlist and the playback state. Element
//! events (`on_time_update`, `on_loaded_metadata`, `on_ended`, `on_error`)
//! and user actions are fed in by the UI layer; the delayed skip retry is a
//! deadline resolved by `tick(now)`.
//!
//! Phase transitions:
//!
//! ```text
//! Idle ─select─▶ Loading ─metadata─▶ Ready ─play─▶ Playing ⇄ Paused
//!                                                     │
//!                                                   ended ─▶ Ended
//! ```

use hymnal_common::models::SongWithRelations;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::audio::{AudioElement, PlayError, ReadyState};
use crate::error::PlaylistError;
use crate::events::{EventBus, PlayerEvent, ToastMessage};
use crate::playlist::{AddPosition, PlaylistManager};
use crate::proxy::ProxyUrlResolver;
use crate::storage::{LocalStore, UserPreferences, DEFAULT_VOLUME_KEY, LAST_POSITION_KEY};

/// Delay before playing the song selected after a playback error
pub const SKIP_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Repeat behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Stop after the last song
    #[default]
    None,
    /// Loop the current song
    One,
    /// Loop the playlist
    All,
}

impl PlayMode {
    /// Next mode in the `none → all → one → none` cycle
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::None => PlayMode::All,
            PlayMode::All => PlayMode::One,
            PlayMode::One => PlayMode::None,
        }
    }

    fn toast(self) -> ToastMessage {
        match self {
            PlayMode::None => ToastMessage::RepeatNone,
            PlayMode::One => ToastMessage::RepeatOne,
            PlayMode::All => ToastMessage::RepeatAll,
        }
    }
}

/// Playback lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No song selected
    Idle,
    /// Source assigned, metadata not yet loaded
    Loading,
    Ready,
    Playing,
    Paused,
    /// Reached the end of the playlist with no repeat
    Ended,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Loading => "loading",
            PlaybackPhase::Ready => "ready",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Paused => "paused",
            PlaybackPhase::Ended => "ended",
        };
        f.write_str(name)
    }
}

pub struct PlaybackController<A: AudioElement> {
    audio: A,
    playlist: PlaylistManager,
    store: LocalStore,
    events: EventBus,
    resolver: ProxyUrlResolver,
    rng: StdRng,

    current: Option<SongWithRelations>,
    phase: PlaybackPhase,
    play_mode: PlayMode,
    shuffle: bool,
    current_time: f64,
    duration: Option<f64>,
    /// Position recorded on pause, restored on resume
    last_position: f64,
    volume: f64,
    /// Deadline of the play attempt scheduled after a skip
    pending_play: Option<Instant>,
}

impl<A: AudioElement> PlaybackController<A> {
    /// Create a controller, restoring playlist, last position and volume from `store`
    pub fn new(mut audio: A, store: LocalStore, events: EventBus) -> Self {
        let playlist = PlaylistManager::load(store.clone(), events.clone());
        let last_position = store
            .get_parsed::<f64>(LAST_POSITION_KEY)
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(0.0);
        let volume = UserPreferences::load(&store).default_volume;
        audio.set_volume(volume);

        Self {
            audio,
            playlist,
            store,
            events,
            resolver: ProxyUrlResolver::new(),
            rng: StdRng::from_entropy(),
            current: None,
            phase: PlaybackPhase::Idle,
            play_mode: PlayMode::None,
            shuffle: false,
            current_time: 0.0,
            duration: None,
            last_position,
            volume,
            pending_play: None,
        }
    }

    pub fn with_resolver(mut self, resolver: ProxyUrlResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Seed the shuffle generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn current_song(&self) -> Option<&SongWithRelations> {
        self.current.as_ref()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn last_position(&self) -> f64 {
        self.last_position
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn has_pending_play(&self) -> bool {
        self.pending_play.is_some()
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn playlist(&self) -> &PlaylistManager {
        &self.playlist
    }

    pub fn playlist_mut(&mut self) -> &mut PlaylistManager {
        &mut self.playlist
    }

    fn current_index(&self) -> Option<usize> {
        let id = self.current.as_ref()?.song.id;
        self.playlist.position(id)
    }

    fn set_phase(&mut self, new: PlaybackPhase) {
        let old = self.phase;
        if old != new {
            debug!("Playback phase {} -> {}", old, new);
            self.phase = new;
            self.events.emit_lossy(PlayerEvent::PhaseChanged { old, new });
        }
    }

    fn set_last_position(&mut self, position: f64) {
        self.last_position = position;
        if position > 0.0 {
            self.store.set(LAST_POSITION_KEY, position.to_string());
        } else {
            self.store.remove(LAST_POSITION_KEY);
        }
    }

    // ------------------------------------------------------------------
    // Song selection
    // ------------------------------------------------------------------

    /// Make `song` current, assign its source and optionally start it
    fn load_song(&mut self, song: SongWithRelations, autoplay: bool, now: Instant) {
        let changed = self.current.as_ref().map(|s| s.song.id) != Some(song.song.id);
        let song_id = song.song.id;
        let url = self.resolver.audio_url(&song.song);
        self.current = Some(song);
        self.pending_play = None;
        self.current_time = 0.0;
        self.duration = None;
        if changed {
            self.set_last_position(0.0);
            self.events.emit_lossy(PlayerEvent::SongChanged { song_id });
        }

        match url {
            Ok(url) => {
                debug!("Loading song {} from {}", song_id, url);
                self.audio.set_src(&url);
                self.audio.load();
                self.set_phase(PlaybackPhase::Loading);
                if autoplay {
                    self.attempt_play(now);
                }
            }
            Err(e) => {
                error!("Song {} cannot be streamed: {}", song_id, e);
                self.set_phase(PlaybackPhase::Idle);
            }
        }
    }

    /// Select a song from the catalog and play it, adding it to the playlist if needed
    pub fn play_song(&mut self, song: SongWithRelations, now: Instant) {
        if !self.playlist.contains(song.song.id) {
            // Already-present songs are skipped by the check above
            let _ = self.playlist.add(song.clone(), AddPosition::AtEnd, None);
        }
        self.load_song(song, true, now);
    }

    /// Add a song to the playlist; starts it when nothing is current
    pub fn add_to_playlist(
        &mut self,
        song: SongWithRelations,
        position: AddPosition,
        now: Instant,
    ) -> Result<usize, PlaylistError> {
        let current_id = self.current.as_ref().map(|s| s.song.id);
        let index = self.playlist.add(song.clone(), position, current_id)?;
        if self.current.is_none() {
            self.load_song(song, true, now);
        }
        Ok(index)
    }

    /// Replace the playlist with `songs` in file-name order and play the first
    pub fn play_all(&mut self, songs: Vec<SongWithRelations>, now: Instant) {
        self.playlist.replace_sorted(songs);
        match self.playlist.get(0).cloned() {
            Some(first) => {
                info!("Playing all: {} songs", self.playlist.len());
                self.load_song(first, true, now);
            }
            None => debug!("Play all requested with no songs"),
        }
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Toggle between playing and paused
    pub fn toggle_play(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause();
        } else {
            self.resume(now);
        }
    }

    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        let position = self.audio.current_time();
        self.audio.pause();
        self.current_time = position;
        self.set_last_position(position);
        debug!("Paused at {:.2}s", position);
        self.set_phase(PlaybackPhase::Paused);
    }

    fn resume(&mut self, now: Instant) {
        let Some(song) = self.current.as_ref() else {
            return;
        };

        if self.audio.src().is_none() {
            match self.resolver.audio_url(&song.song) {
                Ok(url) => {
                    self.audio.set_src(&url);
                    self.audio.load();
                }
                Err(e) => {
                    error!("Song {} cannot be streamed: {}", song.song.id, e);
                    return;
                }
            }
        }

        let duration = self.audio.duration().or(self.duration);
        if let Some(duration) = duration {
            if self.last_position > 0.0 && self.last_position < duration {
                debug!("Restoring position {:.2}s", self.last_position);
                self.audio.set_current_time(self.last_position);
                self.current_time = self.last_position;
            }
        }

        self.attempt_play(now);
    }

    /// Call `play()` on the element and route the outcome
    fn attempt_play(&mut self, now: Instant) {
        match self.audio.play() {
            Ok(()) => self.set_phase(PlaybackPhase::Playing),
            Err(PlayError::NotAllowed) => {
                warn!("Autoplay blocked by browser policy");
                self.events.toast(ToastMessage::AutoplayBlocked);
                self.set_phase(PlaybackPhase::Paused);
            }
            Err(PlayError::Aborted) => debug!("Play request aborted by a newer load"),
            Err(PlayError::Media(detail)) => self.on_error(&detail, now),
        }
    }

    pub fn next(&mut self, now: Instant) {
        self.step(true, now);
    }

    pub fn previous(&mut self, now: Instant) {
        self.step(false, now);
    }

    fn step(&mut self, forward: bool, now: Instant) {
        if self.current.is_none() || self.playlist.is_empty() {
            return;
        }
        let Some(index) = self.current_index() else {
            debug!("Current song is not in the playlist");
            return;
        };
        let len = self.playlist.len();

        let target = if self.shuffle {
            // May pick the current song again
            self.rng.gen_range(0..len)
        } else if forward {
            match (index + 1 < len, self.play_mode) {
                (true, _) => index + 1,
                (false, PlayMode::All) => 0,
                (false, _) => {
                    self.events.toast(ToastMessage::NoNextSong);
                    return;
                }
            }
        } else {
            match (index > 0, self.play_mode) {
                (true, _) => index - 1,
                (false, PlayMode::All) => len - 1,
                (false, _) => {
                    self.events.toast(ToastMessage::NoPreviousSong);
                    return;
                }
            }
        };

        if let Some(song) = self.playlist.get(target).cloned() {
            let autoplay = self.is_playing();
            self.load_song(song, autoplay, now);
        }
    }

    /// Seek to an absolute position, clamped to `[0, duration]`
    ///
    /// Ignored until the duration is known.
    pub fn seek(&mut self, seconds: f64) {
        let Some(duration) = self.audio.duration().or(self.duration) else {
            debug!("Seek ignored: duration unknown");
            return;
        };
        let target = if seconds.is_finite() {
            seconds.clamp(0.0, duration)
        } else {
            0.0
        };
        self.audio.set_current_time(target);
        self.current_time = target;
    }

    pub fn seek_by(&mut self, delta: f64) {
        self.seek(self.audio.current_time() + delta);
    }

    /// Jump to the start, continuing playback if playing
    pub fn seek_to_start(&mut self, now: Instant) {
        if self.current.is_none() {
            return;
        }
        self.audio.set_current_time(0.0);
        self.current_time = 0.0;
        if self.is_playing() {
            self.attempt_play(now);
        }
    }

    pub fn cycle_play_mode(&mut self) -> PlayMode {
        self.play_mode = self.play_mode.cycle();
        info!("Play mode: {:?}", self.play_mode);
        self.events.toast(self.play_mode.toast());
        self.events
            .emit_lossy(PlayerEvent::PlayModeChanged(self.play_mode));
        self.play_mode
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.events.toast(if self.shuffle {
            ToastMessage::ShuffleOn
        } else {
            ToastMessage::ShuffleOff
        });
        self.events.emit_lossy(PlayerEvent::ShuffleChanged(self.shuffle));
        self.shuffle
    }

    /// Set the volume, clamped to `[0, 1]`, and remember it as the default
    pub fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.volume = volume;
        self.audio.set_volume(volume);
        self.store.set(DEFAULT_VOLUME_KEY, volume.to_string());
    }

    // ------------------------------------------------------------------
    // Element events
    // ------------------------------------------------------------------

    pub fn on_time_update(&mut self, seconds: f64) {
        self.current_time = seconds;
    }

    pub fn on_loaded_metadata(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.duration = Some(duration);
        }
        if self.phase == PlaybackPhase::Loading {
            self.set_phase(PlaybackPhase::Ready);
        }
    }

    /// The element finished the current song
    pub fn on_ended(&mut self, now: Instant) {
        let Some(song) = self.current.clone() else {
            return;
        };
        self.set_last_position(0.0);

        if self.play_mode == PlayMode::One {
            match self.resolver.audio_url(&song.song) {
                Ok(url) => {
                    self.audio.set_src(&url);
                    self.audio.load();
                    self.current_time = 0.0;
                    self.attempt_play(now);
                }
                Err(e) => error!("Song {} cannot be streamed: {}", song.song.id, e),
            }
            return;
        }

        let len = self.playlist.len();
        let next = match self.current_index() {
            Some(index) if index + 1 < len => Some(index + 1),
            Some(_) if self.play_mode == PlayMode::All => Some(0),
            _ => None,
        };

        match next.and_then(|i| self.playlist.get(i).cloned()) {
            Some(next_song) => self.load_song(next_song, true, now),
            None => {
                self.audio.pause();
                self.audio.set_current_time(0.0);
                self.current_time = 0.0;
                self.set_phase(PlaybackPhase::Ended);
            }
        }
    }

    /// The element reported a media error, or `play()` failed
    ///
    /// Stops playback and, when a following song exists, selects it and
    /// schedules a play attempt `SKIP_RETRY_DELAY` later.
    pub fn on_error(&mut self, detail: &str, now: Instant) {
        let song_id = self.current.as_ref().map(|s| s.song.id);
        error!(
            "Playback error for song {:?}: {} (src={:?}, readyState={:?}, position={:.2})",
            song_id,
            detail,
            self.audio.src(),
            self.audio.ready_state(),
            self.audio.current_time()
        );

        self.pending_play = None;
        if self.is_playing() {
            self.audio.pause();
        }
        self.set_phase(PlaybackPhase::Paused);

        let following = self
            .current_index()
            .filter(|i| i + 1 < self.playlist.len())
            .and_then(|i| self.playlist.get(i + 1).cloned());

        match following {
            Some(next_song) => {
                self.events.toast(ToastMessage::UnplayableSkipping);
                self.load_song(next_song, false, now);
                self.pending_play = Some(now + SKIP_RETRY_DELAY);
            }
            None => self.events.toast(ToastMessage::Unplayable),
        }
    }

    /// Resolve due timers
    ///
    /// A due skip retry plays only when the element has current data;
    /// otherwise it is dropped.
    pub fn tick(&mut self, now: Instant) {
        let Some(deadline) = self.pending_play else {
            return;
        };
        if now < deadline {
            return;
        }
        self.pending_play = None;

        if self.audio.ready_state() >= ReadyState::HaveCurrentData {
            self.attempt_play(now);
        } else {
            debug!(
                "Skip retry dropped: element not ready ({:?})",
                self.audio.ready_state()
            );
        }
    }
}
