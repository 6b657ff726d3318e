//! # Hymnal Player Core
//!
//! Headless state for the browser player:
//! - `controller`: playback phase machine driving a single audio element
//! - `playlist`: ordered, locally persisted playlist
//! - `lyrics_editor`: `[mm:ss.cc]` timestamp editing against playback time
//! - `proxy`: Drive file ID to same-origin streaming URL
//! - `catalog`: REST client for songs, genres and popular songs
//! - `storage`: local-storage analog and user preferences
//! - `events`: toast and state-change notifications
//!
//! All state is owned and mutated through `&mut self`; timers are deadlines
//! checked by `tick(now)`.

pub mod audio;
pub mod catalog;
pub mod controller;
pub mod error;
pub mod events;
pub mod lyrics_editor;
pub mod playlist;
pub mod proxy;
pub mod storage;

pub use audio::{AudioElement, PlayError, ReadyState};
pub use controller::{PlayMode, PlaybackController, PlaybackPhase};
pub use error::{LyricsError, PlayerError, PlaylistError, Result};
pub use events::{EventBus, PlayerEvent, ToastMessage};
pub use lyrics_editor::LyricsEditor;
pub use playlist::{AddPosition, PlaylistManager};
pub use proxy::ProxyUrlResolver;
pub use storage::{LocalStore, UserPreferences};
