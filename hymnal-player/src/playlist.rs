//! Playlist manager
//!
//! An ordered list of songs without duplicates. Every mutation writes the
//! whole list to the local store under `playlist`; there is a single writer
//! and no merge with other sessions.

use hymnal_common::models::SongWithRelations;
use hymnal_common::naming::compare_file_names;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::PlaylistError;
use crate::events::{EventBus, PlayerEvent, ToastMessage};
use crate::storage::{LocalStore, PLAYLIST_KEY};

/// Where `add` inserts a song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPosition {
    /// Right after the current song; at the end when nothing is current
    AfterCurrent,
    AtEnd,
}

pub struct PlaylistManager {
    songs: Vec<SongWithRelations>,
    store: LocalStore,
    events: EventBus,
}

impl PlaylistManager {
    /// Restore the playlist saved in `store` (empty if absent or malformed)
    pub fn load(store: LocalStore, events: EventBus) -> Self {
        let songs: Vec<SongWithRelations> = store.get_json(PLAYLIST_KEY).unwrap_or_default();
        debug!("Restored playlist with {} songs", songs.len());
        Self {
            songs,
            store,
            events,
        }
    }

    pub fn songs(&self) -> &[SongWithRelations] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SongWithRelations> {
        self.songs.get(index)
    }

    pub fn position(&self, song_id: i64) -> Option<usize> {
        self.songs.iter().position(|s| s.song.id == song_id)
    }

    pub fn contains(&self, song_id: i64) -> bool {
        self.position(song_id).is_some()
    }

    /// Insert a song, returning its index
    ///
    /// `current` is the id of the song now playing, used by
    /// `AddPosition::AfterCurrent`.
    pub fn add(
        &mut self,
        song: SongWithRelations,
        position: AddPosition,
        current: Option<i64>,
    ) -> Result<usize, PlaylistError> {
        if self.contains(song.song.id) {
            self.events.toast(ToastMessage::AlreadyInPlaylist);
            return Err(PlaylistError::Duplicate(song.song.id));
        }

        let index = match (position, current.and_then(|id| self.position(id))) {
            (AddPosition::AfterCurrent, Some(current_index)) => current_index + 1,
            _ => self.songs.len(),
        };
        self.songs.insert(index, song);
        self.events.toast(ToastMessage::AddedToPlaylist);
        self.save();
        Ok(index)
    }

    /// Remove every song whose id is in `song_ids`; returns how many were removed
    pub fn remove(&mut self, song_ids: &[i64]) -> usize {
        let before = self.songs.len();
        self.songs.retain(|s| !song_ids.contains(&s.song.id));
        let removed = before - self.songs.len();
        if removed > 0 {
            self.events.toast(ToastMessage::RemovedFromPlaylist);
            self.save();
        }
        removed
    }

    /// Move the song at `from` to `to` (remove, then insert)
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), PlaylistError> {
        let len = self.songs.len();
        for index in [from, to] {
            if index >= len {
                return Err(PlaylistError::OutOfRange { index, len });
            }
        }
        let song = self.songs.remove(from);
        self.songs.insert(to, song);
        self.save();
        Ok(())
    }

    /// Replace the whole playlist, ordered by `chapter-number` file name
    pub fn replace_sorted(&mut self, mut songs: Vec<SongWithRelations>) {
        songs.sort_by(|a, b| {
            compare_file_names(a.song.file_name.as_deref(), b.song.file_name.as_deref())
        });
        let mut seen = HashSet::new();
        songs.retain(|s| seen.insert(s.song.id));
        self.songs = songs;
        self.save();
    }

    /// Randomize the order
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.songs.shuffle(rng);
        self.events.toast(ToastMessage::PlaylistShuffled);
        self.save();
    }

    /// Restore title order
    pub fn sort_by_title(&mut self) {
        self.songs.sort_by(|a, b| a.song.title.cmp(&b.song.title));
        self.events.toast(ToastMessage::PlaylistSorted);
        self.save();
    }

    pub fn clear(&mut self) {
        self.songs.clear();
        self.store.remove(PLAYLIST_KEY);
        self.events.emit_lossy(PlayerEvent::PlaylistChanged { len: 0 });
    }

    fn save(&self) {
        if let Err(e) = self.store.set_json(PLAYLIST_KEY, &self.songs) {
            warn!("Failed to encode playlist: {}", e);
        }
        self.events.emit_lossy(PlayerEvent::PlaylistChanged {
            len: self.songs.len(),
        });
    }
}
