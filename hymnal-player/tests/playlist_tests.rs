//! Playlist manager mutations and persistence

mod common;

use common::*;
use hymnal_common::models::SongWithRelations;
use hymnal_player::storage::PLAYLIST_KEY;
use hymnal_player::{AddPosition, EventBus, LocalStore, PlaylistError, PlaylistManager, ToastMessage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn ids(playlist: &PlaylistManager) -> Vec<i64> {
    playlist.songs().iter().map(|s| s.song.id).collect()
}

fn stored_ids(store: &LocalStore) -> Vec<i64> {
    store
        .get_json::<Vec<SongWithRelations>>(PLAYLIST_KEY)
        .unwrap_or_default()
        .iter()
        .map(|s| s.song.id)
        .collect()
}

fn filled(n: i64) -> (PlaylistManager, LocalStore, EventBus) {
    let store = LocalStore::in_memory();
    let events = EventBus::new(256);
    let mut playlist = PlaylistManager::load(store.clone(), events.clone());
    for s in songs(n) {
        playlist.add(s, AddPosition::AtEnd, None).unwrap();
    }
    (playlist, store, events)
}

#[test]
fn test_add_positions() {
    let (mut playlist, store, _) = filled(3);

    let index = playlist
        .add(song(10, "x", "5-1"), AddPosition::AfterCurrent, Some(1))
        .unwrap();
    assert_eq!(index, 1);

    // No current song: appended
    let index = playlist
        .add(song(11, "y", "5-2"), AddPosition::AfterCurrent, None)
        .unwrap();
    assert_eq!(index, 4);

    // Current song not in the list: appended
    playlist
        .add(song(12, "z", "5-3"), AddPosition::AfterCurrent, Some(99))
        .unwrap();

    assert_eq!(ids(&playlist), vec![1, 10, 2, 3, 11, 12]);
    assert_eq!(stored_ids(&store), ids(&playlist));
}

#[test]
fn test_duplicate_rejected_with_toast() {
    let (mut playlist, store, events) = filled(2);
    let mut rx = events.subscribe();

    let result = playlist.add(song(2, "again", "1-2"), AddPosition::AtEnd, None);

    assert_eq!(result, Err(PlaylistError::Duplicate(2)));
    assert_eq!(toasts(&mut rx), vec![ToastMessage::AlreadyInPlaylist]);
    assert_eq!(stored_ids(&store), vec![1, 2]);
}

#[test]
fn test_remove_multiple() {
    let (mut playlist, store, events) = filled(5);
    let mut rx = events.subscribe();

    assert_eq!(playlist.remove(&[2, 4, 42]), 2);
    assert_eq!(ids(&playlist), vec![1, 3, 5]);
    assert_eq!(stored_ids(&store), vec![1, 3, 5]);
    assert_eq!(toasts(&mut rx), vec![ToastMessage::RemovedFromPlaylist]);

    // Nothing matched: no toast, no write
    assert_eq!(playlist.remove(&[42]), 0);
    assert!(toasts(&mut rx).is_empty());
}

#[test]
fn test_reorder_is_remove_then_insert() {
    let (mut playlist, store, _) = filled(4);

    playlist.reorder(0, 2).unwrap();
    assert_eq!(ids(&playlist), vec![2, 3, 1, 4]);

    playlist.reorder(3, 0).unwrap();
    assert_eq!(ids(&playlist), vec![4, 2, 3, 1]);
    assert_eq!(stored_ids(&store), vec![4, 2, 3, 1]);

    assert_eq!(
        playlist.reorder(0, 4),
        Err(PlaylistError::OutOfRange { index: 4, len: 4 })
    );
}

#[test]
fn test_replace_sorted_orders_by_chapter_then_number() {
    let (mut playlist, _, _) = filled(2);

    playlist.replace_sorted(vec![
        song(1, "a", "3-1"),
        song(2, "b", "1-12"),
        song(3, "c", "1-2"),
        song(4, "d", "custom"),
        song(3, "c", "1-2"),
    ]);

    assert_eq!(ids(&playlist), vec![3, 2, 1, 4]);
}

#[test]
fn test_shuffle_then_sort_by_title() {
    let (mut playlist, store, events) = filled(6);
    let mut rx = events.subscribe();
    let mut rng = StdRng::seed_from_u64(3);

    playlist.shuffle(&mut rng);
    let mut shuffled = ids(&playlist);
    assert_eq!(stored_ids(&store), shuffled);
    shuffled.sort();
    assert_eq!(shuffled, vec![1, 2, 3, 4, 5, 6]);

    playlist.sort_by_title();
    assert_eq!(ids(&playlist), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(
        toasts(&mut rx),
        vec![ToastMessage::PlaylistShuffled, ToastMessage::PlaylistSorted]
    );
}

#[test]
fn test_clear_removes_stored_playlist() {
    let (mut playlist, store, _) = filled(2);
    playlist.clear();
    assert!(playlist.is_empty());
    assert!(store.get(PLAYLIST_KEY).is_none());
}

#[test]
fn test_persisted_playlist_survives_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("local-storage.json");

    {
        let store = LocalStore::open(&path).unwrap();
        let mut playlist = PlaylistManager::load(store, EventBus::default());
        for s in songs(3) {
            playlist.add(s, AddPosition::AtEnd, None).unwrap();
        }
        playlist.reorder(2, 0).unwrap();
    }

    let store = LocalStore::open(&path).unwrap();
    let playlist = PlaylistManager::load(store, EventBus::default());
    assert_eq!(ids(&playlist), vec![3, 1, 2]);
    assert_eq!(playlist.get(0).unwrap().song.title, "song 3");
}

#[test]
fn test_malformed_stored_playlist_loads_empty() {
    let store = LocalStore::in_memory();
    store.set(PLAYLIST_KEY, "{not a list");
    let playlist = PlaylistManager::load(store, EventBus::default());
    assert!(playlist.is_empty());
}
