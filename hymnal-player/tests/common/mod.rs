//! Shared helpers for hymnal-player integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use hymnal_common::models::{Chapter, Song, SongWithRelations};
use hymnal_player::events::{PlayerEvent, ToastMessage};
use hymnal_player::{AudioElement, PlayError, ReadyState};
use std::collections::VecDeque;
use tokio::sync::broadcast::Receiver;

/// Scriptable audio element
#[derive(Debug)]
pub struct FakeAudio {
    pub src: Option<String>,
    pub src_history: Vec<String>,
    pub loads: usize,
    pub play_calls: usize,
    pub paused: bool,
    pub time: f64,
    pub duration: Option<f64>,
    pub ready: ReadyState,
    /// Ready state reached by `load()`
    pub ready_after_load: ReadyState,
    pub volume: f64,
    /// Results returned by successive `play()` calls; `Ok` once exhausted
    pub play_results: VecDeque<Result<(), PlayError>>,
}

impl Default for FakeAudio {
    fn default() -> Self {
        Self {
            src: None,
            src_history: Vec::new(),
            loads: 0,
            play_calls: 0,
            paused: true,
            time: 0.0,
            duration: None,
            ready: ReadyState::HaveNothing,
            ready_after_load: ReadyState::HaveEnoughData,
            volume: 1.0,
            play_results: VecDeque::new(),
        }
    }
}

impl AudioElement for FakeAudio {
    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn set_src(&mut self, src: &str) {
        self.src = Some(src.to_string());
        self.src_history.push(src.to_string());
        self.time = 0.0;
        self.ready = ReadyState::HaveNothing;
    }

    fn load(&mut self) {
        self.loads += 1;
        self.ready = self.ready_after_load;
    }

    fn play(&mut self) -> Result<(), PlayError> {
        self.play_calls += 1;
        let result = self.play_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.paused = false;
        }
        result
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }
}

/// Song `id` in chapter 1 with Drive file `file{id}`
pub fn song(id: i64, title: &str, file_name: &str) -> SongWithRelations {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    SongWithRelations {
        song: Song {
            id,
            title: title.to_string(),
            file_name: Some(file_name.to_string()),
            artist: None,
            drive_file_id: Some(format!("file{}", id)),
            file_url: None,
            duration: None,
            image_id: None,
            image_url: None,
            lyrics: None,
            chapter_id: 1,
            genre_id: Some("ccm".to_string()),
            is_new: false,
            created_at: at,
            updated_at: at,
        },
        chapter: Some(Chapter {
            id: 1,
            name: "계시록 1장".to_string(),
        }),
        genre: None,
        popular_song: None,
    }
}

/// Songs 1..=n with file names `1-1`, `1-2`, ...
pub fn songs(n: i64) -> Vec<SongWithRelations> {
    (1..=n)
        .map(|i| song(i, &format!("song {}", i), &format!("1-{}", i)))
        .collect()
}

/// Drain pending toasts
pub fn toasts(rx: &mut Receiver<PlayerEvent>) -> Vec<ToastMessage> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PlayerEvent::Toast(message) = event {
            out.push(message);
        }
    }
    out
}
