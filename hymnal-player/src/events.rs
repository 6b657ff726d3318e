//! Player notifications
//!
//! The UI layer subscribes to an `EventBus` and renders toasts and state
//! changes. Emission never blocks and never fails: with no subscriber the
//! event is dropped.

use std::fmt;
use tokio::sync::broadcast;

use crate::controller::{PlayMode, PlaybackPhase};

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// User-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastMessage {
    NoNextSong,
    NoPreviousSong,
    /// Playback failed and a following song was selected
    UnplayableSkipping,
    /// Playback failed with nothing left to skip to
    Unplayable,
    AutoplayBlocked,
    ShuffleOn,
    ShuffleOff,
    RepeatNone,
    RepeatOne,
    RepeatAll,
    AddedToPlaylist,
    AlreadyInPlaylist,
    RemovedFromPlaylist,
    PlaylistShuffled,
    PlaylistSorted,
}

impl ToastMessage {
    pub fn kind(&self) -> ToastKind {
        match self {
            ToastMessage::NoNextSong
            | ToastMessage::NoPreviousSong
            | ToastMessage::UnplayableSkipping
            | ToastMessage::Unplayable
            | ToastMessage::AutoplayBlocked => ToastKind::Error,
            ToastMessage::ShuffleOn
            | ToastMessage::ShuffleOff
            | ToastMessage::RepeatNone
            | ToastMessage::RepeatOne
            | ToastMessage::RepeatAll => ToastKind::Success,
            _ => ToastKind::Info,
        }
    }

    /// Localized text
    pub fn text(&self) -> &'static str {
        match self {
            ToastMessage::NoNextSong => "다음 곡이 없습니다.",
            ToastMessage::NoPreviousSong => "이전 곡이 없습니다.",
            ToastMessage::UnplayableSkipping => "재생할 수 없는 곡입니다. 다음 곡으로 넘어갑니다.",
            ToastMessage::Unplayable => "재생할 수 없는 곡입니다.",
            ToastMessage::AutoplayBlocked => {
                "브라우저 정책으로 인해 자동 재생이 차단되었습니다. 재생 버튼을 클릭해주세요."
            }
            ToastMessage::ShuffleOn => "셔플 모드 켜짐",
            ToastMessage::ShuffleOff => "셔플 모드 꺼짐",
            ToastMessage::RepeatNone => "반복 없음",
            ToastMessage::RepeatOne => "한 곡 반복",
            ToastMessage::RepeatAll => "전체 반복",
            ToastMessage::AddedToPlaylist => "재생목록에 추가되었습니다",
            ToastMessage::AlreadyInPlaylist => "이미 재생목록에 있는 곡입니다",
            ToastMessage::RemovedFromPlaylist => "선택한 곡이 재생목록에서 제거되었습니다",
            ToastMessage::PlaylistShuffled => "재생목록이 셔플되었습니다",
            ToastMessage::PlaylistSorted => "재생목록이 원래 순서로 정렬되었습니다",
        }
    }
}

impl fmt::Display for ToastMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Events emitted by the player core
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Toast(ToastMessage),
    SongChanged { song_id: i64 },
    PhaseChanged { old: PlaybackPhase, new: PlaybackPhase },
    PlayModeChanged(PlayMode),
    ShuffleChanged(bool),
    PlaylistChanged { len: usize },
}

/// Broadcast channel for player events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the case where nobody is listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn toast(&self, message: ToastMessage) {
        self.emit_lossy(PlayerEvent::Toast(message));
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
