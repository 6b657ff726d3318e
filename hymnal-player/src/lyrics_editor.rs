//! Lyrics timestamp editor
//!
//! Holds raw `[mm:ss.cc]text` lines for one song and a current-line cursor
//! that follows playback, or stays where the user put it for
//! `MANUAL_MODE_TIMEOUT` after the last manual move. Supports an A/B repeat
//! region, per-line edit tracking with restore, and serialization back to
//! the stored lyrics format.

use hymnal_common::lyrics::{
    current_line_index, format_tag, parse_lyrics, split_timestamp, strip_timestamp, LyricLine,
    ZERO_TIMESTAMP,
};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::LyricsError;

/// Inactivity after which manual navigation hands the cursor back to playback
pub const MANUAL_MODE_TIMEOUT: Duration = Duration::from_secs(5);

/// A/B repeat state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepeatRegion {
    /// Start marked, waiting for the end marker
    Pending { start: f64 },
    /// Both markers set; activates when playback starts
    Armed { start: f64, end: f64 },
    /// Looping between `start` and `end`
    Active { start: f64, end: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cursor {
    Auto,
    Manual { since: Instant },
}

pub struct LyricsEditor {
    lines: Vec<String>,
    original: Vec<String>,
    modified: BTreeSet<usize>,
    current_line: usize,
    cursor: Cursor,
    repeat: Option<RepeatRegion>,
    position: f64,
    duration: f64,
}

impl LyricsEditor {
    /// Load raw lyrics text
    ///
    /// Blank lines and `---` separators are dropped and a `[00:00.00]` line
    /// is put first if missing. When no other line is timed, every line
    /// gets a `[00:00.00]` tag.
    pub fn new(raw: &str) -> Self {
        let mut lines: Vec<String> = raw
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter(|l| !l.trim().starts_with("---"))
            .map(str::to_string)
            .collect();

        if lines.first().map(|l| l.trim_end()) != Some(ZERO_TIMESTAMP) {
            lines.insert(0, ZERO_TIMESTAMP.to_string());
        }

        if !lines.iter().skip(1).any(|l| split_timestamp(l).0.is_some()) {
            for line in lines.iter_mut().skip(1) {
                *line = format!("{}{}", ZERO_TIMESTAMP, line);
            }
        }

        debug!("Lyrics editor loaded {} lines", lines.len());
        Self {
            original: lines.clone(),
            lines,
            modified: BTreeSet::new(),
            current_line: 0,
            cursor: Cursor::Auto,
            repeat: None,
            position: 0.0,
            duration: 0.0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Display text of a line, without its tag
    pub fn text(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|l| strip_timestamp(l).trim())
    }

    /// Start time of a line; untimed lines read as 0
    pub fn time(&self, index: usize) -> Option<f64> {
        self.lines
            .get(index)
            .map(|l| split_timestamp(l).0.unwrap_or(0.0))
    }

    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.cursor, Cursor::Manual { .. })
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn repeat(&self) -> Option<RepeatRegion> {
        self.repeat
    }

    pub fn is_modified(&self, index: usize) -> bool {
        self.modified.contains(&index)
    }

    pub fn modified_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.modified.iter().copied()
    }

    /// Lines as `{time, text}` in display order
    pub fn parsed(&self) -> Vec<LyricLine> {
        parse_lyrics(&self.to_text())
    }

    /// Newline-joined text in the stored format
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn set_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration >= 0.0 {
            self.duration = duration;
        }
    }

    fn check_line(&self, index: usize) -> Result<(), LyricsError> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(LyricsError::LineOutOfRange(index))
        }
    }

    fn mark(&mut self, index: usize) {
        if self.lines[index] != self.original[index] {
            self.modified.insert(index);
        } else {
            self.modified.remove(&index);
        }
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    fn line_at(&self, position: f64) -> Option<usize> {
        let times: Vec<f64> = (0..self.lines.len()).filter_map(|i| self.time(i)).collect();
        current_line_index(&times, position)
    }

    fn follow_playback(&mut self) {
        if self.is_manual() {
            return;
        }
        if let Some(line) = self.line_at(self.position) {
            self.current_line = line;
        }
    }

    /// Revert to automatic tracking once manual mode has been idle long enough
    pub fn tick(&mut self, now: Instant) {
        if let Cursor::Manual { since } = self.cursor {
            if now.saturating_duration_since(since) >= MANUAL_MODE_TIMEOUT {
                debug!("Lyrics cursor back to automatic");
                self.cursor = Cursor::Auto;
                self.follow_playback();
            }
        }
    }

    pub fn previous_line(&mut self, now: Instant) {
        self.cursor = Cursor::Manual { since: now };
        self.current_line = self.current_line.saturating_sub(1);
    }

    pub fn next_line(&mut self, now: Instant) {
        self.cursor = Cursor::Manual { since: now };
        if self.current_line + 1 < self.lines.len() {
            self.current_line += 1;
        }
    }

    pub fn select_line(&mut self, index: usize, now: Instant) -> Result<(), LyricsError> {
        self.check_line(index)?;
        self.cursor = Cursor::Manual { since: now };
        self.current_line = index;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Playback coupling
    // ------------------------------------------------------------------

    /// Record a playback position
    ///
    /// Returns a position to seek the element to when an active repeat
    /// region loops.
    pub fn on_time_update(&mut self, position: f64, now: Instant) -> Option<f64> {
        self.tick(now);
        self.position = position;

        if let Some(RepeatRegion::Active { start, end }) = self.repeat {
            if position >= end || position < start {
                self.position = start;
                self.follow_playback();
                return Some(start);
            }
        }

        self.follow_playback();
        None
    }

    /// Playback is starting; an armed repeat region becomes active
    ///
    /// Returns the position to seek to when a region activates.
    pub fn on_play(&mut self) -> Option<f64> {
        match self.repeat {
            Some(RepeatRegion::Armed { start, end }) => {
                self.repeat = Some(RepeatRegion::Active { start, end });
                self.position = start;
                self.follow_playback();
                Some(start)
            }
            _ => None,
        }
    }

    /// Move by `delta` seconds, clamped to `[0, duration]`; returns the new position
    pub fn seek_by(&mut self, delta: f64) -> f64 {
        let target = (self.position + delta).clamp(0.0, self.duration.max(0.0));
        self.position = target;
        self.follow_playback();
        target
    }

    /// Marker press: start, then end, then clear
    pub fn toggle_repeat(&mut self) -> Option<RepeatRegion> {
        self.repeat = match self.repeat {
            None => Some(RepeatRegion::Pending {
                start: self.position,
            }),
            Some(RepeatRegion::Pending { start }) => Some(RepeatRegion::Armed {
                start: start.min(self.position),
                end: start.max(self.position),
            }),
            Some(_) => None,
        };
        self.repeat
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Tag the current line with the playback position
    pub fn stamp_current_line(&mut self) {
        let index = self.current_line;
        let text = strip_timestamp(&self.lines[index]).trim().to_string();
        self.lines[index] = format!("{}{}", format_tag(self.position), text);
        self.mark(index);
    }

    /// Tag the current line, then move to the next one
    pub fn stamp_and_advance(&mut self) {
        self.stamp_current_line();
        if self.current_line + 1 < self.lines.len() {
            self.current_line += 1;
        }
    }

    /// Replace the text of a line, keeping its tag
    pub fn edit_text(&mut self, index: usize, text: &str) -> Result<(), LyricsError> {
        self.check_line(index)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(LyricsError::EmptyText);
        }
        let tag_len = self.lines[index].len() - strip_timestamp(&self.lines[index]).len();
        let tag = self.lines[index][..tag_len].to_string();
        self.lines[index] = format!("{}{}", tag, text);
        self.mark(index);
        Ok(())
    }

    /// Replace the tag of a line; `tag` must be a full `[MM:SS.CC]`
    pub fn edit_timestamp(&mut self, index: usize, tag: &str) -> Result<(), LyricsError> {
        self.check_line(index)?;
        let tag = tag.trim();
        match split_timestamp(tag) {
            (Some(_), "") => {}
            _ => return Err(LyricsError::InvalidTimestamp(tag.to_string())),
        }
        let text = strip_timestamp(&self.lines[index]).trim().to_string();
        self.lines[index] = format!("{}{}", tag, text);
        self.mark(index);
        Ok(())
    }

    /// Put a line back exactly as loaded
    pub fn restore_line(&mut self, index: usize) -> Result<(), LyricsError> {
        self.check_line(index)?;
        self.lines[index] = self.original[index].clone();
        self.modified.remove(&index);
        Ok(())
    }

    /// Put back the loaded tag of a line, keeping its current text
    ///
    /// Lines loaded without a tag are left unchanged.
    pub fn restore_timestamp(&mut self, index: usize) -> Result<(), LyricsError> {
        self.check_line(index)?;
        let original = &self.original[index];
        let tag_len = original.len() - strip_timestamp(original).len();
        if tag_len == 0 {
            return Ok(());
        }
        let tag = original[..tag_len].to_string();
        let text = strip_timestamp(&self.lines[index]).trim().to_string();
        self.lines[index] = format!("{}{}", tag, text);
        self.modified.remove(&index);
        Ok(())
    }

    /// Set every tag to `[00:00.00]` and switch to manual navigation
    pub fn reset_all_timestamps(&mut self, now: Instant) {
        for index in 0..self.lines.len() {
            let text = strip_timestamp(&self.lines[index]).trim().to_string();
            self.lines[index] = format!("{}{}", ZERO_TIMESTAMP, text);
            self.mark(index);
        }
        self.cursor = Cursor::Manual { since: now };
    }
}
