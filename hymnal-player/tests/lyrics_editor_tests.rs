//! Lyrics timestamp editor against simulated playback

use hymnal_common::lyrics::LyricLine;
use hymnal_player::lyrics_editor::{RepeatRegion, MANUAL_MODE_TIMEOUT};
use hymnal_player::{LyricsEditor, LyricsError};
use std::time::{Duration, Instant};

const SAMPLE: &str = "[00:00.00]\n[00:01.50]Hello\n[00:03.00]World\n[00:10.00]End";

#[test]
fn test_parsed_lines_match_stored_format() {
    let editor = LyricsEditor::new("[00:01.50]Hello\n[00:03.00]World");
    let parsed = editor.parsed();
    assert_eq!(
        &parsed[1..],
        &[
            LyricLine { time: 1.5, text: "Hello".to_string() },
            LyricLine { time: 3.0, text: "World".to_string() },
        ]
    );
    assert_eq!(parsed[0], LyricLine { time: 0.0, text: String::new() });
}

#[test]
fn test_cursor_follows_playback() {
    let mut editor = LyricsEditor::new(SAMPLE);
    let now = Instant::now();

    editor.on_time_update(0.5, now);
    assert_eq!(editor.current_line(), 0);
    editor.on_time_update(1.5, now);
    assert_eq!(editor.current_line(), 1);
    editor.on_time_update(2.99, now);
    assert_eq!(editor.current_line(), 1);
    editor.on_time_update(4.0, now);
    assert_eq!(editor.current_line(), 2);
    editor.on_time_update(60.0, now);
    assert_eq!(editor.current_line(), 3);
}

#[test]
fn test_manual_navigation_reverts_after_inactivity() {
    let mut editor = LyricsEditor::new(SAMPLE);
    let start = Instant::now();

    editor.next_line(start);
    editor.next_line(start);
    assert!(editor.is_manual());
    assert_eq!(editor.current_line(), 2);

    // Playback moves but the cursor stays put while manual
    editor.on_time_update(1.6, start + Duration::from_secs(1));
    assert_eq!(editor.current_line(), 2);

    // Each manual move restarts the timeout
    editor.previous_line(start + Duration::from_secs(4));
    assert_eq!(editor.current_line(), 1);
    editor.on_time_update(4.0, start + Duration::from_secs(8));
    assert!(editor.is_manual());
    assert_eq!(editor.current_line(), 1);

    editor.on_time_update(4.0, start + Duration::from_secs(4) + MANUAL_MODE_TIMEOUT);
    assert!(!editor.is_manual());
    assert_eq!(editor.current_line(), 2);
}

#[test]
fn test_navigation_stays_in_bounds() {
    let mut editor = LyricsEditor::new(SAMPLE);
    let now = Instant::now();
    editor.previous_line(now);
    assert_eq!(editor.current_line(), 0);
    for _ in 0..10 {
        editor.next_line(now);
    }
    assert_eq!(editor.current_line(), 3);
    assert_eq!(editor.select_line(7, now), Err(LyricsError::LineOutOfRange(7)));
}

#[test]
fn test_repeat_region_lifecycle() {
    let mut editor = LyricsEditor::new(SAMPLE);
    editor.set_duration(30.0);
    let now = Instant::now();

    editor.on_time_update(8.0, now);
    assert_eq!(editor.toggle_repeat(), Some(RepeatRegion::Pending { start: 8.0 }));

    // End marked before start: ordered automatically
    editor.on_time_update(2.0, now);
    assert_eq!(
        editor.toggle_repeat(),
        Some(RepeatRegion::Armed { start: 2.0, end: 8.0 })
    );

    // Not looping until playback starts
    assert_eq!(editor.on_time_update(9.0, now), None);

    assert_eq!(editor.on_play(), Some(2.0));
    assert_eq!(editor.repeat(), Some(RepeatRegion::Active { start: 2.0, end: 8.0 }));
    assert_eq!(editor.on_time_update(5.0, now), None);
    assert_eq!(editor.on_time_update(8.0, now), Some(2.0));
    assert_eq!(editor.position(), 2.0);
    assert_eq!(editor.on_time_update(1.0, now), Some(2.0));

    // Already active: play does not seek again
    assert_eq!(editor.on_play(), None);

    assert_eq!(editor.toggle_repeat(), None);
    assert_eq!(editor.on_time_update(9.0, now), None);
}

#[test]
fn test_stamp_and_advance() {
    let mut editor = LyricsEditor::new("first\nsecond\nthird");
    let now = Instant::now();
    editor.select_line(1, now).unwrap();

    editor.on_time_update(12.345, now);
    editor.stamp_and_advance();
    editor.on_time_update(65.0, now);
    editor.stamp_and_advance();

    assert_eq!(editor.lines()[1], "[00:12.34]first");
    assert_eq!(editor.lines()[2], "[01:05.00]second");
    assert_eq!(editor.current_line(), 3);
    assert!(editor.is_modified(1));
    assert!(editor.is_modified(2));
    assert!(!editor.is_modified(3));
}

#[test]
fn test_edit_text_and_timestamp() {
    let mut editor = LyricsEditor::new(SAMPLE);

    editor.edit_text(1, "  Hi there ").unwrap();
    assert_eq!(editor.lines()[1], "[00:01.50]Hi there");
    assert!(editor.is_modified(1));

    editor.edit_timestamp(2, "[00:04.25]").unwrap();
    assert_eq!(editor.lines()[2], "[00:04.25]World");

    assert_eq!(editor.edit_text(1, "   "), Err(LyricsError::EmptyText));
    assert_eq!(
        editor.edit_timestamp(2, "00:04.25"),
        Err(LyricsError::InvalidTimestamp("00:04.25".to_string()))
    );
    assert_eq!(
        editor.edit_timestamp(2, "[0:4.25]"),
        Err(LyricsError::InvalidTimestamp("[0:4.25]".to_string()))
    );
    assert_eq!(editor.edit_text(9, "x"), Err(LyricsError::LineOutOfRange(9)));

    // Editing back to the loaded value clears the mark
    editor.edit_text(1, "Hello").unwrap();
    assert!(!editor.is_modified(1));
    assert_eq!(editor.modified_lines().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_restore_line_and_timestamp() {
    let mut editor = LyricsEditor::new(SAMPLE);
    editor.edit_text(1, "Changed").unwrap();
    editor.edit_timestamp(1, "[00:09.00]").unwrap();

    editor.restore_timestamp(1).unwrap();
    assert_eq!(editor.lines()[1], "[00:01.50]Changed");
    assert!(!editor.is_modified(1));

    editor.edit_text(2, "Other").unwrap();
    editor.restore_line(2).unwrap();
    assert_eq!(editor.lines()[2], "[00:03.00]World");
    assert!(!editor.is_modified(2));
}

#[test]
fn test_reset_all_timestamps_enters_manual_mode() {
    let mut editor = LyricsEditor::new(SAMPLE);
    let now = Instant::now();

    editor.reset_all_timestamps(now);

    assert!(editor.lines().iter().all(|l| l.starts_with("[00:00.00]")));
    assert_eq!(editor.lines()[3], "[00:00.00]End");
    assert!(editor.is_manual());
    assert_eq!(editor.modified_lines().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_relative_seek_clamps() {
    let mut editor = LyricsEditor::new(SAMPLE);
    editor.set_duration(20.0);

    assert_eq!(editor.seek_by(-5.0), 0.0);
    assert_eq!(editor.seek_by(5.0), 5.0);
    assert_eq!(editor.current_line(), 2);
    assert_eq!(editor.seek_by(100.0), 20.0);
}

#[test]
fn test_serializes_for_save() {
    let mut editor = LyricsEditor::new("--- intro ---\nLa la\n\nDa da");
    let now = Instant::now();
    editor.select_line(1, now).unwrap();
    editor.on_time_update(2.0, now);
    editor.stamp_current_line();

    assert_eq!(editor.to_text(), "[00:00.00]\n[00:02.00]La la\n[00:00.00]Da da");
}
