//! Timestamped lyrics format
//!
//! Lyrics are stored as newline-separated lines of the form
//! `[MM:SS.CC]lyric text`, where each field is exactly two digits.

use serde::{Deserialize, Serialize};

/// Timestamp used for lines that carry none
pub const ZERO_TIMESTAMP: &str = "[00:00.00]";

/// Length of a `[MM:SS.CC]` tag in bytes
const TAG_LEN: usize = 10;

/// One display line of lyrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time in seconds
    pub time: f64,
    pub text: String,
}

/// Parse a bare `MM:SS.CC` value into seconds
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let bytes = value.as_bytes();
    if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b'.' {
        return None;
    }
    let minutes = two_digits(&bytes[0..2])?;
    let seconds = two_digits(&bytes[3..5])?;
    let centis = two_digits(&bytes[6..8])?;
    Some(minutes as f64 * 60.0 + seconds as f64 + centis as f64 / 100.0)
}

fn two_digits(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some(u32::from(a - b'0') * 10 + u32::from(b - b'0'))
        }
        _ => None,
    }
}

/// Split a leading `[MM:SS.CC]` tag from a line
///
/// Returns the tag time (if the line starts with a valid tag) and the rest
/// of the line, untrimmed.
pub fn split_timestamp(line: &str) -> (Option<f64>, &str) {
    if line.len() >= TAG_LEN && line.starts_with('[') && line.as_bytes()[TAG_LEN - 1] == b']' {
        if let Some(time) = line.get(1..TAG_LEN - 1).and_then(parse_timestamp) {
            return (Some(time), &line[TAG_LEN..]);
        }
    }
    (None, line)
}

/// Line text without its leading tag
pub fn strip_timestamp(line: &str) -> &str {
    split_timestamp(line).1
}

/// Format seconds as `MM:SS.CC` (truncating, never rounding up)
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    // Small epsilon absorbs binary representation error (0.29 * 100 = 28.999..)
    let total_centis = (seconds * 100.0 + 1e-6).floor() as u64;
    let minutes = total_centis / 6000;
    let secs = (total_centis / 100) % 60;
    let centis = total_centis % 100;
    format!("{:02}:{:02}.{:02}", minutes, secs, centis)
}

/// `[MM:SS.CC]` tag for a time in seconds
pub fn format_tag(seconds: f64) -> String {
    format!("[{}]", format_timestamp(seconds))
}

/// Parse raw lyrics into display lines
///
/// Blank lines are skipped; untimed lines get time 0. Text is trimmed.
pub fn parse_lyrics(raw: &str) -> Vec<LyricLine> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (time, text) = split_timestamp(line.trim_start());
            LyricLine {
                time: time.unwrap_or(0.0),
                text: text.trim().to_string(),
            }
        })
        .collect()
}

/// Index of the line whose start time most recently passed
///
/// Lines are scanned in display order: line `i` is current while
/// `times[i] <= position < times[i + 1]`, so hand-edited, out-of-order
/// timestamps still resolve to a line. Returns `None` when no line matches.
pub fn current_line_index(times: &[f64], position: f64) -> Option<usize> {
    (0..times.len()).find(|&i| {
        position >= times[i] && times.get(i + 1).map_or(true, |next| position < *next)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_lines() {
        let lines = parse_lyrics("[00:01.50]Hello\n[00:03.00]World");
        assert_eq!(
            lines,
            vec![
                LyricLine {
                    time: 1.5,
                    text: "Hello".to_string()
                },
                LyricLine {
                    time: 3.0,
                    text: "World".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_untimed_and_blank_lines() {
        let lines = parse_lyrics("intro\n\n   \n[01:02.03] chorus ");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].time, 0.0);
        assert_eq!(lines[0].text, "intro");
        assert!((lines[1].time - 62.03).abs() < 1e-9);
        assert_eq!(lines[1].text, "chorus");
    }

    #[test]
    fn test_split_rejects_malformed_tags() {
        assert_eq!(split_timestamp("[1:02.03]x"), (None, "[1:02.03]x"));
        assert_eq!(split_timestamp("[01:02:03]x"), (None, "[01:02:03]x"));
        assert_eq!(split_timestamp("[ab:cd.ef]x"), (None, "[ab:cd.ef]x"));
        assert_eq!(split_timestamp("[00:00.00]"), (Some(0.0), ""));
    }

    #[test]
    fn test_format_timestamp_truncates() {
        assert_eq!(format_timestamp(0.0), "00:00.00");
        assert_eq!(format_timestamp(1.5), "00:01.50");
        assert_eq!(format_timestamp(62.29), "01:02.29");
        assert_eq!(format_timestamp(59.999), "00:59.99");
        assert_eq!(format_timestamp(-3.0), "00:00.00");
        assert_eq!(format_tag(75.0), "[01:15.00]");
    }

    #[test]
    fn test_current_line_index() {
        let times = [0.0, 1.5, 3.0];
        assert_eq!(current_line_index(&times, 0.0), Some(0));
        assert_eq!(current_line_index(&times, 2.9), Some(1));
        assert_eq!(current_line_index(&times, 3.0), Some(2));
        assert_eq!(current_line_index(&times, 99.0), Some(2));
        assert_eq!(current_line_index(&[1.0], 0.5), None);
    }

    #[test]
    fn test_current_line_index_out_of_order() {
        // Line 2 was stamped earlier than line 1
        let times = [0.0, 5.0, 2.0, 6.0];
        assert_eq!(current_line_index(&times, 3.0), Some(0));
        assert_eq!(current_line_index(&times, 5.5), Some(2));
        assert_eq!(current_line_index(&times, 6.5), Some(3));
    }
}
