//! Chapter numbers and song file names
//!
//! Song file names follow `{chapterNumber}-{n}`; `n` counts up per chapter.
//! Drive file IDs are limited to `[A-Za-z0-9_-]` wherever they are spliced
//! into a URL.

use std::cmp::Ordering;

/// First run of ASCII digits in a chapter name ("계시록 12장" -> 12)
pub fn chapter_number(name: &str) -> Option<u32> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Sequence number `n` if `file_name` is exactly `{chapter}-{n}`
pub fn file_sequence(file_name: &str, chapter: u32) -> Option<u32> {
    let prefix = format!("{}-", chapter);
    let rest = file_name.strip_prefix(&prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Next free file name for a chapter given the existing names in it
pub fn next_file_name<'a, I>(chapter: u32, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|name| file_sequence(name, chapter))
        .max()
        .unwrap_or(0);
    format!("{}-{}", chapter, max + 1)
}

/// True for a non-empty Drive file ID made only of `[A-Za-z0-9_-]`
pub fn is_valid_file_id(file_id: &str) -> bool {
    !file_id.is_empty()
        && file_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Split `{chapter}-{n}` into its numeric parts
fn file_name_key(file_name: &str) -> Option<(u32, u32)> {
    let (chapter, seq) = file_name.split_once('-')?;
    Some((chapter.trim().parse().ok()?, seq.trim().parse().ok()?))
}

/// Numeric ordering on `{chapter}-{n}` file names
///
/// Names that do not follow the convention sort after conforming ones, in
/// plain string order.
pub fn compare_file_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    let key_a = a.and_then(file_name_key);
    let key_b = b.and_then(file_name_key);
    match (key_a, key_b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.unwrap_or("").cmp(b.unwrap_or("")),
    }
}
