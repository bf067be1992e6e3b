//! Character-level diff, fuzzy match and patch engine.
//!
//! This is the diff-match-patch family of algorithms: a Myers O(ND) bisection
//! diff with semantic and efficiency cleanup passes, a Bitap fuzzy matcher,
//! and a hunk-based patch format that can be serialized to text and applied
//! to drifted input.
//!
//! All offsets and lengths are measured in Unicode scalar values (`char`s).

mod cleanup;
mod diff;
mod error;
mod matcher;
mod parser;
mod patch;
mod uri;

use std::time::{Duration, Instant};

pub use error::TextError;
pub use parser::{HunkHeader, HunkRange, parse_hunk_header};
pub use patch::{Patch, PatchInput};
pub use uri::{decode_uri, encode_uri};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Delete,
    Equal,
    Insert,
}

/// One run of a diff: an operation applied to a span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub op: Operation,
    pub text: Vec<char>,
}

impl Diff {
    pub fn new(op: Operation, text: &str) -> Self {
        Diff {
            op,
            text: text.chars().collect(),
        }
    }

    pub fn from_chars(op: Operation, text: impl Into<Vec<char>>) -> Self {
        Diff {
            op,
            text: text.into(),
        }
    }

    pub fn equal(text: &str) -> Self {
        Diff::new(Operation::Equal, text)
    }

    pub fn insert(text: &str) -> Self {
        Diff::new(Operation::Insert, text)
    }

    pub fn delete(text: &str) -> Self {
        Diff::new(Operation::Delete, text)
    }

    /// The text of this run as an owned string.
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }
}

/// Tunables for the diff, match and patch algorithms.
///
/// The defaults match the values every other diff-match-patch port ships with,
/// so patch text produced here is interchangeable with theirs.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffMatchPatch {
    /// Time budget for a single diff. `Duration::ZERO` means unlimited.
    pub diff_timeout: Duration,
    /// Cost of an empty edit operation in terms of edit characters.
    pub diff_edit_cost: usize,
    /// At what point is no match declared (0.0 = perfection, 1.0 = very loose).
    pub match_threshold: f64,
    /// How far to search for a match (0 = exact location, 1000+ = broad match).
    pub match_distance: usize,
    /// When deleting a large block of text, how close do the contents have to
    /// be to match the expected contents.
    pub patch_delete_threshold: f64,
    /// Chunk size for context length.
    pub patch_margin: usize,
    /// The number of bits in the Bitap bitmask.
    pub match_max_bits: usize,
}

impl Default for DiffMatchPatch {
    fn default() -> Self {
        DiffMatchPatch {
            diff_timeout: Duration::from_secs(1),
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
            match_max_bits: 32,
        }
    }
}

impl DiffMatchPatch {
    pub fn new() -> Self {
        DiffMatchPatch::default()
    }

    fn deadline(&self) -> Option<Instant> {
        if self.diff_timeout.is_zero() {
            None
        } else {
            Some(Instant::now() + self.diff_timeout)
        }
    }
}

/// Position of `needle` in `haystack` at or after `from`.
///
/// An empty needle is found at `from` as long as `from` is within bounds.
pub(crate) fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    if needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

pub(crate) fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    find_from(haystack, needle, 0)
}

/// Last position of `needle` in `haystack` starting at or before `from`.
pub(crate) fn rfind_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last_start = (haystack.len() - needle.len()).min(from);
    (0..=last_start)
        .rev()
        .find(|&start| &haystack[start..start + needle.len()] == needle)
}

pub(crate) fn rfind(haystack: &[char], needle: &[char]) -> Option<usize> {
    rfind_from(haystack, needle, haystack.len())
}

/// Slice with clamped bounds, swapping them when reversed.
pub(crate) fn substring(text: &[char], start: isize, end: isize) -> &[char] {
    let len = text.len() as isize;
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    if start > end {
        &text[end..start]
    } else {
        &text[start..end]
    }
}
