use std::fmt;

use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt},
    error::context,
    sequence::{delimited, preceded},
};
use nom_language::error::VerboseError;

use super::TextError;

/// One side of a hunk header, kept in its textual form.
///
/// `start` is 1-based unless `length` is `Some(0)`; a missing length means 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: usize,
    pub length: Option<usize>,
}

impl HunkRange {
    /// Range for a zero-based `start` spanning `length` characters.
    pub fn from_bounds(start: usize, length: usize) -> Self {
        match length {
            0 => HunkRange {
                start,
                length: Some(0),
            },
            1 => HunkRange {
                start: start + 1,
                length: None,
            },
            n => HunkRange {
                start: start + 1,
                length: Some(n),
            },
        }
    }

    /// Zero-based start offset.
    pub fn offset(&self) -> usize {
        match self.length {
            Some(0) => self.start,
            _ => self.start.saturating_sub(1),
        }
    }

    pub fn len(&self) -> usize {
        self.length.unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for HunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(length) => write!(f, "{},{}", self.start, length),
            None => write!(f, "{}", self.start),
        }
    }
}

/// `@@ -old +new @@`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old: HunkRange,
    pub new: HunkRange,
}

impl HunkHeader {
    /// The same hunk seen from the other side.
    pub fn swapped(self) -> Self {
        HunkHeader {
            old: self.new,
            new: self.old,
        }
    }
}

impl fmt::Display for HunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@@ -{} +{} @@", self.old, self.new)
    }
}

pub fn parse_hunk_header(line: &str) -> Result<HunkHeader, TextError> {
    all_consuming(hunk_header)
        .parse(line)
        .map(|(_, header)| header)
        .map_err(|_| TextError::invalid_patch_header(line))
}

fn hunk_header(input: &str) -> IResult<&str, HunkHeader, VerboseError<&str>> {
    context(
        "hunk header",
        map(
            (
                preceded(tag("@@ -"), hunk_range),
                delimited(tag(" +"), hunk_range, tag(" @@")),
            ),
            |(old, new)| HunkHeader { old, new },
        ),
    )
    .parse(input)
}

fn hunk_range(input: &str) -> IResult<&str, HunkRange, VerboseError<&str>> {
    map(
        (number, opt(preceded(char(','), opt(number)))),
        |(start, length)| HunkRange {
            start,
            length: length.flatten(),
        },
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, usize, VerboseError<&str>> {
    context("number", map_res(digit1, |digits: &str| digits.parse::<usize>())).parse(input)
}
