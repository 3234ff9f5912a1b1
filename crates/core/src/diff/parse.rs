//! Unified-diff text parser
//!
//! The parser is an implicit state machine over the diff's lines. It only
//! cares about lines starting with `--- `, `+++ ` or `@@ -` and ignores
//! everything else (`diff --git`, `index`, body lines). A malformed header
//! fails the whole parse; no partial patch is ever returned.

use super::{DiffFile, Hunk, Patch};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static HUNK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid file header at line {line}: '{text}'")]
    InvalidFileHeader { line: usize, text: String },

    #[error("unexpected line {line}: '{text}'")]
    UnexpectedLine { line: usize, text: String },

    #[error("could not extract hunk info from line {line}: '{text}'")]
    InvalidHunkHeader { line: usize, text: String },
}

/// Parse unified-diff text into a [`Patch`].
///
/// `--- /dev/null` marks a file addition (`old_name` empty), `+++ /dev/null`
/// a deletion (`new_name` empty); otherwise the `a/`/`b/` prefixes are
/// stripped. A hunk header with an omitted `,len` defaults that length to 1.
pub fn parse(diff: &str) -> Result<Patch, ParseError> {
    let mut patch = Patch::default();

    for (i, line) in diff.lines().enumerate() {
        if let Some(rest) = line.strip_prefix("--- ") {
            let old_name = if line == "--- /dev/null" {
                // file addition
                String::new()
            } else if let Some(name) = rest.strip_prefix("a/") {
                name.to_string()
            } else {
                return Err(ParseError::InvalidFileHeader {
                    line: i,
                    text: line.to_string(),
                });
            };
            patch.files.push(DiffFile {
                old_name,
                ..DiffFile::default()
            });
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            let file = match patch.files.last_mut() {
                Some(f) if f.hunks.is_empty() => f,
                _ => {
                    return Err(ParseError::UnexpectedLine {
                        line: i,
                        text: line.to_string(),
                    })
                }
            };
            file.new_name = if line == "+++ /dev/null" {
                // file deletion
                String::new()
            } else if let Some(name) = rest.strip_prefix("b/") {
                name.to_string()
            } else {
                return Err(ParseError::InvalidFileHeader {
                    line: i,
                    text: line.to_string(),
                });
            };
        } else if line.starts_with("@@ -") {
            let caps =
                HUNK_RE
                    .captures(line)
                    .ok_or_else(|| ParseError::InvalidHunkHeader {
                        line: i,
                        text: line.to_string(),
                    })?;
            let hunk = Hunk {
                old_pos: parse_field(&caps, 1, i, line)?,
                old_lines: parse_optional_field(&caps, 2, i, line)?,
                new_pos: parse_field(&caps, 3, i, line)?,
                new_lines: parse_optional_field(&caps, 4, i, line)?,
            };
            let file = match patch.files.last_mut() {
                Some(f) => f,
                None => {
                    return Err(ParseError::UnexpectedLine {
                        line: i,
                        text: line.to_string(),
                    })
                }
            };
            file.hunks.push(hunk);
        }
    }

    Ok(patch)
}

fn parse_field(
    caps: &regex::Captures<'_>,
    idx: usize,
    line: usize,
    text: &str,
) -> Result<u32, ParseError> {
    caps[idx]
        .parse()
        .map_err(|_| ParseError::InvalidHunkHeader {
            line,
            text: text.to_string(),
        })
}

/// An omitted `,len` field means a length of 1.
fn parse_optional_field(
    caps: &regex::Captures<'_>,
    idx: usize,
    line: usize,
    text: &str,
) -> Result<u32, ParseError> {
    match caps.get(idx) {
        Some(m) => m.as_str().parse().map_err(|_| ParseError::InvalidHunkHeader {
            line,
            text: text.to_string(),
        }),
        None => Ok(1),
    }
}
