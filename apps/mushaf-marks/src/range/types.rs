//! Logical text coordinates within a reading unit
//!
//! Offsets count Unicode scalar values (`char`) everywhere: resolution,
//! validation, extraction, excerpt truncation and segmentation all agree
//! on that unit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a verse row
pub type RowId = i64;

/// A position within the text of a reading unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boundary {
    pub row_id: RowId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(row_id: RowId, offset: usize) -> Self {
        Self { row_id, offset }
    }
}

/// An ordered pair of boundaries, `start` strictly before `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl TextRange {
    pub fn is_single_row(&self) -> bool {
        self.start.row_id == self.end.row_id
    }
}

/// Reasons a selection cannot become an annotation range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range is empty")]
    Degenerate,

    #[error("row {0} is not part of the loaded reading unit")]
    RowNotInUnit(RowId),

    #[error("offset {offset} is past the end of row {row_id} ({len} chars)")]
    OffsetOutOfBounds {
        row_id: RowId,
        offset: usize,
        len: usize,
    },

    #[error("position does not fall inside any verse row")]
    Unresolved,
}

/// Truncate to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => text[..byte].to_string(),
        None => text.to_string(),
    }
}

/// Slice `[start, end)` in character offsets, clamped to the text
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(b, _)| b)
            .unwrap_or(text.len())
    };
    let from = byte_at(start);
    let to = byte_at(end);
    &text[from..to]
}
