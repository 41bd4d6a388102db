//! Annotation range engine
//!
//! Turns live text selections into ordered, validated ranges over a
//! reading unit and projects overlapping annotations back onto styled
//! per-row segments.
//!
//! - `types`: boundaries, ranges and character-unit helpers
//! - `unit`: row ordering, normalization, validation, text extraction
//! - `layout`: flattened-position to boundary resolution
//! - `segment`: overlap segmentation with explicit style precedence

mod layout;
mod segment;
mod types;
mod unit;

pub use layout::{TextAnchor, UnitLayout};
pub use segment::{render_unit, segment_row, RenderedRow, StyledSegment, DEFAULT_NOTE_LABEL};
pub use types::{slice_chars, truncate_chars, Boundary, RangeError, RowId, TextRange};
pub use unit::{ReadingUnit, ROW_SEPARATOR};

/// Characters kept in the live selection preview
pub const PREVIEW_CHARS: usize = 120;

/// Characters kept in a persisted excerpt
pub const EXCERPT_CHARS: usize = 200;

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{ReadingUnit, RowId};
    use crate::verses::VerseRow;

    /// A unit at hizb 1, quarter 1 with the given `(id, text)` rows in order
    pub fn unit(texts: &[(RowId, &str)]) -> ReadingUnit {
        let rows = texts
            .iter()
            .map(|(id, text)| VerseRow::new(*id, text))
            .collect();
        ReadingUnit::new(1, 1, rows)
    }
}
