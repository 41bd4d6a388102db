//! Boundary resolution
//!
//! The reader renders a unit as continuous prose: every row's text followed
//! by a single space, except the last. The layout keeps the mapping from a
//! character position in that flattened text back to `(row, offset)`, so a
//! selection endpoint becomes an index lookup instead of a walk over
//! rendered nodes.
//!
//! The separator after a row belongs to that row's span. An endpoint that
//! lands inside it counts past the row's text; such offsets are clamped to
//! the row length.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::segment::RenderedRow;
use super::types::{Boundary, RowId};
use super::unit::ReadingUnit;

/// A raw selection endpoint as reported by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TextAnchor {
    /// Character index into the unit's flattened text
    Position { position: usize },
    /// Offset inside one styled segment of an already rendered row
    #[serde(rename_all = "camelCase")]
    Segment {
        row_id: RowId,
        segment: usize,
        offset: usize,
    },
}

#[derive(Debug, Clone)]
struct RowSpan {
    row_id: RowId,
    start: usize,
    text_len: usize,
    rendered_len: usize,
}

/// Character layout of a reading unit's rendered text
#[derive(Debug, Clone, Default)]
pub struct UnitLayout {
    spans: Vec<RowSpan>,
    index_by_id: HashMap<RowId, usize>,
    total: usize,
}

impl UnitLayout {
    pub fn new(unit: &ReadingUnit) -> Self {
        let count = unit.rows().len();
        let mut spans = Vec::with_capacity(count);
        let mut index_by_id = HashMap::with_capacity(count);
        let mut cursor = 0;

        for (i, row) in unit.rows().iter().enumerate() {
            let text_len = unit.len_at(i);
            let separator = usize::from(i + 1 < count);
            spans.push(RowSpan {
                row_id: row.id,
                start: cursor,
                text_len,
                rendered_len: text_len + separator,
            });
            index_by_id.insert(row.id, i);
            cursor += text_len + separator;
        }

        Self {
            spans,
            index_by_id,
            total: cursor,
        }
    }

    /// Length of the flattened text in characters
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Map a flattened position to a boundary; `None` if no row span
    /// encloses it.
    pub fn resolve(&self, position: usize) -> Option<Boundary> {
        if self.spans.is_empty() || position > self.total {
            return None;
        }
        // A position exactly between two spans starts the later row
        let idx = self
            .spans
            .partition_point(|s| s.start <= position)
            .checked_sub(1)?;
        let span = &self.spans[idx];
        let local = position - span.start;
        if local > span.rendered_len {
            return None;
        }
        Some(Boundary::new(span.row_id, local.min(span.text_len)))
    }

    /// Inverse of [`resolve`](Self::resolve)
    pub fn position_of(&self, boundary: &Boundary) -> Option<usize> {
        let span = &self.spans[*self.index_by_id.get(&boundary.row_id)?];
        Some(span.start + boundary.offset.min(span.text_len))
    }

    /// Resolve an anchor. Segment anchors count the flattened characters
    /// of every preceding segment in the row, whatever styling split them.
    pub fn resolve_anchor(&self, anchor: &TextAnchor, rendered: &[RenderedRow]) -> Option<Boundary> {
        match *anchor {
            TextAnchor::Position { position } => self.resolve(position),
            TextAnchor::Segment {
                row_id,
                segment,
                offset,
            } => {
                let span = &self.spans[*self.index_by_id.get(&row_id)?];
                let row = rendered.iter().find(|r| r.row_id == row_id)?;
                let before: usize = row
                    .segments
                    .iter()
                    .take(segment)
                    .map(|s| s.text.chars().count())
                    .sum();
                Some(Boundary::new(row_id, (before + offset).min(span.text_len)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::fixtures::unit;
    use crate::range::segment::render_unit;

    fn layout() -> (ReadingUnit, UnitLayout) {
        // "abc def" (7) + sep, "gh" (2) + sep, "ijkl" (4) => 7+1+2+1+4 = 15
        let u = unit(&[(10, "abc def"), (4, "gh"), (22, "ijkl")]);
        let l = UnitLayout::new(&u);
        (u, l)
    }

    #[test]
    fn test_layout_length_counts_separators() {
        let (_, l) = layout();
        assert_eq!(l.len(), 15);
    }

    #[test]
    fn test_resolve_inside_rows() {
        let (_, l) = layout();
        assert_eq!(l.resolve(0), Some(Boundary::new(10, 0)));
        assert_eq!(l.resolve(3), Some(Boundary::new(10, 3)));
        assert_eq!(l.resolve(8), Some(Boundary::new(4, 0)));
        assert_eq!(l.resolve(10), Some(Boundary::new(4, 2)));
        assert_eq!(l.resolve(15), Some(Boundary::new(22, 4)));
    }

    #[test]
    fn test_resolve_row_end_before_separator() {
        let (_, l) = layout();
        // Position 7 sits just before the separator after "abc def"
        assert_eq!(l.resolve(7), Some(Boundary::new(10, 7)));
    }

    #[test]
    fn test_resolve_outside_rows_fails() {
        let (_, l) = layout();
        assert_eq!(l.resolve(16), None);
        assert_eq!(UnitLayout::default().resolve(0), None);
    }

    #[test]
    fn test_position_round_trip() {
        let (_, l) = layout();
        for pos in 0..=l.len() {
            let b = l.resolve(pos).unwrap();
            assert_eq!(l.position_of(&b), Some(pos));
        }
    }

    #[test]
    fn test_segment_anchor_counts_flattened_text() {
        use crate::marks::test_support::annotation;
        use crate::marks::AnnotationType;

        let (u, l) = layout();
        let note = annotation("n1", AnnotationType::Note, (10, 2), (10, 5), 1);
        let rendered = render_unit(&u, &[note]);
        // "ab" | "c d" | "ef"
        assert_eq!(rendered[0].segments.len(), 3);

        let anchor = TextAnchor::Segment {
            row_id: 10,
            segment: 2,
            offset: 1,
        };
        assert_eq!(l.resolve_anchor(&anchor, &rendered), Some(Boundary::new(10, 6)));

        let trailing = TextAnchor::Segment {
            row_id: 10,
            segment: 3,
            offset: 1,
        };
        assert_eq!(l.resolve_anchor(&trailing, &rendered), Some(Boundary::new(10, 7)));

        let foreign = TextAnchor::Segment {
            row_id: 77,
            segment: 0,
            offset: 0,
        };
        assert_eq!(l.resolve_anchor(&foreign, &rendered), None);
    }
}
