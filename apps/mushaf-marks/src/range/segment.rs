//! Overlap segmentation
//!
//! Projects the possibly overlapping annotations covering a row onto
//! non-overlapping styled spans. Cut points are the clipped endpoints of
//! every covering annotation plus the row's own ends, so the covering set
//! is constant between two consecutive cuts.
//!
//! Style precedence is independent of input order. Covering annotations
//! are ranked by `(created_at, id)`:
//! - text color: last colored `mistake`
//! - background: last colored `mutashabih`
//! - underline: any `note`; the tooltip is the earliest note's text

use std::collections::BTreeSet;

use serde::Serialize;

use super::types::RowId;
use super::unit::ReadingUnit;
use crate::marks::{Annotation, AnnotationType};

/// Tooltip shown for a note annotation without text
pub const DEFAULT_NOTE_LABEL: &str = "ملاحظة";

/// One style-resolved run of a row's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledSegment {
    pub text: String,
    /// Character offset of the run within the row
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_tooltip: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotation_ids: Vec<String>,
}

impl StyledSegment {
    pub fn is_plain(&self) -> bool {
        self.annotation_ids.is_empty()
    }
}

/// A row's segments, in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    pub row_id: RowId,
    pub segments: Vec<StyledSegment>,
}

impl RenderedRow {
    /// Concatenated segment text; always equals the row's original text
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// An annotation clipped to one row's local offsets
struct Clipped<'a> {
    annotation: &'a Annotation,
    start: usize,
    end: usize,
}

/// Segment every row of the unit
pub fn render_unit(unit: &ReadingUnit, annotations: &[Annotation]) -> Vec<RenderedRow> {
    unit.rows()
        .iter()
        .map(|row| RenderedRow {
            row_id: row.id,
            segments: segment_row(unit, row.id, annotations),
        })
        .collect()
}

/// Segment one row. Annotations from other units or with endpoints outside
/// the unit are ignored; a row not in the unit yields no segments.
pub fn segment_row(unit: &ReadingUnit, row_id: RowId, annotations: &[Annotation]) -> Vec<StyledSegment> {
    let Some(ri) = unit.row_index(row_id) else {
        return Vec::new();
    };
    let text = unit.rows()[ri].text.as_str();
    let len = unit.len_at(ri);

    let mut covering: Vec<Clipped<'_>> = annotations
        .iter()
        .filter(|a| a.belongs_to(unit.hizb, unit.quarter))
        .filter_map(|a| {
            let si = unit.row_index(a.start.row_id)?;
            let ei = unit.row_index(a.end.row_id)?;
            if ri < si || ri > ei {
                return None;
            }
            let start = if ri == si { a.start.offset } else { 0 };
            let end = if ri == ei { a.end.offset } else { len };
            (start < end).then_some(Clipped {
                annotation: a,
                start,
                end,
            })
        })
        .collect();
    covering.sort_by(|x, y| x.annotation.precedence_key().cmp(&y.annotation.precedence_key()));

    let mut cuts = BTreeSet::from([0, len]);
    for c in &covering {
        cuts.insert(c.start.min(len));
        cuts.insert(c.end.min(len));
    }
    let cuts: Vec<usize> = cuts.into_iter().collect();

    let byte_at: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();

    cuts.windows(2)
        .filter_map(|w| {
            let (s, e) = (w[0], w[1]);
            let piece = &text[byte_at[s]..byte_at[e]];
            if piece.is_empty() {
                return None;
            }
            let active: Vec<&Annotation> = covering
                .iter()
                .filter(|c| c.start < e && c.end > s)
                .map(|c| c.annotation)
                .collect();
            Some(resolve_style(piece, s, e, &active))
        })
        .collect()
}

/// `active` must already be in precedence order
fn resolve_style(text: &str, start: usize, end: usize, active: &[&Annotation]) -> StyledSegment {
    let mut color = None;
    let mut background_color = None;
    let mut note_tooltip = None;

    for a in active {
        match a.annotation_type {
            AnnotationType::Mistake if a.color.is_some() => color = a.color.clone(),
            AnnotationType::Mutashabih if a.color.is_some() => background_color = a.color.clone(),
            AnnotationType::Note if note_tooltip.is_none() => {
                let label = a
                    .note
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_NOTE_LABEL);
                note_tooltip = Some(label.to_string());
            }
            _ => {}
        }
    }

    StyledSegment {
        text: text.to_string(),
        start,
        end,
        color,
        background_color,
        underline: note_tooltip.is_some(),
        note_tooltip,
        annotation_ids: active.iter().map(|a| a.id.clone()).collect(),
    }
}
