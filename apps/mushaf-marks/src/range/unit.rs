//! Reading unit: the ordered row sequence every boundary is measured against

use std::cmp::Ordering;
use std::collections::HashMap;

use super::types::{slice_chars, Boundary, RangeError, RowId, TextRange};
use crate::verses::VerseRow;

/// Rows are joined with this when a range spans more than one verse
pub const ROW_SEPARATOR: &str = " ";

/// The loaded (hizb, quarter) and its rows in display order
#[derive(Debug, Clone)]
pub struct ReadingUnit {
    pub hizb: i64,
    pub quarter: i64,
    rows: Vec<VerseRow>,
    index_by_id: HashMap<RowId, usize>,
    lens: Vec<usize>,
}

impl ReadingUnit {
    pub fn new(hizb: i64, quarter: i64, rows: Vec<VerseRow>) -> Self {
        let index_by_id = rows.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
        let lens = rows.iter().map(|r| r.text.chars().count()).collect();
        Self {
            hizb,
            quarter,
            rows,
            index_by_id,
            lens,
        }
    }

    pub fn rows(&self) -> &[VerseRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a row in the unit's sequence. Row ids are not assumed
    /// contiguous or ordered, so this is the only ordering that counts.
    pub fn row_index(&self, row_id: RowId) -> Option<usize> {
        self.index_by_id.get(&row_id).copied()
    }

    pub fn contains(&self, row_id: RowId) -> bool {
        self.index_by_id.contains_key(&row_id)
    }

    pub fn row(&self, row_id: RowId) -> Option<&VerseRow> {
        self.row_index(row_id).map(|i| &self.rows[i])
    }

    /// Length in characters of the row at `index`
    pub fn len_at(&self, index: usize) -> usize {
        self.lens.get(index).copied().unwrap_or(0)
    }

    pub fn row_len(&self, row_id: RowId) -> Option<usize> {
        self.row_index(row_id).map(|i| self.lens[i])
    }

    /// Row-sequence order, then offset order
    pub fn compare(&self, a: &Boundary, b: &Boundary) -> Option<Ordering> {
        let ai = self.row_index(a.row_id)?;
        let bi = self.row_index(b.row_id)?;
        Some(ai.cmp(&bi).then(a.offset.cmp(&b.offset)))
    }

    /// Order two selection endpoints given in either drag direction
    pub fn normalize(&self, a: Boundary, b: Boundary) -> Result<TextRange, RangeError> {
        let ordering = self
            .compare(&a, &b)
            .ok_or_else(|| self.missing_row(&a, &b))?;

        match ordering {
            Ordering::Less => Ok(TextRange { start: a, end: b }),
            Ordering::Greater => Ok(TextRange { start: b, end: a }),
            Ordering::Equal => Err(RangeError::Degenerate),
        }
    }

    /// Check that both endpoints lie inside the unit's text, then normalize
    pub fn validate(&self, range: TextRange) -> Result<TextRange, RangeError> {
        for boundary in [range.start, range.end] {
            let len = self
                .row_len(boundary.row_id)
                .ok_or(RangeError::RowNotInUnit(boundary.row_id))?;
            if boundary.offset > len {
                return Err(RangeError::OffsetOutOfBounds {
                    row_id: boundary.row_id,
                    offset: boundary.offset,
                    len,
                });
            }
        }
        self.normalize(range.start, range.end)
    }

    /// Literal text spanned by a range; rows in between are joined with a
    /// single space. Unknown rows yield an empty string.
    pub fn extract_text(&self, range: &TextRange) -> String {
        let (Some(si), Some(ei)) = (
            self.row_index(range.start.row_id),
            self.row_index(range.end.row_id),
        ) else {
            return String::new();
        };

        let mut parts: Vec<&str> = Vec::new();
        for i in si..=ei {
            let text = self.rows[i].text.as_str();
            let len = self.lens[i];
            let piece = if i == si && i == ei {
                slice_chars(text, range.start.offset, range.end.offset)
            } else if i == si {
                slice_chars(text, range.start.offset, len)
            } else if i == ei {
                slice_chars(text, 0, range.end.offset)
            } else {
                text
            };
            parts.push(piece);
        }
        parts.join(ROW_SEPARATOR)
    }

    fn missing_row(&self, a: &Boundary, b: &Boundary) -> RangeError {
        if self.contains(a.row_id) {
            RangeError::RowNotInUnit(b.row_id)
        } else {
            RangeError::RowNotInUnit(a.row_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::fixtures::unit;
    use proptest::prelude::*;

    fn sample() -> ReadingUnit {
        // Ids deliberately out of numeric order
        unit(&[
            (40, "الحمد لله"),
            (7, "رب العالمين"),
            (90, "الرحمن الرحيم"),
            (3, "مالك يوم الدين"),
            (55, "إياك نعبد"),
            (12, "وإياك نستعين"),
        ])
    }

    #[test]
    fn test_normalize_orders_by_row_position_not_id() {
        let u = sample();
        let a = Boundary::new(12, 2); // index 5
        let b = Boundary::new(90, 1); // index 2

        let range = u.normalize(a, b).unwrap();
        assert_eq!(range.start, b);
        assert_eq!(range.end, a);
        assert_eq!(u.row_index(range.start.row_id), Some(2));
    }

    #[test]
    fn test_normalize_same_row_by_offset() {
        let u = sample();
        let range = u
            .normalize(Boundary::new(7, 8), Boundary::new(7, 2))
            .unwrap();
        assert_eq!(range.start.offset, 2);
        assert_eq!(range.end.offset, 8);
    }

    #[test]
    fn test_normalize_symmetric_and_idempotent() {
        let u = sample();
        let points = [
            Boundary::new(40, 0),
            Boundary::new(40, 5),
            Boundary::new(7, 3),
            Boundary::new(3, 0),
            Boundary::new(12, 11),
        ];
        for a in points {
            for b in points {
                let ab = u.normalize(a, b);
                let ba = u.normalize(b, a);
                assert_eq!(ab, ba);
                if let Ok(r) = ab {
                    assert_eq!(u.normalize(r.start, r.end), Ok(r));
                }
            }
        }
    }

    /// Boundaries on the sample rows plus one foreign row
    fn boundary() -> impl Strategy<Value = Boundary> {
        (
            prop::sample::select(vec![40i64, 7, 90, 3, 55, 12, 999]),
            0..16usize,
        )
            .prop_map(|(row_id, offset)| Boundary::new(row_id, offset))
    }

    proptest! {
        #[test]
        fn test_normalize_any_pair_is_symmetric(a in boundary(), b in boundary()) {
            let u = sample();
            let ab = u.normalize(a, b);
            prop_assert_eq!(ab, u.normalize(b, a));
            if let Ok(r) = ab {
                prop_assert_eq!(u.compare(&r.start, &r.end), Some(Ordering::Less));
                prop_assert_eq!(u.normalize(r.start, r.end), Ok(r));
            }
        }
    }

    #[test]
    fn test_normalize_rejects_degenerate() {
        let u = sample();
        let b = Boundary::new(55, 4);
        assert_eq!(u.normalize(b, b), Err(RangeError::Degenerate));
    }

    #[test]
    fn test_normalize_rejects_foreign_row() {
        let u = sample();
        let err = u
            .normalize(Boundary::new(40, 0), Boundary::new(999, 1))
            .unwrap_err();
        assert_eq!(err, RangeError::RowNotInUnit(999));
    }

    #[test]
    fn test_validate_rejects_offset_past_row_end() {
        let u = sample();
        let range = TextRange {
            start: Boundary::new(40, 0),
            end: Boundary::new(40, 42),
        };
        assert!(matches!(
            u.validate(range),
            Err(RangeError::OffsetOutOfBounds { row_id: 40, offset: 42, .. })
        ));
    }

    #[test]
    fn test_validate_reorders_reversed_range() {
        let u = sample();
        let range = TextRange {
            start: Boundary::new(3, 4),
            end: Boundary::new(40, 1),
        };
        let fixed = u.validate(range).unwrap();
        assert_eq!(fixed.start, Boundary::new(40, 1));
    }

    #[test]
    fn test_extract_full_single_row() {
        let u = sample();
        for row in u.rows() {
            let len = row.text.chars().count();
            let range = TextRange {
                start: Boundary::new(row.id, 0),
                end: Boundary::new(row.id, len),
            };
            assert_eq!(u.extract_text(&range), row.text);
        }
    }

    #[test]
    fn test_extract_across_rows_joins_with_space() {
        let u = sample();
        let range = TextRange {
            start: Boundary::new(40, 6),
            end: Boundary::new(90, 6),
        };
        assert_eq!(u.extract_text(&range), "لله رب العالمين الرحمن");
    }

    #[test]
    fn test_extract_unknown_row_is_empty() {
        let u = sample();
        let range = TextRange {
            start: Boundary::new(1, 0),
            end: Boundary::new(40, 3),
        };
        assert_eq!(u.extract_text(&range), "");
    }
}
