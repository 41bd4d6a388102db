//! Verse text access
//!
//! Rows come from the read-only `warshquran` table. A reading unit is one
//! quarter of a hizb: 60 hizbs of 4 quarters each.

mod store;

pub use store::{QuarterPreview, VerseRepository, VerseStore};

#[cfg(test)]
pub(crate) use store::test_support;

use serde::{Deserialize, Serialize};

use crate::range::RowId;

pub const HIZB_COUNT: i64 = 60;
pub const QUARTERS_PER_HIZB: i64 = 4;

/// One verse as stored, ordered by `id` within a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VerseRow {
    pub id: RowId,
    pub sura_no: i64,
    pub aya_no: i64,
    pub text: String,
}

impl VerseRow {
    /// A row with no sura/aya numbering, for text-only fixtures
    pub fn new(id: RowId, text: &str) -> Self {
        Self {
            id,
            sura_no: 0,
            aya_no: 0,
            text: text.to_string(),
        }
    }
}

/// Address of a reading unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId {
    pub hizb: i64,
    pub quarter: i64,
}

impl UnitId {
    pub const FIRST: UnitId = UnitId { hizb: 1, quarter: 1 };
    pub const LAST: UnitId = UnitId {
        hizb: HIZB_COUNT,
        quarter: QUARTERS_PER_HIZB,
    };

    /// `None` outside hizb 1..=60 or quarter 1..=4
    pub fn new(hizb: i64, quarter: i64) -> Option<Self> {
        let valid = (1..=HIZB_COUNT).contains(&hizb) && (1..=QUARTERS_PER_HIZB).contains(&quarter);
        valid.then_some(Self { hizb, quarter })
    }

    /// The following quarter, crossing into the next hizb; stops at 60/4
    pub fn next(self) -> Option<Self> {
        if self.quarter < QUARTERS_PER_HIZB {
            Some(Self {
                quarter: self.quarter + 1,
                ..self
            })
        } else if self.hizb < HIZB_COUNT {
            Some(Self {
                hizb: self.hizb + 1,
                quarter: 1,
            })
        } else {
            None
        }
    }

    /// The preceding quarter; stops at 1/1
    pub fn prev(self) -> Option<Self> {
        if self.quarter > 1 {
            Some(Self {
                quarter: self.quarter - 1,
                ..self
            })
        } else if self.hizb > 1 {
            Some(Self {
                hizb: self.hizb - 1,
                quarter: QUARTERS_PER_HIZB,
            })
        } else {
            None
        }
    }
}
