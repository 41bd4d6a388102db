//! Annotation and group records
//!
//! The wire format follows the reader's original marks API: camelCase
//! fields, `type` for the annotation kind, boundaries as `{rowId, offset}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::range::{Boundary, TextRange};

/// Kinds of user markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Underline with a free-text comment
    Note,
    /// Text-color highlight
    Mistake,
    /// Background-color highlight, optionally grouped
    Mutashabih,
}

impl AnnotationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Note => "note",
            AnnotationType::Mistake => "mistake",
            AnnotationType::Mutashabih => "mutashabih",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(AnnotationType::Note),
            "mistake" => Ok(AnnotationType::Mistake),
            "mutashabih" => Ok(AnnotationType::Mutashabih),
            other => Err(format!("unknown annotation type: {}", other)),
        }
    }
}

/// A persisted annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub hizb: i64,
    pub quarter: i64,
    pub start: Boundary,
    pub end: Boundary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Cached text of the range, at most 200 characters
    #[serde(default)]
    pub excerpt: String,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Annotation {
    pub fn range(&self) -> TextRange {
        TextRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn belongs_to(&self, hizb: i64, quarter: i64) -> bool {
        self.hizb == hizb && self.quarter == quarter
    }

    /// Later keys win when styles compete
    pub fn precedence_key(&self) -> (i64, &str) {
        (self.created_at, self.id.as_str())
    }

    pub fn matches(&self, filter: &AnnotationFilter) -> bool {
        filter.annotation_type.map_or(true, |t| t == self.annotation_type)
            && filter.hizb.map_or(true, |h| h == self.hizb)
            && filter.quarter.map_or(true, |q| q == self.quarter)
            && filter
                .group_id
                .as_deref()
                .map_or(true, |g| self.group_id.as_deref() == Some(g))
    }

    /// Apply a confirmed patch to the in-memory copy
    pub fn apply(&mut self, patch: &AnnotationPatch) {
        if let Some(t) = patch.annotation_type {
            self.annotation_type = t;
        }
        if let Some(h) = patch.hizb {
            self.hizb = h;
        }
        if let Some(q) = patch.quarter {
            self.quarter = q;
        }
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }
        if let Some(group_id) = &patch.group_id {
            self.group_id = group_id.clone();
        }
        if let Some(excerpt) = &patch.excerpt {
            self.excerpt = excerpt.clone().unwrap_or_default();
        }
    }
}

/// Payload for creating an annotation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnotation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub hizb: i64,
    pub quarter: i64,
    pub start: Boundary,
    pub end: Boundary,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
}

impl NewAnnotation {
    /// The full record once the store has assigned an id and timestamp
    pub fn into_annotation(self, created: Created) -> Annotation {
        Annotation {
            id: created.id,
            annotation_type: self.annotation_type,
            hizb: self.hizb,
            quarter: self.quarter,
            start: self.start,
            end: self.end,
            color: self.color,
            note: self.note,
            group_id: self.group_id,
            excerpt: self.excerpt.unwrap_or_default(),
            created_at: created.created_at,
        }
    }
}

/// Partial update. Nullable fields distinguish "absent" (`None`) from
/// "set to null" (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub annotation_type: Option<AnnotationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hizb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Boundary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Boundary>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<Option<String>>,
}

impl AnnotationPatch {
    pub fn excerpt(excerpt: impl Into<String>) -> Self {
        Self {
            excerpt: Some(Some(excerpt.into())),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.annotation_type.is_none()
            && self.hizb.is_none()
            && self.quarter.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.color.is_none()
            && self.note.is_none()
            && self.group_id.is_none()
            && self.excerpt.is_none()
    }
}

/// A present field, even `null`, deserializes to `Some`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Equality filters for listing annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationFilter {
    #[serde(default, rename = "type")]
    pub annotation_type: Option<AnnotationType>,
    #[serde(default)]
    pub hizb: Option<i64>,
    #[serde(default)]
    pub quarter: Option<i64>,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl AnnotationFilter {
    pub fn unit(hizb: i64, quarter: i64) -> Self {
        Self {
            hizb: Some(hizb),
            quarter: Some(quarter),
            ..Default::default()
        }
    }
}

/// A named color bucket for mutashabih annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: i64,
}

impl Group {
    pub fn apply(&mut self, patch: &GroupPatch) {
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    #[serde(default)]
    pub id: Option<String>,
    pub color: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub label: Option<Option<String>>,
}

impl GroupPatch {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.label.is_none()
    }
}

/// Identity assigned by the store on insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub id: String,
    pub created_at: i64,
}

/// Rows touched by an update or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    pub changes: u64,
}

impl Changes {
    pub fn none() -> Self {
        Self { changes: 0 }
    }

    pub fn applied(&self) -> bool {
        self.changes > 0
    }
}
