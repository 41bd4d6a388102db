//! Annotation persistence
//!
//! Notes, mistakes and mutashabih highlights over verse ranges, plus the
//! color groups that mutashabih highlights can belong to.

mod store;
mod types;

pub use store::{MarkStore, MarksRepository, MonotonicClock};
pub use types::{
    Annotation, AnnotationFilter, AnnotationPatch, AnnotationType, Changes, Created, Group,
    GroupPatch, NewAnnotation, NewGroup,
};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Annotation, AnnotationType, NewAnnotation};
    use crate::range::{Boundary, RowId};

    /// An uncolored annotation in hizb 1, quarter 1
    pub fn annotation(
        id: &str,
        annotation_type: AnnotationType,
        start: (RowId, usize),
        end: (RowId, usize),
        created_at: i64,
    ) -> Annotation {
        Annotation {
            id: id.to_string(),
            annotation_type,
            hizb: 1,
            quarter: 1,
            start: Boundary::new(start.0, start.1),
            end: Boundary::new(end.0, end.1),
            color: None,
            note: None,
            group_id: None,
            excerpt: String::new(),
            created_at,
        }
    }

    pub fn colored(
        id: &str,
        annotation_type: AnnotationType,
        start: (RowId, usize),
        end: (RowId, usize),
        created_at: i64,
        color: &str,
    ) -> Annotation {
        Annotation {
            color: Some(color.to_string()),
            ..annotation(id, annotation_type, start, end, created_at)
        }
    }

    /// A create payload for hizb 1, quarter 1
    pub fn new_annotation(
        annotation_type: AnnotationType,
        start: (RowId, usize),
        end: (RowId, usize),
    ) -> NewAnnotation {
        NewAnnotation {
            id: None,
            annotation_type,
            hizb: 1,
            quarter: 1,
            start: Boundary::new(start.0, start.1),
            end: Boundary::new(end.0, end.1),
            color: None,
            note: None,
            group_id: None,
            excerpt: None,
        }
    }
}
