//! Reading session
//!
//! Holds one open reading unit together with the global annotation working
//! set and the groups. The in-memory state only ever reflects what the
//! marks store has confirmed: creates, deletes, recolors and excerpt
//! backfills are applied after the store call succeeds, never before.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::marks::{
    Annotation, AnnotationFilter, AnnotationPatch, AnnotationType, Changes, Group, GroupPatch,
    MarkStore, NewAnnotation, NewGroup,
};
use crate::range::{
    render_unit, truncate_chars, Boundary, ReadingUnit, RenderedRow, TextAnchor, TextRange,
    UnitLayout, EXCERPT_CHARS, PREVIEW_CHARS,
};
use crate::verses::{UnitId, VerseStore};

/// Shown for groups known only through their members when no member has a color
pub const FALLBACK_GROUP_COLOR: &str = "#fde68a";

/// A live selection before it is committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub range: TextRange,
    pub preview: String,
}

/// How a new mutashabih annotation joins a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum MutashabihGroup {
    /// Join an existing group and take its color
    Existing { id: String },
    /// Create a group with this color first
    New { color: String },
}

/// A request to annotate a range of the open unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRequest {
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub start: Boundary,
    pub end: Boundary,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub group: Option<MutashabihGroup>,
}

/// One row of the group picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// First non-empty member excerpt
    pub sample: String,
    pub count: usize,
}

pub struct ReadingSession<S, V> {
    marks: S,
    verses: V,
    timeout: Duration,
    unit: ReadingUnit,
    layout: UnitLayout,
    annotations: Vec<Annotation>,
    groups: Vec<Group>,
    rendered: Vec<RenderedRow>,
}

/// Bound a store call by `timeout`
async fn bounded<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(timeout.as_millis() as u64)),
    }
}

impl<S: MarkStore, V: VerseStore> ReadingSession<S, V> {
    /// Load a unit's rows, then annotations and groups, then backfill
    /// missing excerpts for the unit.
    ///
    /// Annotations and groups load independently: if one fetch fails the
    /// other still populates.
    pub async fn open(marks: S, verses: V, timeout: Duration, unit_id: UnitId) -> Result<Self> {
        let mut session = Self {
            marks,
            verses,
            timeout,
            unit: ReadingUnit::new(unit_id.hizb, unit_id.quarter, Vec::new()),
            layout: UnitLayout::default(),
            annotations: Vec::new(),
            groups: Vec::new(),
            rendered: Vec::new(),
        };

        session.load_rows(unit_id).await?;
        session.load_marks().await;
        session.backfill_excerpts().await;
        session.rerender();

        tracing::debug!(
            hizb = unit_id.hizb,
            quarter = unit_id.quarter,
            rows = session.unit.rows().len(),
            annotations = session.annotations.len(),
            groups = session.groups.len(),
            "reading session opened"
        );
        Ok(session)
    }

    /// Switch to another unit, keeping the loaded annotations and groups
    pub async fn go_to(&mut self, unit_id: UnitId) -> Result<()> {
        self.load_rows(unit_id).await?;
        self.backfill_excerpts().await;
        self.rerender();
        Ok(())
    }

    async fn load_rows(&mut self, unit_id: UnitId) -> Result<()> {
        let rows = bounded(
            self.timeout,
            self.verses.get_rows(unit_id.hizb, unit_id.quarter),
        )
        .await?;
        self.unit = ReadingUnit::new(unit_id.hizb, unit_id.quarter, rows);
        self.layout = UnitLayout::new(&self.unit);
        Ok(())
    }

    async fn load_marks(&mut self) {
        let filter = AnnotationFilter::default();
        let (annotations, groups) = tokio::join!(
            bounded(self.timeout, self.marks.list_annotations(&filter)),
            bounded(self.timeout, self.marks.list_groups()),
        );

        match annotations {
            Ok(annotations) => self.annotations = annotations,
            Err(e) => tracing::warn!(error = %e, "failed to load annotations"),
        }
        match groups {
            Ok(groups) => self.groups = groups,
            Err(e) => tracing::warn!(error = %e, "failed to load groups"),
        }
    }

    /// Compute and persist excerpts for the unit's annotations that lack
    /// one. Returns how many were filled; failures are logged and skipped.
    pub async fn backfill_excerpts(&mut self) -> usize {
        let (hizb, quarter) = (self.unit.hizb, self.unit.quarter);
        let pending: Vec<(usize, String)> = self
            .annotations
            .iter()
            .enumerate()
            .filter(|(_, a)| a.belongs_to(hizb, quarter) && a.excerpt.is_empty())
            .filter_map(|(i, a)| {
                let text = truncate_chars(&self.unit.extract_text(&a.range()), EXCERPT_CHARS);
                (!text.is_empty()).then_some((i, text))
            })
            .collect();

        let mut filled = 0;
        for (i, excerpt) in pending {
            let id = self.annotations[i].id.clone();
            let patch = AnnotationPatch::excerpt(excerpt.clone());
            match bounded(self.timeout, self.marks.update_annotation(&id, &patch)).await {
                Ok(changes) if changes.applied() => {
                    self.annotations[i].excerpt = excerpt;
                    filled += 1;
                }
                Ok(_) => tracing::warn!(annotation = %id, "excerpt backfill matched no record"),
                Err(e) => tracing::warn!(annotation = %id, error = %e, "excerpt backfill failed"),
            }
        }
        filled
    }

    /// Resolve two raw endpoints into an ordered range with a preview.
    /// `None` when either endpoint lies outside the unit's rows or the
    /// range is empty.
    pub fn select(&self, anchor: &TextAnchor, focus: &TextAnchor) -> Option<Selection> {
        let a = self.layout.resolve_anchor(anchor, &self.rendered)?;
        let b = self.layout.resolve_anchor(focus, &self.rendered)?;
        let range = self.unit.normalize(a, b).ok()?;
        let preview = truncate_chars(&self.unit.extract_text(&range), PREVIEW_CHARS);
        Some(Selection { range, preview })
    }

    /// Validate, persist, and only then add an annotation to the working set
    pub async fn create_annotation(&mut self, request: AnnotationRequest) -> Result<Annotation> {
        let range = self.unit.validate(TextRange {
            start: request.start,
            end: request.end,
        })?;

        let mut color = request.color;
        let mut group_id = None;
        if request.annotation_type == AnnotationType::Mutashabih {
            match request.group {
                Some(MutashabihGroup::Existing { id }) => {
                    if let Some(group) = self.groups.iter().find(|g| g.id == id) {
                        color = Some(group.color.clone());
                    }
                    group_id = Some(id);
                }
                Some(MutashabihGroup::New { color: group_color }) => {
                    let payload = NewGroup {
                        id: None,
                        color: group_color.clone(),
                        label: None,
                    };
                    match bounded(self.timeout, self.marks.create_group(&payload)).await {
                        Ok(created) => {
                            self.groups.push(Group {
                                id: created.id.clone(),
                                color: group_color.clone(),
                                label: None,
                                created_at: created.created_at,
                            });
                            group_id = Some(created.id);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "group creation failed, annotation stays ungrouped")
                        }
                    }
                    color = Some(group_color);
                }
                None => {}
            }
        }

        let excerpt = truncate_chars(&self.unit.extract_text(&range), EXCERPT_CHARS);
        let payload = NewAnnotation {
            id: None,
            annotation_type: request.annotation_type,
            hizb: self.unit.hizb,
            quarter: self.unit.quarter,
            start: range.start,
            end: range.end,
            color,
            note: request.note,
            group_id,
            excerpt: Some(excerpt),
        };

        let created = bounded(self.timeout, self.marks.create_annotation(&payload)).await?;
        let annotation = payload.into_annotation(created);
        self.annotations.push(annotation.clone());
        self.rerender();

        Ok(annotation)
    }

    /// Remove an annotation once the store confirms the delete
    pub async fn delete_annotation(&mut self, id: &str) -> Result<Changes> {
        let changes = bounded(self.timeout, self.marks.delete_annotation(id)).await?;
        self.annotations.retain(|a| a.id != id);
        self.rerender();
        Ok(changes)
    }

    pub async fn update_group(&mut self, id: &str, patch: &GroupPatch) -> Result<Changes> {
        let changes = bounded(self.timeout, self.marks.update_group(id, patch)).await?;
        if let Some(group) = self.groups.iter_mut().find(|g| g.id == id) {
            group.apply(patch);
        }
        Ok(changes)
    }

    /// Members keep their `group_id` and color
    pub async fn delete_group(&mut self, id: &str) -> Result<Changes> {
        let changes = bounded(self.timeout, self.marks.delete_group(id)).await?;
        self.groups.retain(|g| g.id != id);
        Ok(changes)
    }

    /// Recolor a group's members in the store, then reload the working set
    /// and re-render the open unit.
    pub async fn apply_group_color(&mut self, group_id: &str) -> Result<Changes> {
        let changes = bounded(self.timeout, self.marks.apply_group_color(group_id)).await?;

        let filter = AnnotationFilter::default();
        match bounded(self.timeout, self.marks.list_annotations(&filter)).await {
            Ok(annotations) => self.annotations = annotations,
            Err(e) => tracing::warn!(error = %e, "failed to reload annotations after recolor"),
        }
        self.rerender();

        Ok(changes)
    }

    /// Every known group plus any group referenced only by its members
    pub fn group_summaries(&self) -> Vec<GroupSummary> {
        let mut summaries: Vec<GroupSummary> = self
            .groups
            .iter()
            .map(|g| GroupSummary {
                id: g.id.clone(),
                color: g.color.clone(),
                label: g.label.clone(),
                sample: String::new(),
                count: 0,
            })
            .collect();
        let mut index: HashMap<String, usize> = summaries
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        for annotation in &self.annotations {
            if annotation.annotation_type != AnnotationType::Mutashabih {
                continue;
            }
            let Some(group_id) = annotation.group_id.as_deref() else {
                continue;
            };
            match index.get(group_id) {
                Some(&i) => {
                    let summary = &mut summaries[i];
                    summary.count += 1;
                    if summary.sample.is_empty() {
                        summary.sample = annotation.excerpt.clone();
                    }
                }
                None => {
                    index.insert(group_id.to_string(), summaries.len());
                    summaries.push(GroupSummary {
                        id: group_id.to_string(),
                        color: annotation
                            .color
                            .clone()
                            .unwrap_or_else(|| FALLBACK_GROUP_COLOR.to_string()),
                        label: None,
                        sample: annotation.excerpt.clone(),
                        count: 1,
                    });
                }
            }
        }
        summaries
    }

    pub fn unit(&self) -> &ReadingUnit {
        &self.unit
    }

    pub fn unit_id(&self) -> UnitId {
        UnitId {
            hizb: self.unit.hizb,
            quarter: self.unit.quarter,
        }
    }

    pub fn render(&self) -> &[RenderedRow] {
        &self.rendered
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Working-set annotations matching `filter`, oldest first
    pub fn annotations(&self, filter: &AnnotationFilter) -> Vec<&Annotation> {
        let mut matched: Vec<&Annotation> =
            self.annotations.iter().filter(|a| a.matches(filter)).collect();
        matched.sort_by(|a, b| a.precedence_key().cmp(&b.precedence_key()));
        matched
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    fn rerender(&mut self) {
        self.rendered = render_unit(&self.unit, &self.annotations);
    }
}
