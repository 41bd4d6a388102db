//! SQLite storage for annotations and groups
//!
//! Provides the persistence operations the reader consumes. Every call is
//! a single statement; no transaction spans two calls.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{
    Annotation, AnnotationFilter, AnnotationPatch, AnnotationType, Changes, Created, Group,
    GroupPatch, NewAnnotation, NewGroup,
};
use crate::error::{AppError, Result};
use crate::range::Boundary;

/// Persistence operations over annotation and group records
#[async_trait]
pub trait MarkStore: Send + Sync {
    async fn create_annotation(&self, payload: &NewAnnotation) -> Result<Created>;

    /// Ordered by creation time, oldest first
    async fn list_annotations(&self, filter: &AnnotationFilter) -> Result<Vec<Annotation>>;

    async fn get_annotation(&self, id: &str) -> Result<Option<Annotation>>;

    async fn update_annotation(&self, id: &str, patch: &AnnotationPatch) -> Result<Changes>;

    async fn delete_annotation(&self, id: &str) -> Result<Changes>;

    async fn create_group(&self, payload: &NewGroup) -> Result<Created>;

    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn update_group(&self, id: &str, patch: &GroupPatch) -> Result<Changes>;

    /// Member annotations keep their `group_id`
    async fn delete_group(&self, id: &str) -> Result<Changes>;

    /// Copy the group's current color onto every mutashabih member
    async fn apply_group_color(&self, group_id: &str) -> Result<Changes>;
}

/// Creation timestamps in epoch milliseconds, strictly increasing within
/// the process so ordering by `created_at` is stable.
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    last: Arc<AtomicI64>,
}

impl MonotonicClock {
    pub fn now_millis(&self) -> i64 {
        let wall = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Repository for the marks database
#[derive(Debug, Clone)]
pub struct MarksRepository {
    pool: SqlitePool,
    clock: MonotonicClock,
}

const ANNOTATION_COLUMNS: &str = r#"
    id, type, hizb, quarter,
    start_row_id, start_offset, end_row_id, end_offset,
    color, note, group_id, excerpt, created_at
"#;

impl MarksRepository {
    /// Create a new repository
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            clock: MonotonicClock::default(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the marks tables
    ///
    /// `group_id` is a plain column, not a foreign key: deleting a group
    /// leaves its former members pointing at it.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS annotation_groups (
                id TEXT PRIMARY KEY,
                color TEXT NOT NULL,
                label TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS annotations (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL CHECK(type IN ('note', 'mistake', 'mutashabih')),
                hizb INTEGER NOT NULL,
                quarter INTEGER NOT NULL,
                start_row_id INTEGER NOT NULL,
                start_offset INTEGER NOT NULL,
                end_row_id INTEGER NOT NULL,
                end_offset INTEGER NOT NULL,
                color TEXT,
                note TEXT,
                group_id TEXT,
                excerpt TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_annotations_hizb_quarter ON annotations(hizb, quarter);
            CREATE INDEX IF NOT EXISTS idx_annotations_type ON annotations(type);
            CREATE INDEX IF NOT EXISTS idx_annotations_group ON annotations(group_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_group(&self, id: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, GroupRow>(
            "SELECT id, color, label, created_at FROM annotation_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group.map(GroupRow::into_group))
    }
}

#[async_trait]
impl MarkStore for MarksRepository {
    async fn create_annotation(&self, payload: &NewAnnotation) -> Result<Created> {
        let id = payload
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let start_offset = offset_column(&payload.start)?;
        let end_offset = offset_column(&payload.end)?;
        let created_at = self.clock.now_millis();

        sqlx::query(&format!(
            "INSERT INTO annotations ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ANNOTATION_COLUMNS
        ))
        .bind(&id)
        .bind(payload.annotation_type.as_str())
        .bind(payload.hizb)
        .bind(payload.quarter)
        .bind(payload.start.row_id)
        .bind(start_offset)
        .bind(payload.end.row_id)
        .bind(end_offset)
        .bind(&payload.color)
        .bind(&payload.note)
        .bind(&payload.group_id)
        .bind(&payload.excerpt)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(%id, kind = %payload.annotation_type, "annotation created");
        Ok(Created { id, created_at })
    }

    async fn list_annotations(&self, filter: &AnnotationFilter) -> Result<Vec<Annotation>> {
        let mut sql = format!("SELECT {} FROM annotations WHERE 1=1", ANNOTATION_COLUMNS);

        if filter.annotation_type.is_some() {
            sql.push_str(" AND type = ?");
        }
        if filter.hizb.is_some() {
            sql.push_str(" AND hizb = ?");
        }
        if filter.quarter.is_some() {
            sql.push_str(" AND quarter = ?");
        }
        if filter.group_id.is_some() {
            sql.push_str(" AND group_id = ?");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut q = sqlx::query_as::<_, AnnotationRow>(&sql);
        if let Some(t) = filter.annotation_type {
            q = q.bind(t.as_str());
        }
        if let Some(h) = filter.hizb {
            q = q.bind(h);
        }
        if let Some(quarter) = filter.quarter {
            q = q.bind(quarter);
        }
        if let Some(ref group_id) = filter.group_id {
            q = q.bind(group_id);
        }

        let rows = q.fetch_all(&self.pool).await?;
        let annotations = rows
            .into_iter()
            .filter_map(|row| match row.into_annotation() {
                Ok(annotation) => Some(annotation),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable annotation row");
                    None
                }
            })
            .collect();
        Ok(annotations)
    }

    async fn get_annotation(&self, id: &str) -> Result<Option<Annotation>> {
        let row = sqlx::query_as::<_, AnnotationRow>(&format!(
            "SELECT {} FROM annotations WHERE id = ?",
            ANNOTATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AnnotationRow::into_annotation).transpose()
    }

    async fn update_annotation(&self, id: &str, patch: &AnnotationPatch) -> Result<Changes> {
        if patch.is_empty() {
            return Ok(Changes::none());
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut binds: Vec<BindValue> = Vec::new();

        if let Some(t) = patch.annotation_type {
            sets.push("type = ?");
            binds.push(BindValue::Text(Some(t.as_str().to_string())));
        }
        if let Some(h) = patch.hizb {
            sets.push("hizb = ?");
            binds.push(BindValue::Int(h));
        }
        if let Some(q) = patch.quarter {
            sets.push("quarter = ?");
            binds.push(BindValue::Int(q));
        }
        if let Some(start) = patch.start {
            sets.push("start_row_id = ?");
            sets.push("start_offset = ?");
            binds.push(BindValue::Int(start.row_id));
            binds.push(BindValue::Int(offset_column(&start)?));
        }
        if let Some(end) = patch.end {
            sets.push("end_row_id = ?");
            sets.push("end_offset = ?");
            binds.push(BindValue::Int(end.row_id));
            binds.push(BindValue::Int(offset_column(&end)?));
        }
        for (column, value) in [
            ("color = ?", &patch.color),
            ("note = ?", &patch.note),
            ("group_id = ?", &patch.group_id),
            ("excerpt = ?", &patch.excerpt),
        ] {
            if let Some(value) = value {
                sets.push(column);
                binds.push(BindValue::Text(value.clone()));
            }
        }

        let sql = format!("UPDATE annotations SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);
        for value in binds {
            q = value.bind_to(q);
        }
        let result = q.bind(id).execute(&self.pool).await?;

        Ok(Changes {
            changes: result.rows_affected(),
        })
    }

    async fn delete_annotation(&self, id: &str) -> Result<Changes> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Changes {
            changes: result.rows_affected(),
        })
    }

    async fn create_group(&self, payload: &NewGroup) -> Result<Created> {
        let id = payload
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = self.clock.now_millis();

        sqlx::query(
            "INSERT INTO annotation_groups (id, color, label, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&payload.color)
        .bind(&payload.label)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Created { id, created_at })
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT id, color, label, created_at FROM annotation_groups ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GroupRow::into_group).collect())
    }

    async fn update_group(&self, id: &str, patch: &GroupPatch) -> Result<Changes> {
        if patch.is_empty() {
            return Ok(Changes::none());
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut binds: Vec<BindValue> = Vec::new();
        if let Some(ref color) = patch.color {
            sets.push("color = ?");
            binds.push(BindValue::Text(Some(color.clone())));
        }
        if let Some(ref label) = patch.label {
            sets.push("label = ?");
            binds.push(BindValue::Text(label.clone()));
        }

        let sql = format!("UPDATE annotation_groups SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);
        for value in binds {
            q = value.bind_to(q);
        }
        let result = q.bind(id).execute(&self.pool).await?;

        Ok(Changes {
            changes: result.rows_affected(),
        })
    }

    async fn delete_group(&self, id: &str) -> Result<Changes> {
        let result = sqlx::query("DELETE FROM annotation_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Changes {
            changes: result.rows_affected(),
        })
    }

    async fn apply_group_color(&self, group_id: &str) -> Result<Changes> {
        let group = self
            .get_group(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {}", group_id)))?;

        let result = sqlx::query(
            "UPDATE annotations SET color = ? WHERE group_id = ? AND type = 'mutashabih'",
        )
        .bind(&group.color)
        .bind(group_id)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            group = %group_id,
            color = %group.color,
            changed = result.rows_affected(),
            "group color applied"
        );
        Ok(Changes {
            changes: result.rows_affected(),
        })
    }
}

/// Offsets are stored as SQLite integers, so they must fit in an `i64`
fn offset_column(boundary: &Boundary) -> Result<i64> {
    i64::try_from(boundary.offset).map_err(|_| {
        AppError::BadRequest(format!(
            "Offset {} in row {} is out of range",
            boundary.offset, boundary.row_id
        ))
    })
}

/// Heterogeneous values for dynamically built updates
enum BindValue {
    Int(i64),
    Text(Option<String>),
}

impl BindValue {
    fn bind_to<'q>(
        self,
        q: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            BindValue::Int(v) => q.bind(v),
            BindValue::Text(v) => q.bind(v),
        }
    }
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct AnnotationRow {
    id: String,
    #[sqlx(rename = "type")]
    annotation_type: String,
    hizb: i64,
    quarter: i64,
    start_row_id: i64,
    start_offset: i64,
    end_row_id: i64,
    end_offset: i64,
    color: Option<String>,
    note: Option<String>,
    group_id: Option<String>,
    excerpt: Option<String>,
    created_at: i64,
}

impl AnnotationRow {
    fn into_annotation(self) -> Result<Annotation> {
        let annotation_type: AnnotationType =
            self.annotation_type.parse().map_err(AppError::Internal)?;
        let offset = |v: i64| {
            usize::try_from(v)
                .map_err(|_| AppError::Internal(format!("negative offset in annotation {}", self.id)))
        };

        Ok(Annotation {
            start: Boundary::new(self.start_row_id, offset(self.start_offset)?),
            end: Boundary::new(self.end_row_id, offset(self.end_offset)?),
            id: self.id.clone(),
            annotation_type,
            hizb: self.hizb,
            quarter: self.quarter,
            color: self.color,
            note: self.note,
            group_id: self.group_id,
            excerpt: self.excerpt.unwrap_or_default(),
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: String,
    color: String,
    label: Option<String>,
    created_at: i64,
}

impl GroupRow {
    fn into_group(self) -> Group {
        Group {
            id: self.id,
            color: self.color,
            label: self.label,
            created_at: self.created_at,
        }
    }
}
