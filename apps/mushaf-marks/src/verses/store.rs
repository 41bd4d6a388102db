//! Verse repository

use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;

use super::{VerseRow, QUARTERS_PER_HIZB};
use crate::error::Result;

/// Read access to verse text
#[async_trait]
pub trait VerseStore: Send + Sync {
    /// Rows of one unit in `id` order; empty if the unit has none
    async fn get_rows(&self, hizb: i64, quarter: i64) -> Result<Vec<VerseRow>>;
}

/// Opening text of one quarter, for the quarter picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterPreview {
    pub quarter: i64,
    pub preview: String,
}

#[derive(Debug, Clone)]
pub struct VerseRepository {
    pool: SqlitePool,
}

impl VerseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All four quarters of a hizb, each with its rows joined by spaces
    pub async fn quarter_previews(&self, hizb: i64) -> Result<Vec<QuarterPreview>> {
        let mut previews = Vec::with_capacity(QUARTERS_PER_HIZB as usize);
        for quarter in 1..=QUARTERS_PER_HIZB {
            let rows = self.get_rows(hizb, quarter).await?;
            let preview = rows
                .iter()
                .map(|r| r.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            previews.push(QuarterPreview { quarter, preview });
        }
        Ok(previews)
    }
}

#[async_trait]
impl VerseStore for VerseRepository {
    async fn get_rows(&self, hizb: i64, quarter: i64) -> Result<Vec<VerseRow>> {
        let rows = sqlx::query_as::<_, VerseRow>(
            r#"
            SELECT id, sura_no, aya_no, aya_text AS text
            FROM warshquran
            WHERE hizb = ? AND quarter = ?
            ORDER BY id
            "#,
        )
        .bind(hizb)
        .bind(quarter)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(hizb, quarter, count = rows.len(), "verse rows loaded");
        Ok(rows)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::seed_verses;
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn test_get_rows_orders_by_id() {
        let pool = memory_pool().await.unwrap();
        seed_verses(
            &pool,
            &[(3, 1, 1, "ثالث"), (1, 1, 1, "أول"), (2, 1, 1, "ثان"), (4, 1, 2, "آخر")],
        )
        .await;

        let repo = VerseRepository::new(pool);
        let rows = repo.get_rows(1, 1).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(rows[0].text, "أول");

        assert!(repo.get_rows(2, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quarter_previews() {
        let pool = memory_pool().await.unwrap();
        seed_verses(&pool, &[(1, 5, 1, "a"), (2, 5, 1, "b"), (3, 5, 3, "c")]).await;

        let repo = VerseRepository::new(pool);
        let previews = repo.quarter_previews(5).await.unwrap();
        assert_eq!(previews.len(), 4);
        assert_eq!(previews[0].preview, "a b");
        assert_eq!(previews[1].preview, "");
        assert_eq!(previews[2].preview, "c");
    }
}
