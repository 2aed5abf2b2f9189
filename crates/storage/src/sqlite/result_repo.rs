use quiz_core::model::{QuizResult, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_result_row};
use crate::repository::{ResultRepository, ResultRow, StorageError};

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn persist_result(&self, result: &QuizResult) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for row in ResultRow::rows_for(result) {
            sqlx::query(
                r"
                INSERT INTO quiz_results (
                    user_id, category, session_id, correct, total, ended_by, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id, category) DO UPDATE SET
                    session_id = excluded.session_id,
                    correct = excluded.correct,
                    total = excluded.total,
                    ended_by = excluded.ended_by,
                    completed_at = excluded.completed_at
                ",
            )
            .bind(row.user_id.as_str())
            .bind(row.score.category.as_str())
            .bind(row.session_id.as_uuid())
            .bind(i64::from(row.score.correct))
            .bind(i64::from(row.score.total))
            .bind(row.ended_by.as_str())
            .bind(row.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_results(&self, user_id: &UserId) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, category, session_id, correct, total, ended_by, completed_at
            FROM quiz_results
            WHERE user_id = ?1
            ORDER BY category ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
