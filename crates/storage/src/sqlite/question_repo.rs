use chrono::{DateTime, Utc};
use quiz_core::model::{Category, Question, QuestionId};

use super::SqliteRepository;
use super::mapping::{conn, map_question_record, map_question_row, question_id_from_i64, question_id_to_i64, ser};
use crate::repository::{QuestionRecord, QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(
        &self,
        question: &Question,
        created_at: DateTime<Utc>,
    ) -> Result<QuestionId, StorageError> {
        let [o0, o1, o2, o3] = question.options();
        let answer = i64::try_from(question.correct_option())
            .map_err(|_| StorageError::Serialization("answer overflow".into()))?;

        let res = sqlx::query(
            r"
            INSERT INTO questions (
                question, option_0, option_1, option_2, option_3,
                answer, category, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(question.text())
        .bind(o0.as_str())
        .bind(o1.as_str())
        .bind(o2.as_str())
        .bind(o3.as_str())
        .bind(answer)
        .bind(question.category().as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        question_id_from_i64(res.last_insert_rowid())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(question_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, question, option_0, option_1, option_2, option_3,
                answer, category, created_at
            FROM questions
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_record(&row)?);
        }
        Ok(out)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT category, MIN(id) AS first_id
            FROM questions
            GROUP BY category
            ORDER BY first_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = sqlx::Row::try_get(&row, "category").map_err(ser)?;
            out.push(Category::new(raw).map_err(ser)?);
        }
        Ok(out)
    }

    async fn fetch_questions(&self, category: &Category) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, question, option_0, option_1, option_2, option_3,
                answer, category, created_at
            FROM questions
            WHERE category = ?1
            ORDER BY id ASC
            ",
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }
}
