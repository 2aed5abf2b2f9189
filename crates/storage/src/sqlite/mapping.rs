use quiz_core::model::{
    Category, CategoryScore, EndReason, Question, QuestionId, SessionId, UserId,
};
use sqlx::Row;
use uuid::Uuid;

use crate::repository::{QuestionRecord, ResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization("question_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let options = vec![
        row.try_get::<String, _>("option_0").map_err(ser)?,
        row.try_get::<String, _>("option_1").map_err(ser)?,
        row.try_get::<String, _>("option_2").map_err(ser)?,
        row.try_get::<String, _>("option_3").map_err(ser)?,
    ];
    let answer: i64 = row.try_get("answer").map_err(ser)?;
    let answer = usize::try_from(answer)
        .map_err(|_| StorageError::Serialization(format!("invalid answer: {answer}")))?;
    let category = Category::new(row.try_get::<String, _>("category").map_err(ser)?).map_err(ser)?;

    Question::new(
        row.try_get::<String, _>("question").map_err(ser)?,
        options,
        answer,
        category,
    )
    .map_err(ser)
}

pub(crate) fn map_question_record(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuestionRecord, StorageError> {
    Ok(QuestionRecord {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question: map_question_row(row)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<ResultRow, StorageError> {
    let user_raw: String = row.try_get("user_id").map_err(ser)?;
    let user_id = UserId::new(&user_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid user_id: {user_raw:?}")))?;
    let session_id = SessionId::from_uuid(row.try_get::<Uuid, _>("session_id").map_err(ser)?);
    let category = Category::new(row.try_get::<String, _>("category").map_err(ser)?).map_err(ser)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let ended_by = EndReason::parse(&row.try_get::<String, _>("ended_by").map_err(ser)?).map_err(ser)?;

    Ok(ResultRow {
        user_id,
        session_id,
        score: CategoryScore {
            category,
            correct,
            total,
        },
        ended_by,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}
