use sqlx::PgPool;

use super::types::{AttendanceRecord, AttendanceRow, AttendanceState};

const ATTENDANCE_COLUMNS: &str = "id, event_id, member_id, is_present, justification";

pub async fn list_by_event(pool: &PgPool, event_id: &str) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE event_id = $1 ORDER BY created_at ASC"
    );
    let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(event_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(AttendanceRecord::from).collect())
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance ORDER BY created_at ASC");
    let rows = sqlx::query_as::<_, AttendanceRow>(&sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(AttendanceRecord::from).collect())
}

/// Create or update the row for `(event_id, member_id)`.
pub async fn upsert(
    pool: &PgPool,
    event_id: &str,
    member_id: &str,
    state: &AttendanceState,
) -> Result<AttendanceRecord, sqlx::Error> {
    let sql = format!(
        "INSERT INTO attendance (event_id, member_id, is_present, justification) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (event_id, member_id) DO UPDATE SET \
             is_present = EXCLUDED.is_present, \
             justification = EXCLUDED.justification, \
             updated_at = now() \
         RETURNING {ATTENDANCE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(event_id)
        .bind(member_id)
        .bind(state.is_present())
        .bind(state.justification())
        .fetch_one(pool)
        .await?;
    Ok(row.into())
}

/// Flip presence in a single statement. A new row starts present; an existing
/// row flips `is_present` and always drops its justification.
pub async fn toggle(pool: &PgPool, event_id: &str, member_id: &str) -> Result<AttendanceRecord, sqlx::Error> {
    let sql = format!(
        "INSERT INTO attendance (event_id, member_id, is_present, justification) \
         VALUES ($1, $2, TRUE, NULL) \
         ON CONFLICT (event_id, member_id) DO UPDATE SET \
             is_present = NOT attendance.is_present, \
             justification = NULL, \
             updated_at = now() \
         RETURNING {ATTENDANCE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(event_id)
        .bind(member_id)
        .fetch_one(pool)
        .await?;
    Ok(row.into())
}
