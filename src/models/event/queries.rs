use chrono::NaiveDate;
use sqlx::PgPool;

use super::types::{Event, EventPatch, NewEvent};

const EVENT_COLUMNS: &str = "id, title, date, description";

/// All events, ordered by date ascending (creation order within a day).
pub async fn list(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY date ASC, created_at ASC");
    sqlx::query_as::<_, Event>(&sql).fetch_all(pool).await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Event>, sqlx::Error> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
    sqlx::query_as::<_, Event>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// The first event held on `date`. Dates are not unique; the earliest created wins.
pub async fn find_by_date(pool: &PgPool, date: NaiveDate) -> Result<Option<Event>, sqlx::Error> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE date = $1 ORDER BY created_at ASC LIMIT 1"
    );
    sqlx::query_as::<_, Event>(&sql)
        .bind(date)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, new: &NewEvent) -> Result<Event, sqlx::Error> {
    let sql = format!(
        "INSERT INTO events (title, date, description) VALUES ($1, $2, $3) RETURNING {EVENT_COLUMNS}"
    );
    sqlx::query_as::<_, Event>(&sql)
        .bind(&new.title)
        .bind(new.date)
        .bind(&new.description)
        .fetch_one(pool)
        .await
}

/// Apply a partial update. Attendance rows reference the event by id, so a
/// date change leaves them attached. Returns `None` when the id is unknown.
pub async fn update(pool: &PgPool, id: &str, patch: &EventPatch) -> Result<Option<Event>, sqlx::Error> {
    let sql = format!(
        "UPDATE events SET \
             title = COALESCE($2::text, title), \
             date = COALESCE($3::date, date), \
             description = CASE WHEN $4::boolean THEN $5::text ELSE description END, \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING {EVENT_COLUMNS}"
    );
    let (set_description, description) = match &patch.description {
        Some(value) => (true, value.clone()),
        None => (false, None),
    };
    sqlx::query_as::<_, Event>(&sql)
        .bind(id)
        .bind(&patch.title)
        .bind(patch.date)
        .bind(set_description)
        .bind(description)
        .fetch_optional(pool)
        .await
}

/// Delete an event and, by cascade, its attendance rows.
pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
