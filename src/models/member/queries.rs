use sqlx::PgPool;

use super::types::Member;

/// All members, ordered by name.
pub async fn list(pool: &PgPool) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        "SELECT id, name FROM members ORDER BY name ASC, created_at ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, name: &str) -> Result<Member, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        "INSERT INTO members (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await
}

/// Delete a member. Attendance rows go with it via `ON DELETE CASCADE`.
/// Returns false when no member had this id.
pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM members WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
