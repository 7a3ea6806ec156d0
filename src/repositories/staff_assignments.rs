use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::StaffAssignment;

const COLUMNS: &str = "id, user_id, offering_id, created_at";

pub(crate) async fn upsert(
    pool: &PgPool,
    user_id: &str,
    offering_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<StaffAssignment, sqlx::Error> {
    sqlx::query_as::<_, StaffAssignment>(&format!(
        "INSERT INTO staff_assignments (id, user_id, offering_id, created_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT (user_id, offering_id) DO UPDATE SET user_id = EXCLUDED.user_id
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(offering_id)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn exists(
    pool: &PgPool,
    user_id: &str,
    offering_id: &str,
) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, String>(
        "SELECT id FROM staff_assignments WHERE user_id = $1 AND offering_id = $2",
    )
    .bind(user_id)
    .bind(offering_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

pub(crate) async fn remove(
    pool: &PgPool,
    user_id: &str,
    offering_id: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM staff_assignments WHERE user_id = $1 AND offering_id = $2")
            .bind(user_id)
            .bind(offering_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_for_offering(
    pool: &PgPool,
    offering_id: &str,
) -> Result<Vec<StaffAssignment>, sqlx::Error> {
    sqlx::query_as::<_, StaffAssignment>(&format!(
        "SELECT {COLUMNS} FROM staff_assignments WHERE offering_id = $1 ORDER BY created_at"
    ))
    .bind(offering_id)
    .fetch_all(pool)
    .await
}
