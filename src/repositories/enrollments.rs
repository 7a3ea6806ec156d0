use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;

const COLUMNS: &str = "id, student_id, offering_id, status, created_at, updated_at";

/// Inserts or revives the (student, offering) row. Re-enrolling a dropped
/// student flips the status back to the requested one.
pub(crate) async fn upsert(
    pool: &PgPool,
    student_id: &str,
    offering_id: &str,
    status: EnrollmentStatus,
    now: time::PrimitiveDateTime,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (id, student_id, offering_id, status, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         ON CONFLICT (student_id, offering_id)
         DO UPDATE SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(student_id)
    .bind(offering_id)
    .bind(status)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find(
    pool: &PgPool,
    student_id: &str,
    offering_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 AND offering_id = $2"
    ))
    .bind(student_id)
    .bind(offering_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_status(
    pool: &PgPool,
    student_id: &str,
    offering_id: &str,
    status: EnrollmentStatus,
    now: time::PrimitiveDateTime,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments SET status = $1, updated_at = $2
         WHERE student_id = $3 AND offering_id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(now)
    .bind(student_id)
    .bind(offering_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_offering(
    pool: &PgPool,
    offering_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE offering_id = $1 ORDER BY created_at"
    ))
    .bind(offering_id)
    .fetch_all(pool)
    .await
}
