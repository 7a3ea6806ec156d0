use sqlx::PgPool;

use crate::db::models::Assignment;
use crate::db::types::AssignmentStatus;

const COLUMNS: &str = "\
    id, offering_id, title, description, due_date, max_points, status, \
    created_by, created_at, updated_at";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) offering_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) due_date: time::PrimitiveDateTime,
    pub(crate) max_points: f64,
    pub(crate) status: AssignmentStatus,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, offering_id, title, description, due_date, max_points, status,
            created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.offering_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.due_date)
    .bind(params.max_points)
    .bind(params.status)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(assignment_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_offering(
    pool: &PgPool,
    offering_id: &str,
    only_published: bool,
) -> Result<Vec<Assignment>, sqlx::Error> {
    if only_published {
        sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {COLUMNS} FROM assignments
             WHERE offering_id = $1 AND status = $2
             ORDER BY due_date, created_at"
        ))
        .bind(offering_id)
        .bind(AssignmentStatus::Published)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {COLUMNS} FROM assignments WHERE offering_id = $1 ORDER BY due_date, created_at"
        ))
        .bind(offering_id)
        .fetch_all(pool)
        .await
    }
}

pub(crate) struct UpdateAssignment {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) due_date: Option<time::PrimitiveDateTime>,
    pub(crate) max_points: Option<f64>,
    pub(crate) status: Option<AssignmentStatus>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    assignment_id: &str,
    params: UpdateAssignment,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            due_date = COALESCE($3, due_date),
            max_points = COALESCE($4, max_points),
            status = COALESCE($5, status),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.due_date)
    .bind(params.max_points)
    .bind(params.status)
    .bind(params.updated_at)
    .bind(assignment_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, assignment_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
        .bind(assignment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
