use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::types::NotificationKind;
use crate::repositories;

/// Best-effort delivery. Grading must never fail because a notification
/// row could not be written, so errors end up in the log only.
pub(crate) async fn notify(pool: &PgPool, user_id: &str, kind: NotificationKind, message: &str) {
    let now = primitive_now_utc();
    if let Err(err) = repositories::notifications::create(pool, user_id, kind, message, now).await {
        tracing::warn!(error = %err, user_id, "failed to record notification");
    }
}

pub(crate) fn grade_posted_message(source_title: &str, grade_value: &str) -> String {
    format!("Your work on \"{source_title}\" was graded: {grade_value}")
}

pub(crate) fn feedback_added_message(source_title: &str) -> String {
    format!("New feedback on your submission for \"{source_title}\"")
}
