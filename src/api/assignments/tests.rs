use axum::http::{Method, StatusCode};
use serde_json::json;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::db::types::{AssignmentStatus, UserRole};
use crate::test_support;

fn assignment_payload(due_in: Duration) -> serde_json::Value {
    let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("nanoseconds");
    let due_date = (now + due_in).format(&Rfc3339).unwrap();

    json!({
        "title": "Problem set 1",
        "description": "First five exercises",
        "due_date": due_date,
        "max_points": 100.0
    })
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn students_see_only_published_assignments() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof010",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student010",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "CS-101", "Intro to CS", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/offerings/{}/assignments", offering.id),
            Some(&prof_token),
            Some(assignment_payload(Duration::days(7))),
        ))
        .await
        .expect("create assignment");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["status"], "draft");
    let assignment_id = created["id"].as_str().expect("assignment id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/offerings/{}/assignments", offering.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("list as student");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/assignments/{assignment_id}"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("get draft as student");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/assignments/{assignment_id}/publish"),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("publish");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/offerings/{}/assignments", offering.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("list after publish");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn due_date_is_frozen_once_submissions_exist() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof011",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student011",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "CS-102", "Data Structures", &professor.id)
            .await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Essay",
        Duration::days(3),
        50.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;
    test_support::insert_text_submission(ctx.state.db(), &assignment.id, &student.id, "my essay")
        .await;

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());

    let new_due = (OffsetDateTime::now_utc() + Duration::days(10)).format(&Rfc3339).unwrap();
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/assignments/{}", assignment.id),
            Some(&prof_token),
            Some(json!({ "due_date": new_due })),
        ))
        .await
        .expect("move due date");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Non-deadline fields stay editable.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/assignments/{}", assignment.id),
            Some(&prof_token),
            Some(json!({ "description": "Updated brief" })),
        ))
        .await
        .expect("edit description");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/assignments/{}", assignment.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("delete with submissions");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn publish_is_idempotent() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof012",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "CS-103", "Algorithms", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Homework",
        Duration::days(5),
        20.0,
        &professor.id,
        AssignmentStatus::Draft,
    )
    .await;
    let token = test_support::bearer_token(&professor.id, ctx.state.settings());

    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/assignments/{}/publish", assignment.id),
                Some(&token),
                None,
            ))
            .await
            .expect("publish");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["status"], "published");
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn due_date_before_session_start_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof014",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "CS-301", "Compilers", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;

    // The session has not started yet.
    sqlx::query(
        "UPDATE course_offerings
         SET session_start = session_start + INTERVAL '60 days'
         WHERE id = $1",
    )
    .bind(&offering.id)
    .execute(ctx.state.db())
    .await
    .expect("shift session start");

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/offerings/{}/assignments", offering.id),
            Some(&prof_token),
            Some(assignment_payload(Duration::days(7))),
        ))
        .await
        .expect("create assignment");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A due date after the session opens is fine.
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/offerings/{}/assignments", offering.id),
            Some(&prof_token),
            Some(assignment_payload(Duration::days(45))),
        ))
        .await
        .expect("create assignment");
    assert_eq!(response.status(), StatusCode::CREATED);
}
