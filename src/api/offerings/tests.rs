use axum::http::{Method, StatusCode};
use serde_json::json;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

fn offering_payload() -> serde_json::Value {
    let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("nanoseconds");
    let session_start = (now - Duration::days(7)).format(&Rfc3339).unwrap();
    let session_end = (now + Duration::days(90)).format(&Rfc3339).unwrap();

    json!({
        "course_code": "CHEM-101",
        "title": "General Chemistry",
        "session_start": session_start,
        "session_end": session_end
    })
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn admin_can_create_offering_and_build_roster() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_user(
        ctx.state.db(),
        "admin001",
        "Admin User",
        "admin-pass",
        UserRole::Admin,
    )
    .await;
    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof001",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student001",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/offerings",
            Some(&token),
            Some(offering_payload()),
        ))
        .await
        .expect("create offering");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let offering_id = created["id"].as_str().expect("offering id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/offerings/{offering_id}/staff"),
            Some(&token),
            Some(json!({ "user_id": professor.id })),
        ))
        .await
        .expect("assign staff");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/offerings/{offering_id}/enrollments"),
            Some(&token),
            Some(json!({ "student_id": student.id })),
        ))
        .await
        .expect("enroll student");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/offerings/{offering_id}/roster"),
            Some(&token),
            None,
        ))
        .await
        .expect("roster");

    let status = response.status();
    let roster = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {roster}");
    assert_eq!(roster["staff"].as_array().unwrap().len(), 1);
    assert_eq!(roster["students"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn staff_cannot_create_offerings() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof002",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let token = test_support::bearer_token(&professor.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/offerings",
            Some(&token),
            Some(offering_payload()),
        ))
        .await
        .expect("create offering");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn staff_cannot_be_enrolled_as_students() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_user(
        ctx.state.db(),
        "admin002",
        "Admin User",
        "admin-pass",
        UserRole::Admin,
    )
    .await;
    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof003",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "PHYS-201", "Mechanics", &admin.id).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/offerings/{}/enrollments", offering.id),
            Some(&token),
            Some(json!({ "student_id": professor.id })),
        ))
        .await
        .expect("enroll professor");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn dropped_student_loses_offering_access() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_user(
        ctx.state.db(),
        "admin003",
        "Admin User",
        "admin-pass",
        UserRole::Admin,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student002",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "MATH-101", "Calculus I", &admin.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

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
        .expect("list assignments while active");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/offerings/{}/enrollments/{}", offering.id, student.id),
            Some(&admin_token),
            Some(json!({ "status": "dropped" })),
        ))
        .await
        .expect("drop student");
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
        .expect("list assignments after drop");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
