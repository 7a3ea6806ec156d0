use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;

use crate::db::types::{AssignmentStatus, UserRole};
use crate::test_support;

fn text_submit_request(assignment_id: &str, token: &str, text: &str) -> Request<Body> {
    let boundary = "campus-lms-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"text\"\r\n\r\n\
         {text}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/assignments/{assignment_id}/submissions"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .expect("multipart request")
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn resubmission_replaces_the_previous_one() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof020",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student020",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "ENG-101", "Composition", &professor.id)
            .await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Essay",
        Duration::days(3),
        100.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;

    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());
    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(text_submit_request(&assignment.id, &student_token, "first draft"))
        .await
        .expect("first submit");
    let status = response.status();
    let first = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {first}");

    let response = ctx
        .app
        .clone()
        .oneshot(text_submit_request(&assignment.id, &student_token, "final draft"))
        .await
        .expect("second submit");
    let status = response.status();
    let second = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {second}");
    assert_eq!(first["id"], second["id"], "resubmission must reuse the row");
    assert_eq!(second["text_content"], "final draft");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/assignments/{}/submissions", assignment.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("list submissions");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn late_submission_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof021",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student021",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "ENG-102", "Rhetoric", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Late essay",
        Duration::hours(-1),
        100.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;

    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(text_submit_request(&assignment.id, &student_token, "too late"))
        .await
        .expect("late submit");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn grading_writes_grade_record_and_notifies() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof022",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student022",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "HIST-101", "World History", &professor.id)
            .await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Essay",
        Duration::days(3),
        100.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;
    let submission = test_support::insert_text_submission(
        ctx.state.db(),
        &assignment.id,
        &student.id,
        "my essay",
    )
    .await;

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    // Grade twice; the second pass must update the same grade record.
    for (value, score) in [("B+", 87.0), ("A-", 91.0)] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/submissions/{}/grade", submission.id),
                Some(&prof_token),
                Some(json!({
                    "grade_value": value,
                    "numeric_score": score,
                    "feedback": "solid work"
                })),
            ))
            .await
            .expect("grade submission");
        let status = response.status();
        let graded = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {graded}");
        assert_eq!(graded["status"], "graded");
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/offerings/{}/grades/me", offering.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("my grades");
    let grades = test_support::read_json(response).await;
    let items = grades["items"].as_array().expect("items");
    assert_eq!(items.len(), 1, "regrade must not duplicate the record");
    assert_eq!(items[0]["grade_value"], "A-");
    assert_eq!(items[0]["numeric_score"], 91.0);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/notifications",
            Some(&student_token),
            None,
        ))
        .await
        .expect("notifications");
    let notifications = test_support::read_json(response).await;
    assert!(notifications["unread"].as_i64().unwrap() >= 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn classmates_cannot_read_each_others_submissions() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof023",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let author = test_support::insert_user(
        ctx.state.db(),
        "student023",
        "Author Student",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let peer = test_support::insert_user(
        ctx.state.db(),
        "student024",
        "Peer Student",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "BIO-101", "Biology", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &author.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &peer.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Lab report",
        Duration::days(3),
        50.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;
    let submission =
        test_support::insert_text_submission(ctx.state.db(), &assignment.id, &author.id, "report")
            .await;

    let peer_token = test_support::bearer_token(&peer.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/submissions/{}", submission.id),
            Some(&peer_token),
            None,
        ))
        .await
        .expect("peer read");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn graded_submission_rejects_resubmission() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof025",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student025",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "PHIL-101", "Logic", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Proof",
        Duration::days(3),
        100.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;
    let submission = test_support::insert_text_submission(
        ctx.state.db(),
        &assignment.id,
        &student.id,
        "my proof",
    )
    .await;

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/submissions/{}/grade", submission.id),
            Some(&prof_token),
            Some(json!({"grade_value": "B", "numeric_score": 84.0})),
        ))
        .await
        .expect("grade submission");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(text_submit_request(&assignment.id, &student_token, "do-over"))
        .await
        .expect("resubmit after grading");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The graded row must survive untouched.
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/submissions/{}", submission.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("read submission");
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "graded");
    assert_eq!(body["grade_value"], "B");
    assert_eq!(body["text_content"], "my proof");
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn students_cannot_delete_graded_work() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof026",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student026",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "PHIL-102", "Ethics", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Essay",
        Duration::days(3),
        100.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;
    let submission = test_support::insert_text_submission(
        ctx.state.db(),
        &assignment.id,
        &student.id,
        "my essay",
    )
    .await;

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/submissions/{}/grade", submission.id),
            Some(&prof_token),
            Some(json!({"grade_value": "A", "numeric_score": 95.0})),
        ))
        .await
        .expect("grade submission");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/submissions/{}", submission.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("student delete");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Staff may still remove it.
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/submissions/{}", submission.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("staff delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn outsiders_cannot_submit() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof027",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let outsider = test_support::insert_user(
        ctx.state.db(),
        "student027",
        "Outsider Student",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "CHEM-101", "Chemistry", &professor.id)
            .await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Lab report",
        Duration::days(3),
        50.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;

    let outsider_token = test_support::bearer_token(&outsider.id, ctx.state.settings());
    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(text_submit_request(&assignment.id, &outsider_token, "sneaky"))
        .await
        .expect("outsider submit");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // No row may ever have been written.
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/assignments/{}/submissions", assignment.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("list submissions");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn staff_of_another_offering_cannot_grade() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof028",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let other_professor = test_support::insert_user(
        ctx.state.db(),
        "prof029",
        "Other Professor",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student028",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "MATH-201", "Algebra", &professor.id).await;
    let other_offering =
        test_support::insert_offering(ctx.state.db(), "MATH-202", "Analysis", &other_professor.id)
            .await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::add_staff(ctx.state.db(), &other_professor.id, &other_offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let assignment = test_support::insert_assignment(
        ctx.state.db(),
        &offering.id,
        "Problem set",
        Duration::days(3),
        100.0,
        &professor.id,
        AssignmentStatus::Published,
    )
    .await;
    let submission = test_support::insert_text_submission(
        ctx.state.db(),
        &assignment.id,
        &student.id,
        "solutions",
    )
    .await;

    let other_token = test_support::bearer_token(&other_professor.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/submissions/{}/grade", submission.id),
            Some(&other_token),
            Some(json!({"grade_value": "F", "numeric_score": 0.0})),
        ))
        .await
        .expect("cross-offering grade");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
