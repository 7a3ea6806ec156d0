use axum::http::{Method, StatusCode};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;

use crate::db::types::{QuizStatus, UserRole};
use crate::test_support;

async fn add_choice_question(
    ctx: &test_support::TestContext,
    token: &str,
    quiz_id: &str,
    prompt: &str,
    position: i32,
) -> String {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/quizzes/{quiz_id}/questions"),
            Some(token),
            Some(json!({
                "kind": "multiple_choice",
                "prompt": prompt,
                "points": 10.0,
                "position": position,
                "options": [
                    { "label": "Correct", "is_correct": true },
                    { "label": "Wrong", "is_correct": false }
                ]
            })),
        ))
        .await
        .expect("add question");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    created["id"].as_str().expect("question id").to_string()
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn drafts_are_invisible_to_students() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof030",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student030",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "PHIL-101", "Logic", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let quiz = test_support::insert_quiz(
        ctx.state.db(),
        &offering.id,
        "Draft quiz",
        Duration::hours(-1),
        Duration::days(1),
        None,
        &professor.id,
        QuizStatus::Draft,
    )
    .await;

    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/offerings/{}/quizzes", offering.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("list quizzes");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quizzes/{}", quiz.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("get draft quiz");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn answer_key_is_hidden_from_students() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof031",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student031",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "PHIL-102", "Ethics", &professor.id).await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let quiz = test_support::insert_quiz(
        ctx.state.db(),
        &offering.id,
        "Open quiz",
        Duration::hours(-1),
        Duration::days(1),
        Some(30),
        &professor.id,
        QuizStatus::Draft,
    )
    .await;

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    add_choice_question(&ctx, &prof_token, &quiz.id, "2 + 2 = ?", 1).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/quizzes/{}/publish", quiz.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("publish quiz");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quizzes/{}", quiz.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("student quiz detail");
    let detail = test_support::read_json(response).await;
    let options = detail["questions"][0]["options"].as_array().expect("options");
    assert!(options.iter().all(|option| option.get("is_correct").is_none()));

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quizzes/{}", quiz.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("staff quiz detail");
    let detail = test_support::read_json(response).await;
    let options = detail["questions"][0]["options"].as_array().expect("options");
    assert!(options.iter().any(|option| option["is_correct"] == true));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn publishing_an_empty_quiz_fails() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof032",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "PHIL-103", "Aesthetics", &professor.id)
            .await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;

    let quiz = test_support::insert_quiz(
        ctx.state.db(),
        &offering.id,
        "Empty quiz",
        Duration::hours(1),
        Duration::days(1),
        None,
        &professor.id,
        QuizStatus::Draft,
    )
    .await;
    let token = test_support::bearer_token(&professor.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/quizzes/{}/publish", quiz.id),
            Some(&token),
            None,
        ))
        .await
        .expect("publish empty quiz");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn question_edits_are_blocked_once_attempted() {
    let ctx = test_support::setup_test_context().await;

    let professor = test_support::insert_user(
        ctx.state.db(),
        "prof033",
        "Professor User",
        "prof-pass",
        UserRole::Professor,
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student033",
        "Student User",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let offering =
        test_support::insert_offering(ctx.state.db(), "PHIL-104", "Epistemology", &professor.id)
            .await;
    test_support::add_staff(ctx.state.db(), &professor.id, &offering.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &offering.id).await;

    let quiz = test_support::insert_quiz(
        ctx.state.db(),
        &offering.id,
        "Guarded quiz",
        Duration::hours(-1),
        Duration::days(1),
        Some(30),
        &professor.id,
        QuizStatus::Draft,
    )
    .await;

    let prof_token = test_support::bearer_token(&professor.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let question_id = add_choice_question(&ctx, &prof_token, &quiz.id, "A or B?", 1).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/quizzes/{}/publish", quiz.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("publish");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/quizzes/{}/attempts", quiz.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("start attempt");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/quizzes/{}/questions/{question_id}", quiz.id),
            Some(&prof_token),
            Some(json!({ "prompt": "B or A?" })),
        ))
        .await
        .expect("edit question");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/quizzes/{}/questions/{question_id}", quiz.id),
            Some(&prof_token),
            None,
        ))
        .await
        .expect("delete question");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/quizzes/{}", quiz.id),
            Some(&prof_token),
            Some(json!({ "duration_minutes": 60 })),
        ))
        .await
        .expect("edit timing");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
