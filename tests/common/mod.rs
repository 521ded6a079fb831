#![allow(dead_code)]

use classhub::{TestApp, TestResponse};
use serde_json::Value;

/// Register a teacher, create a classroom, and return (token, classroom data).
pub async fn classroom_with_teacher(app: &TestApp, email: &str) -> (String, Value) {
    let (token, _) = app
        .register_user("Ms. Rivera", email, "password123", "teacher")
        .await;
    let classroom = create_classroom(app, &token, "Algebra I", "Math").await;
    (token, classroom)
}

pub async fn create_classroom(app: &TestApp, token: &str, name: &str, subject: &str) -> Value {
    let body = serde_json::json!({ "name": name, "subject": subject });
    let res = app
        .client
        .post_with_auth(&app.url("/api/classrooms"), token, &body.to_string())
        .await;
    assert_eq!(res.status, 201, "classroom creation failed: {}", res.body);
    res.data()
}

pub async fn join_classroom(app: &TestApp, token: &str, code: &str) -> TestResponse {
    let body = serde_json::json!({ "code": code });
    app.client
        .post_with_auth(&app.url("/api/classrooms/join"), token, &body.to_string())
        .await
}

/// Create an assignment due at the given RFC 3339 instant, without a file.
pub async fn create_assignment(
    app: &TestApp,
    token: &str,
    classroom_id: i64,
    title: &str,
    due_date: &str,
) -> Value {
    let form = reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("description", "See handout".to_string())
        .text("dueDate", due_date.to_string())
        .text("classroomId", classroom_id.to_string());

    let res = app
        .client
        .post_multipart_with_auth(&app.url("/api/assignments"), token, form)
        .await;
    assert_eq!(res.status, 201, "assignment creation failed: {}", res.body);
    res.data()
}

/// Submit a small PDF for an assignment on behalf of a student.
pub async fn submit_pdf(app: &TestApp, assignment_id: i64, user_id: i64) -> TestResponse {
    let part = reqwest::multipart::Part::bytes(b"%PDF-1.4 test".to_vec())
        .file_name("homework.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("userId", user_id.to_string())
        .part("file", part);

    app.client
        .post_multipart(
            &app.url(&format!("/api/assignments/{}/submissions", assignment_id)),
            form,
        )
        .await
}

/// RFC 3339 timestamp offset from now by the given number of hours.
pub fn due_in_hours(hours: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::hours(hours)).to_rfc3339()
}
