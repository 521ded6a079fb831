use classhub::TestApp;

mod common;
use common::{classroom_with_teacher, create_assignment, due_in_hours, submit_pdf};

async fn setup_assignment(app: &TestApp, due_hours: i64) -> (i64, i64) {
    let (teacher_token, classroom) = classroom_with_teacher(app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();
    let assignment = create_assignment(
        app,
        &teacher_token,
        classroom_id,
        "Problem Set 1",
        &due_in_hours(due_hours),
    )
    .await;

    let (_, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;

    (assignment["id"].as_i64().unwrap(), student["id"].as_i64().unwrap())
}

#[tokio::test]
async fn on_time_submission_is_submitted() {
    let app = TestApp::new().await;
    let (assignment_id, student_id) = setup_assignment(&app, 24).await;

    let res = submit_pdf(&app, assignment_id, student_id).await;
    assert_eq!(res.status, 201, "submission failed: {}", res.body);
    let data = res.data();
    assert_eq!(data["status"], "SUBMITTED");
    assert_eq!(data["message"], "Assignment submitted successfully");
}

#[tokio::test]
async fn past_due_submission_is_late() {
    let app = TestApp::new().await;
    let (assignment_id, student_id) = setup_assignment(&app, -24).await;

    let res = submit_pdf(&app, assignment_id, student_id).await;
    assert_eq!(res.status, 201);
    let data = res.data();
    assert_eq!(data["status"], "LATE");
    assert_eq!(
        data["message"],
        "Assignment submitted successfully (late submission)"
    );
}

#[tokio::test]
async fn duplicate_submission_conflicts_with_existing_id() {
    let app = TestApp::new().await;
    let (assignment_id, student_id) = setup_assignment(&app, 24).await;

    let first = submit_pdf(&app, assignment_id, student_id).await;
    assert_eq!(first.status, 201);
    let first_id = first.data()["id"].as_i64().unwrap();

    let second = submit_pdf(&app, assignment_id, student_id).await;
    assert_eq!(second.status, 409);
    let error = second.error();
    assert_eq!(error["code"], "CONFLICT");
    assert_eq!(error["submissionId"].as_i64().unwrap(), first_id);
}

#[tokio::test]
async fn submitting_to_unknown_assignment_is_404() {
    let app = TestApp::new().await;
    let (_, student_id) = setup_assignment(&app, 24).await;

    let res = submit_pdf(&app, 9999, student_id).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn submission_without_a_file_is_rejected() {
    let app = TestApp::new().await;
    let (assignment_id, student_id) = setup_assignment(&app, 24).await;

    let form = reqwest::multipart::Form::new().text("userId", student_id.to_string());
    let res = app
        .client
        .post_multipart(
            &app.url(&format!("/api/assignments/{}/submissions", assignment_id)),
            form,
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn disallowed_mimetype_is_rejected() {
    let app = TestApp::new().await;
    let (assignment_id, student_id) = setup_assignment(&app, 24).await;

    let part = reqwest::multipart::Part::bytes(b"<html></html>".to_vec())
        .file_name("homework.html")
        .mime_str("text/html")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("userId", student_id.to_string())
        .part("file", part);

    let res = app
        .client
        .post_multipart(
            &app.url(&format!("/api/assignments/{}/submissions", assignment_id)),
            form,
        )
        .await;
    assert_eq!(res.status, 400);
    assert!(res.body.contains("Unsupported file type"), "{}", res.body);
}

#[tokio::test]
async fn submissions_list_includes_user_and_file_info() {
    let app = TestApp::new().await;
    let (assignment_id, student_id) = setup_assignment(&app, 24).await;
    submit_pdf(&app, assignment_id, student_id).await;

    let res = app
        .client
        .get(&app.url(&format!("/api/assignments/{}/submissions", assignment_id)))
        .await;
    assert_eq!(res.status, 200);
    let data = res.data();
    assert_eq!(data["total"], 1);
    let sub = &data["submissions"][0];
    assert_eq!(sub["user"]["email"], "ada@school.test");
    assert_eq!(sub["fileInfo"]["name"], "homework.pdf");
    assert_eq!(sub["fileInfo"]["type"], "application/pdf");
    // Raw file bytes never appear in list payloads.
    assert!(sub.get("fileData").is_none() && sub.get("file_data").is_none());
}

#[tokio::test]
async fn submission_file_downloads_with_headers() {
    let app = TestApp::new().await;
    let (assignment_id, student_id) = setup_assignment(&app, 24).await;
    let submission_id = submit_pdf(&app, assignment_id, student_id)
        .await
        .data()["id"]
        .as_i64()
        .unwrap();

    let res = app
        .client
        .get(&app.url(&format!(
            "/api/assignments/{}/file/download",
            submission_id
        )))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-type"), Some("application/pdf"));
    assert_eq!(
        res.header("content-disposition"),
        Some("attachment; filename=\"homework.pdf\"")
    );
    assert_eq!(res.bytes, b"%PDF-1.4 test");
}

#[tokio::test]
async fn assignment_without_file_has_no_download() {
    let app = TestApp::new().await;
    let (assignment_id, _) = setup_assignment(&app, 24).await;

    let res = app
        .client
        .get(&app.url(&format!("/api/assignments/{}/file", assignment_id)))
        .await;
    assert_eq!(res.status, 404);
}
