use classhub::TestApp;

mod common;
use common::{classroom_with_teacher, create_assignment, due_in_hours, join_classroom, submit_pdf};

async fn feed(app: &TestApp, user_id: i64) -> serde_json::Value {
    let res = app
        .client
        .get(&app.url(&format!("/api/notifications?userId={}", user_id)))
        .await;
    assert_eq!(res.status, 200, "feed failed: {}", res.body);
    res.json()
}

async fn post_announcement(app: &TestApp, token: &str, classroom_id: i64, title: &str) {
    let body = serde_json::json!({ "title": title, "content": "Details inside" });
    let res = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/classrooms/{}/announcements", classroom_id)),
            token,
            &body.to_string(),
        )
        .await;
    assert_eq!(res.status, 201);
}

#[tokio::test]
async fn user_without_enrollments_has_an_empty_feed() {
    let app = TestApp::new().await;
    let (_, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;

    let json = feed(&app, student["id"].as_i64().unwrap()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 0);
    assert_eq!(json["unreadCount"], 0);
    assert_eq!(json["notifications"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn missing_user_id_is_rejected() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/api/notifications")).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn feed_is_scoped_to_enrolled_classrooms() {
    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();

    // A second classroom the student never joins.
    let other = common::create_classroom(&app, &teacher_token, "Chemistry", "Science").await;
    let other_id = other["id"].as_i64().unwrap();

    let (student_token, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;
    join_classroom(&app, &student_token, classroom["code"].as_str().unwrap()).await;
    let student_id = student["id"].as_i64().unwrap();

    post_announcement(&app, &teacher_token, classroom_id, "Quiz Friday").await;
    post_announcement(&app, &teacher_token, other_id, "Lab safety").await;
    create_assignment(
        &app,
        &teacher_token,
        classroom_id,
        "Problem Set 1",
        &due_in_hours(48),
    )
    .await;

    let json = feed(&app, student_id).await;
    let notifications = json["notifications"].as_array().unwrap();
    assert_eq!(json["count"], 2);
    assert_eq!(json["count"], json["unreadCount"]);

    let titles: Vec<&str> = notifications
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Quiz Friday"));
    assert!(titles.contains(&"Problem Set 1"));
    assert!(!titles.contains(&"Lab safety"));

    for n in notifications {
        assert_eq!(n["course"], "Algebra I");
        assert_eq!(n["isNew"], true);
    }
}

#[tokio::test]
async fn grading_produces_a_grade_notification() {
    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();
    let assignment = create_assignment(
        &app,
        &teacher_token,
        classroom_id,
        "Essay",
        &due_in_hours(24),
    )
    .await;
    let assignment_id = assignment["id"].as_i64().unwrap();

    let (student_token, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;
    join_classroom(&app, &student_token, classroom["code"].as_str().unwrap()).await;
    let student_id = student["id"].as_i64().unwrap();

    let submission_id = submit_pdf(&app, assignment_id, student_id)
        .await
        .data()["id"]
        .as_i64()
        .unwrap();

    app.client
        .put_with_auth(
            &app.url(&format!("/api/assignments/{}/grade", submission_id)),
            &teacher_token,
            &serde_json::json!({ "score": 85, "feedback": "Solid" }).to_string(),
        )
        .await;

    let json = feed(&app, student_id).await;
    let grade_entry = json["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["type"] == "grade")
        .expect("grade notification missing");
    assert_eq!(grade_entry["score"], 85);
    assert_eq!(grade_entry["feedback"], "Solid");
    assert_eq!(grade_entry["assignment"], "Essay");
    assert_eq!(grade_entry["course"], "Algebra I");
}

#[tokio::test]
async fn grade_notifications_outlive_the_recency_window() {
    use chrono::{Duration, Utc};
    use classhub::models::submission;
    use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};

    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();
    let assignment = create_assignment(
        &app,
        &teacher_token,
        classroom_id,
        "Essay",
        &due_in_hours(24),
    )
    .await;
    let assignment_id = assignment["id"].as_i64().unwrap();

    let (student_token, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;
    join_classroom(&app, &student_token, classroom["code"].as_str().unwrap()).await;
    let student_id = student["id"].as_i64().unwrap();

    let submission_id = submit_pdf(&app, assignment_id, student_id)
        .await
        .data()["id"]
        .as_i64()
        .unwrap();
    app.client
        .put_with_auth(
            &app.url(&format!("/api/assignments/{}/grade", submission_id)),
            &teacher_token,
            &serde_json::json!({ "score": 85 }).to_string(),
        )
        .await;

    // Age the grade well past the window that expires announcements.
    let sub = submission::Entity::find_by_id(submission_id as i32)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let mut aged = sub.into_active_model();
    aged.graded_at = Set(Some(Utc::now().naive_utc() - Duration::days(10)));
    aged.update(&app.db).await.unwrap();

    let json = feed(&app, student_id).await;
    let grade_entry = json["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["type"] == "grade")
        .expect("grade notification should stay until dismissed");
    assert_eq!(grade_entry["score"], 85);
}

#[tokio::test]
async fn dismissal_is_permanent_and_idempotent() {
    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();

    let (student_token, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;
    join_classroom(&app, &student_token, classroom["code"].as_str().unwrap()).await;
    let student_id = student["id"].as_i64().unwrap();

    post_announcement(&app, &teacher_token, classroom_id, "Quiz Friday").await;
    post_announcement(&app, &teacher_token, classroom_id, "Field trip").await;

    let json = feed(&app, student_id).await;
    assert_eq!(json["count"], 2);
    let dismiss_id = json["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["title"] == "Quiz Friday")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let body = serde_json::json!({ "notificationIds": [dismiss_id], "type": "announcement" });
    let res = app
        .client
        .post(
            &app.url(&format!("/api/notifications/read?userId={}", student_id)),
            &body.to_string(),
        )
        .await;
    assert_eq!(res.status, 200, "dismissal failed: {}", res.body);

    let json = feed(&app, student_id).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["notifications"][0]["title"], "Field trip");

    // Dismissing the same id again is a no-op, not an error.
    let res = app
        .client
        .post(
            &app.url(&format!("/api/notifications/read?userId={}", student_id)),
            &body.to_string(),
        )
        .await;
    assert_eq!(res.status, 200);

    let json = feed(&app, student_id).await;
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn mark_read_requires_ids_and_type() {
    let app = TestApp::new().await;
    let (_, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;
    let student_id = student["id"].as_i64().unwrap();

    // Missing userId
    let body = serde_json::json!({ "notificationIds": [1], "type": "announcement" });
    let res = app
        .client
        .post(&app.url("/api/notifications/read"), &body.to_string())
        .await;
    assert_eq!(res.status, 400);

    // Empty id list
    let body = serde_json::json!({ "notificationIds": [], "type": "announcement" });
    let res = app
        .client
        .post(
            &app.url(&format!("/api/notifications/read?userId={}", student_id)),
            &body.to_string(),
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn long_announcement_content_is_truncated_in_the_feed() {
    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();

    let (student_token, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;
    join_classroom(&app, &student_token, classroom["code"].as_str().unwrap()).await;

    let long_content = "x".repeat(300);
    let body = serde_json::json!({ "title": "Syllabus update", "content": long_content });
    app.client
        .post_with_auth(
            &app.url(&format!("/api/classrooms/{}/announcements", classroom_id)),
            &teacher_token,
            &body.to_string(),
        )
        .await;

    let json = feed(&app, student["id"].as_i64().unwrap()).await;
    let content = json["notifications"][0]["content"].as_str().unwrap();
    assert_eq!(content.chars().count(), 103);
    assert!(content.ends_with("..."));
}
