use classhub::TestApp;

mod common;
use common::{classroom_with_teacher, create_classroom, join_classroom};

#[tokio::test]
async fn create_and_fetch_classroom() {
    let app = TestApp::new().await;
    let (_, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;

    let id = classroom["id"].as_i64().unwrap();
    let code = classroom["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert_eq!(classroom["status"], "active");

    let res = app
        .client
        .get(&app.url(&format!("/api/classrooms/{}", id)))
        .await;
    assert_eq!(res.status, 200);
    let data = res.data();
    assert_eq!(data["name"], "Algebra I");
    assert_eq!(data["subject"], "Math");
    assert_eq!(data["teacherName"], "Ms. Rivera");
    assert_eq!(data["students"], 0);
}

#[tokio::test]
async fn fetching_unknown_classroom_is_404() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/api/classrooms/9999")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.error()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn student_joins_with_code() {
    let app = TestApp::new().await;
    let (_, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let code = classroom["code"].as_str().unwrap();

    let (student_token, _) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;

    let res = join_classroom(&app, &student_token, code).await;
    assert_eq!(res.status, 201, "join failed: {}", res.body);
    assert_eq!(res.data()["name"], "Algebra I");

    // The roster now lists the student.
    let id = classroom["id"].as_i64().unwrap();
    let res = app
        .client
        .get(&app.url(&format!("/api/classrooms/{}/students", id)))
        .await;
    assert_eq!(res.status, 200);
    let roster = res.data();
    assert_eq!(roster["teacher"]["name"], "Ms. Rivera");
    assert_eq!(roster["students"].as_array().unwrap().len(), 1);
    assert_eq!(roster["students"][0]["email"], "ada@school.test");
}

#[tokio::test]
async fn joining_twice_is_a_conflict() {
    let app = TestApp::new().await;
    let (_, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let code = classroom["code"].as_str().unwrap();

    let (student_token, _) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;

    let first = join_classroom(&app, &student_token, code).await;
    assert_eq!(first.status, 201);

    let second = join_classroom(&app, &student_token, code).await;
    assert_eq!(second.status, 409);
    assert_eq!(second.error()["code"], "CONFLICT");
}

#[tokio::test]
async fn joining_with_unknown_code_is_404() {
    let app = TestApp::new().await;
    let (token, _) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;

    let res = join_classroom(&app, &token, "NOPE99").await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn archive_toggles_status_for_the_owner() {
    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let id = classroom["id"].as_i64().unwrap();

    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/classrooms/{}/archive", id)),
            &teacher_token,
            "{}",
        )
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["status"], "archived");

    // Toggling again reactivates.
    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/classrooms/{}/archive", id)),
            &teacher_token,
            "{}",
        )
        .await;
    assert_eq!(res.data()["status"], "active");
}

#[tokio::test]
async fn other_teachers_cannot_archive() {
    let app = TestApp::new().await;
    let (_, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let id = classroom["id"].as_i64().unwrap();

    let (other_token, _) = app
        .register_user("Mr. Chen", "chen@school.test", "password123", "teacher")
        .await;

    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/classrooms/{}/archive", id)),
            &other_token,
            "{}",
        )
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn unenrolled_students_cannot_archive() {
    let app = TestApp::new().await;
    let (_, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let id = classroom["id"].as_i64().unwrap();

    let (student_token, _) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;

    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/classrooms/{}/archive", id)),
            &student_token,
            "{}",
        )
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn announcements_round_trip() {
    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let id = classroom["id"].as_i64().unwrap();

    let body = serde_json::json!({ "title": "Quiz Friday", "content": "Chapters 1-3" });
    let res = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/classrooms/{}/announcements", id)),
            &teacher_token,
            &body.to_string(),
        )
        .await;
    assert_eq!(res.status, 201, "announcement failed: {}", res.body);

    let res = app
        .client
        .get(&app.url(&format!("/api/classrooms/{}/announcements", id)))
        .await;
    assert_eq!(res.status, 200);
    let list = res.data();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Quiz Friday");
    assert_eq!(list[0]["author"]["name"], "Ms. Rivera");
}

#[tokio::test]
async fn teacher_and_enrolled_listings() {
    let app = TestApp::new().await;
    let (teacher_token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    create_classroom(&app, &teacher_token, "Algebra II", "Math").await;

    let (student_token, student) = app
        .register_user("Ada", "ada@school.test", "password123", "student")
        .await;
    join_classroom(&app, &student_token, classroom["code"].as_str().unwrap()).await;

    let teacher_id = classroom["teacherId"].as_i64().unwrap();
    let res = app
        .client
        .get(&app.url(&format!("/api/classrooms/teacher/{}", teacher_id)))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data().as_array().unwrap().len(), 2);

    let student_id = student["id"].as_i64().unwrap();
    let res = app
        .client
        .get(&app.url(&format!("/api/classrooms/enrolled/{}", student_id)))
        .await;
    assert_eq!(res.status, 200);
    let enrolled = res.data();
    assert_eq!(enrolled.as_array().unwrap().len(), 1);
    assert_eq!(enrolled[0]["name"], "Algebra I");
    assert_eq!(enrolled[0]["teacherName"], "Ms. Rivera");
    assert_eq!(enrolled[0]["students"], 1);
}
