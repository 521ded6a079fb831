use classhub::TestApp;

mod common;
use common::classroom_with_teacher;

async fn create_link_material(
    app: &TestApp,
    token: &str,
    classroom_id: i64,
    title: &str,
) -> serde_json::Value {
    let form = reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("type", "link")
        .text("url", "https://example.com/syllabus")
        .text("classroomId", classroom_id.to_string());

    let res = app
        .client
        .post_multipart_with_auth(&app.url("/api/materials"), token, form)
        .await;
    assert_eq!(res.status, 201, "material creation failed: {}", res.body);
    res.data()
}

#[tokio::test]
async fn link_materials_round_trip() {
    let app = TestApp::new().await;
    let (token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();

    let created = create_link_material(&app, &token, classroom_id, "Syllabus").await;
    assert_eq!(created["type"], "link");

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/materials?classroomId={}", classroom_id)),
            &token,
        )
        .await;
    assert_eq!(res.status, 200);
    let list = res.data();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Syllabus");
    assert_eq!(list[0]["url"], "https://example.com/syllabus");
}

#[tokio::test]
async fn listing_requires_classroom_id() {
    let app = TestApp::new().await;
    let (token, _) = classroom_with_teacher(&app, "rivera@school.test").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/materials"), &token)
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn link_material_requires_a_url() {
    let app = TestApp::new().await;
    let (token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;

    let form = reqwest::multipart::Form::new()
        .text("title", "Broken link")
        .text("type", "link")
        .text("classroomId", classroom["id"].as_i64().unwrap().to_string());

    let res = app
        .client
        .post_multipart_with_auth(&app.url("/api/materials"), &token, form)
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn file_material_uploads_and_downloads() {
    let app = TestApp::new().await;
    let (token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();

    let part = reqwest::multipart::Part::bytes(b"%PDF-1.4 lecture notes".to_vec())
        .file_name("notes.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("title", "Lecture notes")
        .text("type", "file")
        .text("classroomId", classroom_id.to_string())
        .part("file", part);

    let res = app
        .client
        .post_multipart_with_auth(&app.url("/api/materials"), &token, form)
        .await;
    assert_eq!(res.status, 201, "upload failed: {}", res.body);
    let material_id = res.data()["id"].as_i64().unwrap();

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/materials/{}/download", material_id)),
            &token,
        )
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-type"), Some("application/pdf"));
    assert_eq!(res.bytes, b"%PDF-1.4 lecture notes");
}

#[tokio::test]
async fn file_material_requires_an_upload() {
    let app = TestApp::new().await;
    let (token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;

    let form = reqwest::multipart::Form::new()
        .text("title", "Empty")
        .text("type", "file")
        .text("classroomId", classroom["id"].as_i64().unwrap().to_string());

    let res = app
        .client
        .post_multipart_with_auth(&app.url("/api/materials"), &token, form)
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn delete_removes_the_material() {
    let app = TestApp::new().await;
    let (token, classroom) = classroom_with_teacher(&app, "rivera@school.test").await;
    let classroom_id = classroom["id"].as_i64().unwrap();

    let created = create_link_material(&app, &token, classroom_id, "Old syllabus").await;
    let material_id = created["id"].as_i64().unwrap();

    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/materials/{}", material_id)), &token)
        .await;
    assert_eq!(res.status, 204);

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/materials?classroomId={}", classroom_id)),
            &token,
        )
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);

    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/materials/{}", material_id)), &token)
        .await;
    assert_eq!(res.status, 404);
}
