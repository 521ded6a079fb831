use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{AuthUser, Json};
use crate::models::classroom::{self, ClassroomResponse, Entity as Classroom};
use crate::models::user::{self, Entity as User, Role};
use crate::models::{announcement, assignment, enrollment};
use crate::response::ApiResponse;

use super::AppState;

// ── Request / Response types ──

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassroomRequest {
    pub name: String,
    pub subject: String,
    /// Join code; generated when omitted.
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinClassroomRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub date_posted: NaiveDateTime,
    pub classroom_id: i32,
    pub user_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<user::UserResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    pub teacher: user::UserResponse,
    pub students: Vec<user::UserResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingAssignment {
    pub title: String,
    pub due_date: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineAssignment {
    pub classroom_name: String,
    pub assignment_title: String,
    pub due_date: NaiveDateTime,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classrooms).post(create_classroom))
        .route("/join", post(join_classroom))
        .route("/teacher/{id}", get(classrooms_by_teacher))
        .route("/enrolled/{id}", get(enrolled_classrooms))
        .route("/{id}", get(get_classroom))
        .route("/{id}/archive", patch(archive_classroom))
        .route("/{id}/students", get(classroom_roster))
        .route(
            "/{id}/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/{id}/upcoming-assignments", get(upcoming_assignments))
        .route("/{id}/deadline-assignments", get(deadline_assignments))
}

// ── Handlers ──

/// List all classrooms with enrollment counts.
#[utoipa::path(
    get,
    path = "/api/classrooms",
    responses(
        (status = 200, description = "All classrooms", body = ApiResponse<Vec<ClassroomResponse>>)
    ),
    tag = "classrooms"
)]
async fn list_classrooms(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ClassroomResponse>>, AppError> {
    let classrooms = Classroom::find()
        .find_with_related(enrollment::Entity)
        .all(&state.db)
        .await?;

    let response = classrooms
        .into_iter()
        .map(|(c, enrollments)| ClassroomResponse::from_model(c, None, enrollments.len() as u64))
        .collect();

    Ok(ApiResponse::success(response))
}

/// Fetch one classroom with its teacher's name.
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}",
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 200, description = "Classroom detail", body = ApiResponse<ClassroomResponse>),
        (status = 404, description = "Classroom not found")
    ),
    tag = "classrooms"
)]
async fn get_classroom(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<ClassroomResponse>, AppError> {
    let classroom = find_classroom(&state, id).await?;

    let teacher = User::find_by_id(classroom.teacher_id).one(&state.db).await?;
    let students = enrollment::Entity::find()
        .filter(enrollment::Column::ClassroomId.eq(id))
        .all(&state.db)
        .await?
        .len() as u64;

    Ok(ApiResponse::success(ClassroomResponse::from_model(
        classroom,
        teacher.map(|t| t.name),
        students,
    )))
}

/// Create a classroom owned by the authenticated teacher.
#[utoipa::path(
    post,
    path = "/api/classrooms",
    request_body = CreateClassroomRequest,
    responses(
        (status = 201, description = "Classroom created", body = ApiResponse<ClassroomResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "classrooms",
    security(("bearer_auth" = []))
)]
async fn create_classroom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateClassroomRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.trim().is_empty() || payload.subject.trim().is_empty() {
        return Err(AppError::Validation(
            "Name and subject are required".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let code = payload.code.unwrap_or_else(generate_join_code);

    let new_classroom = classroom::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        code: Set(code),
        subject: Set(payload.subject.trim().to_string()),
        description: Set(payload.description),
        teacher_id: Set(user_id),
        status: Set(classroom::STATUS_ACTIVE.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_classroom.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(ApiResponse::success(ClassroomResponse::from_model(
            created, None, 0,
        ))),
    ))
}

/// Enroll the authenticated user via a classroom join code.
#[utoipa::path(
    post,
    path = "/api/classrooms/join",
    request_body = JoinClassroomRequest,
    responses(
        (status = 201, description = "Enrolled", body = ApiResponse<classroom::Model>),
        (status = 404, description = "Unknown join code"),
        (status = 409, description = "Already enrolled")
    ),
    tag = "classrooms",
    security(("bearer_auth" = []))
)]
async fn join_classroom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<JoinClassroomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let classroom = Classroom::find()
        .filter(classroom::Column::Code.eq(&payload.code))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Classroom not found".to_string()))?;

    let new_enrollment = enrollment::ActiveModel {
        classroom_id: Set(classroom.id),
        user_id: Set(user_id),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    // The unique (classroom, user) index catches the duplicate even when
    // two join requests race.
    if let Err(err) = new_enrollment.insert(&state.db).await {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return Err(AppError::Conflict("User is already enrolled".to_string()));
        }
        return Err(err.into());
    }

    Ok((
        StatusCode::CREATED,
        axum::Json(ApiResponse::success(classroom)),
    ))
}

/// Toggle a classroom between active and archived.
#[utoipa::path(
    patch,
    path = "/api/classrooms/{id}/archive",
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 200, description = "Status toggled", body = ApiResponse<classroom::Model>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Classroom not found")
    ),
    tag = "classrooms",
    security(("bearer_auth" = []))
)]
async fn archive_classroom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> Result<ApiResponse<classroom::Model>, AppError> {
    let classroom = find_classroom(&state, id).await?;

    let caller = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    // Teachers may archive their own classrooms; students may archive
    // (hide) classrooms they are enrolled in.
    match caller.role.parse::<Role>() {
        Ok(Role::Teacher) if classroom.teacher_id != user_id => {
            return Err(AppError::Forbidden(
                "Unauthorized to archive this classroom".to_string(),
            ));
        }
        Ok(Role::Student) => {
            let enrolled = enrollment::Entity::find()
                .filter(enrollment::Column::ClassroomId.eq(id))
                .filter(enrollment::Column::UserId.eq(user_id))
                .one(&state.db)
                .await?;
            if enrolled.is_none() {
                return Err(AppError::Forbidden(
                    "Unauthorized to archive this classroom".to_string(),
                ));
            }
        }
        _ => {}
    }

    let next_status = if classroom.status == classroom::STATUS_ACTIVE {
        classroom::STATUS_ARCHIVED
    } else {
        classroom::STATUS_ACTIVE
    };

    let mut active: classroom::ActiveModel = classroom.into();
    active.status = Set(next_status.to_string());
    active.updated_at = Set(Utc::now().naive_utc());
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::success(updated))
}

/// Teacher and enrolled students for a classroom.
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/students",
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 200, description = "Classroom roster", body = ApiResponse<RosterResponse>),
        (status = 404, description = "Classroom not found")
    ),
    tag = "classrooms"
)]
async fn classroom_roster(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<RosterResponse>, AppError> {
    let classroom = find_classroom(&state, id).await?;

    let teacher = User::find_by_id(classroom.teacher_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Classroom teacher missing".to_string()))?;

    let students = enrollment::Entity::find()
        .filter(enrollment::Column::ClassroomId.eq(id))
        .find_also_related(User)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|(_, u)| u.map(user::UserResponse::from))
        .collect();

    Ok(ApiResponse::success(RosterResponse {
        teacher: user::UserResponse::from(teacher),
        students,
    }))
}

/// Announcements posted to a classroom, with their authors.
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/announcements",
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 200, description = "Announcements", body = ApiResponse<Vec<AnnouncementResponse>>)
    ),
    tag = "classrooms"
)]
async fn list_announcements(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<Vec<AnnouncementResponse>>, AppError> {
    let announcements = announcement::Entity::find()
        .filter(announcement::Column::ClassroomId.eq(id))
        .find_also_related(User)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(a, author)| AnnouncementResponse {
            id: a.id,
            title: a.title,
            content: a.content,
            date_posted: a.date_posted,
            classroom_id: a.classroom_id,
            user_id: a.user_id,
            author: author.map(user::UserResponse::from),
        })
        .collect();

    Ok(ApiResponse::success(announcements))
}

/// Post an announcement to a classroom.
#[utoipa::path(
    post,
    path = "/api/classrooms/{id}/announcements",
    params(("id" = i32, Path, description = "Classroom id")),
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement posted", body = ApiResponse<announcement::Model>),
        (status = 404, description = "Classroom not found")
    ),
    tag = "classrooms",
    security(("bearer_auth" = []))
)]
async fn create_announcement(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(AppError::Validation(
            "Title and content are required".to_string(),
        ));
    }
    find_classroom(&state, id).await?;

    let new_announcement = announcement::ActiveModel {
        title: Set(payload.title),
        content: Set(payload.content),
        date_posted: Set(Utc::now().naive_utc()),
        classroom_id: Set(id),
        user_id: Set(user_id),
        ..Default::default()
    };
    let created = new_announcement.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(ApiResponse::success(created)),
    ))
}

/// Classrooms owned by a teacher.
#[utoipa::path(
    get,
    path = "/api/classrooms/teacher/{id}",
    params(("id" = i32, Path, description = "Teacher user id")),
    responses(
        (status = 200, description = "Classrooms owned by the teacher", body = ApiResponse<Vec<classroom::Model>>)
    ),
    tag = "classrooms"
)]
async fn classrooms_by_teacher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<Vec<classroom::Model>>, AppError> {
    let classrooms = Classroom::find()
        .filter(classroom::Column::TeacherId.eq(id))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::success(classrooms))
}

/// Classrooms the user is enrolled in, with teacher names and counts.
#[utoipa::path(
    get,
    path = "/api/classrooms/enrolled/{id}",
    params(("id" = i32, Path, description = "Student user id")),
    responses(
        (status = 200, description = "Enrolled classrooms", body = ApiResponse<Vec<ClassroomResponse>>)
    ),
    tag = "classrooms"
)]
async fn enrolled_classrooms(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<Vec<ClassroomResponse>>, AppError> {
    let enrolled = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(id))
        .find_also_related(Classroom)
        .all(&state.db)
        .await?;

    let mut response = Vec::with_capacity(enrolled.len());
    for (_, classroom) in enrolled {
        let Some(classroom) = classroom else { continue };
        let teacher = User::find_by_id(classroom.teacher_id).one(&state.db).await?;
        let students = enrollment::Entity::find()
            .filter(enrollment::Column::ClassroomId.eq(classroom.id))
            .all(&state.db)
            .await?
            .len() as u64;
        response.push(ClassroomResponse::from_model(
            classroom,
            teacher.map(|t| t.name),
            students,
        ));
    }

    Ok(ApiResponse::success(response))
}

/// Assignments in a classroom that are not yet due, soonest first.
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/upcoming-assignments",
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 200, description = "Upcoming assignments", body = ApiResponse<Vec<UpcomingAssignment>>)
    ),
    tag = "classrooms"
)]
async fn upcoming_assignments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<Vec<UpcomingAssignment>>, AppError> {
    let now = Utc::now().naive_utc();

    let assignments = assignment::Entity::find()
        .filter(assignment::Column::ClassroomId.eq(id))
        .filter(assignment::Column::DueDate.gte(now))
        .order_by_asc(assignment::Column::DueDate)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| UpcomingAssignment {
            title: a.title,
            due_date: a.due_date,
        })
        .collect();

    Ok(ApiResponse::success(assignments))
}

/// Deadline overview for a user: a teacher sees assignments they created,
/// a student sees assignments across their enrolled classrooms.
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/deadline-assignments",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Deadline overview", body = ApiResponse<Vec<DeadlineAssignment>>),
        (status = 404, description = "User not found")
    ),
    tag = "classrooms"
)]
async fn deadline_assignments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<Vec<DeadlineAssignment>>, AppError> {
    let caller = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let query = if caller.role == Role::Teacher.as_str() {
        assignment::Entity::find().filter(assignment::Column::UserId.eq(id))
    } else {
        let classroom_ids: Vec<i32> = enrollment::Entity::find()
            .filter(enrollment::Column::UserId.eq(id))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|e| e.classroom_id)
            .collect();
        if classroom_ids.is_empty() {
            return Ok(ApiResponse::success(Vec::new()));
        }
        assignment::Entity::find().filter(assignment::Column::ClassroomId.is_in(classroom_ids))
    };

    let assignments = query
        .order_by_asc(assignment::Column::DueDate)
        .find_also_related(Classroom)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(a, c)| DeadlineAssignment {
            classroom_name: c.map(|c| c.name).unwrap_or_default(),
            assignment_title: a.title,
            due_date: a.due_date,
        })
        .collect();

    Ok(ApiResponse::success(assignments))
}

// ── Helpers ──

async fn find_classroom(state: &AppState, id: i32) -> Result<classroom::Model, AppError> {
    Classroom::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Classroom not found".to_string()))
}

/// Random six-character join code (unambiguous uppercase alphanumerics).
fn generate_join_code() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_codes_are_six_unambiguous_chars() {
        for _ in 0..50 {
            let code = generate_join_code();
            assert_eq!(code.len(), 6);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            assert!(!code.contains('O') && !code.contains('0') && !code.contains('1'));
        }
    }
}
