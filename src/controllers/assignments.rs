use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{AuthUser, Json};
use crate::models::assignment::{self, AssignmentSummary, Entity as Assignment};
use crate::models::submission::{self, Entity as Submission, SubmissionStatus};
use crate::models::user::{self, Entity as User};
use crate::response::ApiResponse;
use crate::uploads::UploadedFile;

use super::AppState;

// ── Response types ──

#[derive(Debug, Serialize, ToSchema)]
pub struct FileInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreated {
    pub id: i32,
    pub assignment_id: i32,
    pub user_id: i32,
    pub status: String,
    pub submitted_at: NaiveDateTime,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionListItem {
    pub id: i32,
    pub status: String,
    pub was_late: bool,
    pub submitted_at: NaiveDateTime,
    pub graded_at: Option<NaiveDateTime>,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
    pub user: Option<user::UserResponse>,
    pub file_info: FileInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionList {
    pub total: u64,
    pub submissions: Vec<SubmissionListItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeRequest {
    pub score: i32,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GradeResponse {
    pub id: i32,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmissionView {
    pub id: i32,
    pub submitted_at: NaiveDateTime,
    pub file_info: FileInfo,
    pub status: String,
    pub was_late: bool,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
}

/// Assignment as seen by one student, with their submission folded in.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignmentView {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDateTime,
    pub status: String,
    pub file_info: FileInfo,
    pub created_at: NaiveDateTime,
    pub submission: Option<StudentSubmissionView>,
    pub is_submitted: bool,
    pub is_graded: bool,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assignment))
        .route("/{id}/assignments", get(classroom_assignments))
        .route(
            "/{id}/submissions",
            get(list_submissions).post(submit_assignment),
        )
        .route("/{id}/file", get(download_assignment_file))
        .route("/{id}/file/download", get(download_submission_file))
        .route("/{id}/grade", put(grade_submission))
        .route(
            "/{id}/students/{user_id}/assignments",
            get(student_assignments),
        )
}

// ── Handlers ──

/// Create an assignment, optionally with an attached file.
#[utoipa::path(
    post,
    path = "/api/assignments",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Assignment created", body = ApiResponse<AssignmentSummary>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "assignments",
    security(("bearer_auth" = []))
)]
async fn create_assignment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut due_date: Option<NaiveDateTime> = None;
    let mut classroom_id: Option<i32> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "title" => title = Some(read_text(field).await?),
            "description" => description = Some(read_text(field).await?),
            "dueDate" => due_date = Some(parse_due_date(&read_text(field).await?)?),
            "classroomId" => {
                classroom_id = Some(read_text(field).await?.parse().map_err(|_| {
                    AppError::Validation("classroomId must be an integer".to_string())
                })?)
            }
            "file" => file = Some(UploadedFile::from_field(field).await?),
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Title and classroom ID are required".to_string()))?;
    let classroom_id = classroom_id
        .ok_or_else(|| AppError::Validation("Title and classroom ID are required".to_string()))?;
    let due_date =
        due_date.ok_or_else(|| AppError::Validation("Due date is required".to_string()))?;

    let mut new_assignment = assignment::ActiveModel {
        title: Set(title.trim().to_string()),
        description: Set(description.map(|d| d.trim().to_string())),
        due_date: Set(due_date),
        classroom_id: Set(classroom_id),
        user_id: Set(user_id),
        status: Set(assignment::STATUS_PUBLISHED.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    if let Some(file) = file {
        new_assignment.file_data = Set(Some(file.data));
        new_assignment.file_name = Set(Some(file.name));
        new_assignment.file_type = Set(Some(file.content_type));
        new_assignment.file_size = Set(Some(file.size));
    }

    let created = new_assignment.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(ApiResponse::success(AssignmentSummary::from(created))),
    ))
}

/// Assignments in a classroom, newest first.
#[utoipa::path(
    get,
    path = "/api/assignments/{id}/assignments",
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 200, description = "Classroom assignments", body = ApiResponse<Vec<AssignmentSummary>>)
    ),
    tag = "assignments"
)]
async fn classroom_assignments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<Vec<AssignmentSummary>>, AppError> {
    let assignments = Assignment::find()
        .filter(assignment::Column::ClassroomId.eq(id))
        .order_by_desc(assignment::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AssignmentSummary::from)
        .collect();

    Ok(ApiResponse::success(assignments))
}

/// Submit a file for an assignment.
///
/// Lateness is fixed at this moment: strictly past the due date means
/// `LATE`, and `was_late` remembers that through later grading.
#[utoipa::path(
    post,
    path = "/api/assignments/{id}/submissions",
    params(("id" = i32, Path, description = "Assignment id")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Submission stored", body = ApiResponse<SubmissionCreated>),
        (status = 400, description = "Missing fields or unsupported file type"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Already submitted")
    ),
    tag = "assignments"
)]
async fn submit_assignment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut user_id: Option<i32> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "userId" => {
                user_id = Some(read_text(field).await?.parse().map_err(|_| {
                    AppError::Validation("userId must be an integer".to_string())
                })?)
            }
            "file" => file = Some(UploadedFile::from_field(field).await?),
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| AppError::Validation("Missing required fields".to_string()))?;
    let file = file.ok_or_else(|| AppError::Validation("Missing required fields".to_string()))?;

    let assignment = Assignment::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    let now = Utc::now().naive_utc();
    let status = SubmissionStatus::resolve(assignment.due_date, now);
    let is_late = status == SubmissionStatus::Late;

    let new_submission = submission::ActiveModel {
        assignment_id: Set(id),
        user_id: Set(user_id),
        file_data: Set(file.data),
        file_name: Set(file.name),
        file_type: Set(file.content_type),
        file_size: Set(file.size),
        status: Set(status.as_str().to_string()),
        was_late: Set(is_late),
        submitted_at: Set(now),
        grade: Set(None),
        feedback: Set(None),
        graded_at: Set(None),
        ..Default::default()
    };

    let created = match new_submission.insert(&state.db).await {
        Ok(model) => model,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // Second submission for the same (assignment, user): report the
            // existing one so the client can link to it.
            let existing = Submission::find()
                .filter(submission::Column::AssignmentId.eq(id))
                .filter(submission::Column::UserId.eq(user_id))
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::Internal("Submission conflict".to_string()))?;
            return Err(AppError::DuplicateSubmission {
                submission_id: existing.id,
            });
        }
        Err(err) => return Err(err.into()),
    };

    let message = if is_late {
        "Assignment submitted successfully (late submission)"
    } else {
        "Assignment submitted successfully"
    };

    Ok((
        StatusCode::CREATED,
        axum::Json(ApiResponse::success(SubmissionCreated {
            id: created.id,
            assignment_id: created.assignment_id,
            user_id: created.user_id,
            status: created.status,
            submitted_at: created.submitted_at,
            message: message.to_string(),
        })),
    ))
}

/// All submissions for an assignment, newest first.
#[utoipa::path(
    get,
    path = "/api/assignments/{id}/submissions",
    params(("id" = i32, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Submissions with total count", body = ApiResponse<SubmissionList>)
    ),
    tag = "assignments"
)]
async fn list_submissions(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<SubmissionList>, AppError> {
    let submissions = Submission::find()
        .filter(submission::Column::AssignmentId.eq(id))
        .order_by_desc(submission::Column::SubmittedAt)
        .find_also_related(User)
        .all(&state.db)
        .await?;

    let total = submissions.len() as u64;
    let submissions = submissions
        .into_iter()
        .map(|(s, u)| SubmissionListItem {
            id: s.id,
            status: s.status,
            was_late: s.was_late,
            submitted_at: s.submitted_at,
            graded_at: s.graded_at,
            grade: s.grade,
            feedback: s.feedback,
            user: u.map(user::UserResponse::from),
            file_info: FileInfo {
                name: Some(s.file_name),
                content_type: Some(s.file_type),
                size: Some(s.file_size),
            },
        })
        .collect();

    Ok(ApiResponse::success(SubmissionList { total, submissions }))
}

/// Grade (or re-grade) a submission.
///
/// Grading is unconditional: a second grade overwrites the first, and the
/// status always collapses to `GRADED`.
#[utoipa::path(
    put,
    path = "/api/assignments/{id}/grade",
    params(("id" = i32, Path, description = "Submission id")),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Submission graded", body = ApiResponse<GradeResponse>),
        (status = 400, description = "Score out of range"),
        (status = 404, description = "Submission not found")
    ),
    tag = "assignments",
    security(("bearer_auth" = []))
)]
async fn grade_submission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<GradeRequest>,
) -> Result<ApiResponse<GradeResponse>, AppError> {
    if !(0..=100).contains(&payload.score) {
        return Err(AppError::Validation(
            "Invalid score (0-100 required)".to_string(),
        ));
    }

    let submission = Submission::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    let mut active: submission::ActiveModel = submission.into();
    active.grade = Set(Some(payload.score));
    active.feedback = Set(payload.feedback);
    active.graded_at = Set(Some(Utc::now().naive_utc()));
    active.status = Set(SubmissionStatus::Graded.as_str().to_string());
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::success(GradeResponse {
        id: updated.id,
        grade: updated.grade,
        feedback: updated.feedback,
    }))
}

/// Download an assignment's attached file.
#[utoipa::path(
    get,
    path = "/api/assignments/{id}/file",
    params(("id" = i32, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "No file attached")
    ),
    tag = "assignments"
)]
async fn download_assignment_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = Assignment::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let data = assignment
        .file_data
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(file_response(
        data,
        assignment.file_type,
        assignment.file_name.unwrap_or_else(|| "assignment".to_string()),
    ))
}

/// Download a submission's file.
#[utoipa::path(
    get,
    path = "/api/assignments/{id}/file/download",
    params(("id" = i32, Path, description = "Submission id")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "Submission not found")
    ),
    tag = "assignments"
)]
async fn download_submission_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let submission = Submission::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(file_response(
        submission.file_data,
        Some(submission.file_type),
        submission.file_name,
    ))
}

/// A classroom's published assignments from one student's point of view,
/// with that student's submission folded in.
#[utoipa::path(
    get,
    path = "/api/assignments/{id}/students/{user_id}/assignments",
    params(
        ("id" = i32, Path, description = "Classroom id"),
        ("user_id" = i32, Path, description = "Student user id")
    ),
    responses(
        (status = 200, description = "Assignments with submission state", body = ApiResponse<Vec<StudentAssignmentView>>)
    ),
    tag = "assignments"
)]
async fn student_assignments(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> Result<ApiResponse<Vec<StudentAssignmentView>>, AppError> {
    let assignments = Assignment::find()
        .filter(assignment::Column::ClassroomId.eq(id))
        .filter(assignment::Column::Status.eq(assignment::STATUS_PUBLISHED))
        .order_by_asc(assignment::Column::DueDate)
        .all(&state.db)
        .await?;

    let mut views = Vec::with_capacity(assignments.len());
    for a in assignments {
        let sub = Submission::find()
            .filter(submission::Column::AssignmentId.eq(a.id))
            .filter(submission::Column::UserId.eq(user_id))
            .one(&state.db)
            .await?;

        let is_submitted = sub.is_some();
        let is_graded = sub
            .as_ref()
            .map(|s| s.status == SubmissionStatus::Graded.as_str())
            .unwrap_or(false);

        views.push(StudentAssignmentView {
            id: a.id,
            title: a.title,
            description: a.description,
            due_date: a.due_date,
            status: a.status,
            file_info: FileInfo {
                name: a.file_name,
                content_type: a.file_type,
                size: a.file_size,
            },
            created_at: a.created_at,
            submission: sub.map(|s| StudentSubmissionView {
                id: s.id,
                submitted_at: s.submitted_at,
                file_info: FileInfo {
                    name: Some(s.file_name),
                    content_type: Some(s.file_type),
                    size: Some(s.file_size),
                },
                status: s.status,
                was_late: s.was_late,
                grade: s.grade,
                feedback: s.feedback,
            }),
            is_submitted,
            is_graded,
        });
    }

    Ok(ApiResponse::success(views))
}

// ── Helpers ──

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field: {}", e)))
}

fn parse_due_date(raw: &str) -> Result<NaiveDateTime, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .map_err(|_| AppError::Validation("dueDate must be an RFC 3339 timestamp".to_string()))
}

fn file_response(
    data: Vec<u8>,
    content_type: Option<String>,
    file_name: String,
) -> impl IntoResponse {
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        data,
    )
}
