use utoipa::OpenApi;

use crate::controllers::assignments::{
    GradeRequest, GradeResponse, SubmissionCreated, SubmissionList, SubmissionListItem,
};
use crate::controllers::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::controllers::classrooms::{
    CreateAnnouncementRequest, CreateClassroomRequest, JoinClassroomRequest, RosterResponse,
};
use crate::controllers::notifications::{FeedResponse, MarkReadRequest, MarkReadResponse};
use crate::models::classroom::ClassroomResponse;
use crate::models::user::UserResponse;
use crate::notifications::Notification;
use crate::reports::ReportJson;

/// Auto-generated OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ClassHub API",
        version = "0.1.0",
        description = "Classroom management backend: users, classrooms, assignments, submissions, materials, notifications, and grade reports."
    ),
    paths(
        crate::controllers::auth::register,
        crate::controllers::auth::login,
        crate::controllers::classrooms::list_classrooms,
        crate::controllers::classrooms::get_classroom,
        crate::controllers::classrooms::create_classroom,
        crate::controllers::classrooms::join_classroom,
        crate::controllers::classrooms::archive_classroom,
        crate::controllers::classrooms::classroom_roster,
        crate::controllers::classrooms::list_announcements,
        crate::controllers::classrooms::create_announcement,
        crate::controllers::classrooms::classrooms_by_teacher,
        crate::controllers::classrooms::enrolled_classrooms,
        crate::controllers::classrooms::upcoming_assignments,
        crate::controllers::classrooms::deadline_assignments,
        crate::controllers::assignments::create_assignment,
        crate::controllers::assignments::classroom_assignments,
        crate::controllers::assignments::submit_assignment,
        crate::controllers::assignments::list_submissions,
        crate::controllers::assignments::grade_submission,
        crate::controllers::assignments::download_assignment_file,
        crate::controllers::assignments::download_submission_file,
        crate::controllers::assignments::student_assignments,
        crate::controllers::materials::list_materials,
        crate::controllers::materials::create_material,
        crate::controllers::materials::download_material,
        crate::controllers::materials::delete_material,
        crate::controllers::notifications::get_notifications,
        crate::controllers::notifications::mark_notifications_read,
        crate::controllers::reports::classroom_report,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            CreateClassroomRequest,
            JoinClassroomRequest,
            CreateAnnouncementRequest,
            ClassroomResponse,
            RosterResponse,
            GradeRequest,
            GradeResponse,
            SubmissionCreated,
            SubmissionList,
            SubmissionListItem,
            Notification,
            FeedResponse,
            MarkReadRequest,
            MarkReadResponse,
            ReportJson,
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "classrooms", description = "Classrooms, enrollment, and announcements"),
        (name = "assignments", description = "Assignments, submissions, and grading"),
        (name = "materials", description = "Course materials"),
        (name = "notifications", description = "Synthesized notification feed"),
        (name = "reports", description = "Grade reports")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add JWT Bearer security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
