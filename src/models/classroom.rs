use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_ARCHIVED: &str = "archived";

/// Classroom entity: a named group owned by one teacher, joined by students
/// via its code. Archiving toggles `status`; classrooms are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "classrooms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Unique join token students use to enroll.
    #[sea_orm(unique)]
    pub code: String,

    pub subject: String,
    pub description: Option<String>,

    pub teacher_id: i32,

    /// `active` or `archived`.
    pub status: String,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollment,
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignment,
    #[sea_orm(has_many = "super::announcement::Entity")]
    Announcement,
    #[sea_orm(has_many = "super::material::Entity")]
    Material,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Classroom summary for list/detail endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub teacher_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    pub status: String,
    /// Number of enrolled students.
    pub students: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ClassroomResponse {
    pub fn from_model(classroom: Model, teacher_name: Option<String>, students: u64) -> Self {
        ClassroomResponse {
            id: classroom.id,
            name: classroom.name,
            code: classroom.code,
            subject: classroom.subject,
            description: classroom.description,
            teacher_id: classroom.teacher_id,
            teacher_name,
            status: classroom.status,
            students,
            created_at: classroom.created_at,
            updated_at: classroom.updated_at,
        }
    }
}
