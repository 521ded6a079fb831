use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Submission: a student's uploaded response to an assignment.
///
/// At most one submission exists per (assignment, user), enforced by a
/// unique index; the constraint violation is the duplicate-submission 409
/// path, so two concurrent submissions cannot both land.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub assignment_id: i32,
    pub user_id: i32,

    #[serde(skip_serializing)]
    pub file_data: Vec<u8>,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,

    /// `SUBMITTED`, `LATE`, or `GRADED` (see [`SubmissionStatus`]).
    /// Grading overwrites this unconditionally; `was_late` keeps the
    /// lateness fact once the status collapses to `GRADED`.
    pub status: String,
    pub was_late: bool,

    pub submitted_at: NaiveDateTime,

    /// 0-100 once graded.
    pub grade: Option<i32>,
    pub feedback: Option<String>,
    pub graded_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Submission lifecycle status, stored as a plain string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Submitted,
    Late,
    Graded,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "SUBMITTED",
            SubmissionStatus::Late => "LATE",
            SubmissionStatus::Graded => "GRADED",
        }
    }

    /// Resolve the creation-time status: `LATE` iff the wall clock has
    /// passed the due date, else `SUBMITTED`.
    pub fn resolve(due_date: NaiveDateTime, now: NaiveDateTime) -> SubmissionStatus {
        if now > due_date {
            SubmissionStatus::Late
        } else {
            SubmissionStatus::Submitted
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(SubmissionStatus::Submitted),
            "LATE" => Ok(SubmissionStatus::Late),
            "GRADED" => Ok(SubmissionStatus::Graded),
            other => Err(format!("Unknown submission status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn submission_before_due_date_is_on_time() {
        let due = Utc::now().naive_utc() + Duration::hours(1);
        let now = Utc::now().naive_utc();
        assert_eq!(
            SubmissionStatus::resolve(due, now),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn submission_after_due_date_is_late() {
        let due = Utc::now().naive_utc() - Duration::hours(1);
        let now = Utc::now().naive_utc();
        assert_eq!(SubmissionStatus::resolve(due, now), SubmissionStatus::Late);
    }

    #[test]
    fn submission_exactly_at_due_date_is_on_time() {
        let instant = Utc::now().naive_utc();
        assert_eq!(
            SubmissionStatus::resolve(instant, instant),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            SubmissionStatus::Submitted,
            SubmissionStatus::Late,
            SubmissionStatus::Graded,
        ] {
            assert_eq!(status.as_str().parse::<SubmissionStatus>(), Ok(status));
        }
        assert!("graded".parse::<SubmissionStatus>().is_err());
    }
}
