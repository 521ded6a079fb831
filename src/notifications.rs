//! Notification synthesis.
//!
//! Notifications are not stored as first-class rows. They are synthesized
//! on read from four entity streams (graded submissions, announcements,
//! assignments, materials) scoped to the user's enrolled classrooms and a
//! 7-day recency window, then filtered against the per-user dismissal
//! tombstones. Dismissal is permanent: there is no "mark unread".

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDateTime};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{
    announcement, assignment, classroom, dismissed_notification, enrollment, material, submission,
};

pub const TYPE_GRADE: &str = "grade";
pub const TYPE_ANNOUNCEMENT: &str = "announcement";
pub const TYPE_ASSIGNMENT: &str = "assignment";
pub const TYPE_MATERIAL: &str = "material";

/// How far back announcements, assignments and materials are surfaced.
const RECENCY_WINDOW_DAYS: i64 = 7;

/// Descriptive text is truncated to this many characters in the feed.
const TEXT_PREVIEW_CHARS: usize = 100;

/// A synthesized feed entry. One variant per source stream, tagged with
/// `type` on the wire; all variants expose a timestamp for the merge sort.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notification {
    Grade {
        id: i32,
        course: String,
        assignment: String,
        score: Option<i32>,
        feedback: Option<String>,
        timestamp: NaiveDateTime,
        #[serde(rename = "isNew")]
        is_new: bool,
    },
    Announcement {
        id: i32,
        course: String,
        title: String,
        content: String,
        timestamp: NaiveDateTime,
        #[serde(rename = "isNew")]
        is_new: bool,
    },
    Assignment {
        id: i32,
        course: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(rename = "dueDate")]
        due_date: NaiveDateTime,
        timestamp: NaiveDateTime,
        #[serde(rename = "isNew")]
        is_new: bool,
    },
    Material {
        id: i32,
        course: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        timestamp: NaiveDateTime,
        #[serde(rename = "isNew")]
        is_new: bool,
    },
}

impl Notification {
    /// Comparison key for the merged feed sort.
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Notification::Grade { timestamp, .. }
            | Notification::Announcement { timestamp, .. }
            | Notification::Assignment { timestamp, .. }
            | Notification::Material { timestamp, .. } => *timestamp,
        }
    }
}

/// Build the feed for one user: merge the four candidate streams, exclude
/// dismissed entries, sort newest first.
///
/// Returns an empty feed without touching the other tables when the user
/// has no enrollments.
pub async fn feed_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    now: NaiveDateTime,
) -> Result<Vec<Notification>, AppError> {
    let classroom_ids: Vec<i32> = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|e| e.classroom_id)
        .collect();

    if classroom_ids.is_empty() {
        return Ok(Vec::new());
    }

    let dismissed = dismissed_notification::Entity::find()
        .filter(dismissed_notification::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let dismissed_ids_of = |kind: &str| -> Vec<i32> {
        dismissed
            .iter()
            .filter(|d| d.notification_type == kind)
            .map(|d| d.notification_id)
            .collect()
    };
    let dismissed_grades = dismissed_ids_of(TYPE_GRADE);
    let dismissed_announcements = dismissed_ids_of(TYPE_ANNOUNCEMENT);
    let dismissed_assignments = dismissed_ids_of(TYPE_ASSIGNMENT);
    let dismissed_materials = dismissed_ids_of(TYPE_MATERIAL);

    let cutoff = now - Duration::days(RECENCY_WINDOW_DAYS);

    // Grades have no recency window: a grade entry stays in the feed
    // until the student dismisses it.
    let mut grades_query = submission::Entity::find()
        .filter(submission::Column::UserId.eq(user_id))
        .filter(submission::Column::GradedAt.is_not_null());
    if !dismissed_grades.is_empty() {
        grades_query = grades_query.filter(submission::Column::Id.is_not_in(dismissed_grades));
    }

    let mut announcements_query = announcement::Entity::find()
        .filter(announcement::Column::ClassroomId.is_in(classroom_ids.clone()))
        .filter(announcement::Column::DatePosted.gte(cutoff));
    if !dismissed_announcements.is_empty() {
        announcements_query =
            announcements_query.filter(announcement::Column::Id.is_not_in(dismissed_announcements));
    }

    let mut assignments_query = assignment::Entity::find()
        .filter(assignment::Column::ClassroomId.is_in(classroom_ids.clone()))
        .filter(assignment::Column::CreatedAt.gte(cutoff));
    if !dismissed_assignments.is_empty() {
        assignments_query =
            assignments_query.filter(assignment::Column::Id.is_not_in(dismissed_assignments));
    }

    let mut materials_query = material::Entity::find()
        .filter(material::Column::ClassroomId.is_in(classroom_ids.clone()))
        .filter(material::Column::CreatedAt.gte(cutoff));
    if !dismissed_materials.is_empty() {
        materials_query =
            materials_query.filter(material::Column::Id.is_not_in(dismissed_materials));
    }

    // The four candidate reads are independent; run them concurrently.
    let (grades, announcements, assignments, materials) = tokio::try_join!(
        grades_query.find_also_related(assignment::Entity).all(db),
        announcements_query.all(db),
        assignments_query.all(db),
        materials_query.all(db),
    )?;

    // One lookup covers every classroom name the feed needs, including
    // classrooms of graded work the user may no longer be enrolled in.
    let mut name_ids: HashSet<i32> = classroom_ids.into_iter().collect();
    for (_, a) in &grades {
        if let Some(a) = a {
            name_ids.insert(a.classroom_id);
        }
    }
    let course_names: HashMap<i32, String> = classroom::Entity::find()
        .filter(classroom::Column::Id.is_in(name_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let course_name =
        |id: i32| -> String { course_names.get(&id).cloned().unwrap_or_default() };

    let mut feed = Vec::new();

    for (sub, assignment) in grades {
        let Some(assignment) = assignment else {
            continue;
        };
        // graded_at is non-null by the query filter
        let Some(graded_at) = sub.graded_at else {
            continue;
        };
        feed.push(Notification::Grade {
            id: sub.id,
            course: course_name(assignment.classroom_id),
            assignment: assignment.title,
            score: sub.grade,
            feedback: sub.feedback,
            timestamp: graded_at,
            is_new: true,
        });
    }

    for a in announcements {
        feed.push(Notification::Announcement {
            id: a.id,
            course: course_name(a.classroom_id),
            title: a.title,
            content: truncate_preview(&a.content),
            timestamp: a.date_posted,
            is_new: true,
        });
    }

    for a in assignments {
        feed.push(Notification::Assignment {
            id: a.id,
            course: course_name(a.classroom_id),
            title: a.title,
            description: a.description.as_deref().map(truncate_preview),
            due_date: a.due_date,
            timestamp: a.created_at,
            is_new: true,
        });
    }

    for m in materials {
        feed.push(Notification::Material {
            id: m.id,
            course: course_name(m.classroom_id),
            title: m.title,
            description: m.description.as_deref().map(truncate_preview),
            timestamp: m.created_at,
            is_new: true,
        });
    }

    feed.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));

    Ok(feed)
}

/// Record dismissal tombstones for a batch of notification ids, all inside
/// one transaction. Re-dismissing an id is a no-op via the unique index.
pub async fn dismiss_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    notification_ids: &[i32],
    kind: &str,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    for &notification_id in notification_ids {
        let tombstone = dismissed_notification::ActiveModel {
            user_id: Set(user_id),
            notification_id: Set(notification_id),
            notification_type: Set(kind.to_string()),
            dismissed_at: Set(now),
            ..Default::default()
        };

        dismissed_notification::Entity::insert(tombstone)
            .on_conflict(
                OnConflict::columns([
                    dismissed_notification::Column::UserId,
                    dismissed_notification::Column::NotificationId,
                    dismissed_notification::Column::NotificationType,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Truncate descriptive text for the feed, appending an ellipsis when the
/// source is longer than the preview length.
fn truncate_preview(text: &str) -> String {
    if text.chars().count() > TEXT_PREVIEW_CHARS {
        let mut preview: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_preview("hello"), "hello");
        assert_eq!(truncate_preview(""), "");
    }

    #[test]
    fn long_text_is_cut_at_preview_length() {
        let long = "x".repeat(250);
        let preview = truncate_preview(&long);
        assert_eq!(preview.chars().count(), TEXT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn exact_length_text_gets_no_ellipsis() {
        let text = "y".repeat(TEXT_PREVIEW_CHARS);
        assert_eq!(truncate_preview(&text), text);
    }

    #[test]
    fn feed_sorts_newest_first() {
        let now = Utc::now().naive_utc();
        let older = now - Duration::hours(2);

        let mut feed = vec![
            Notification::Material {
                id: 1,
                course: "Math".into(),
                title: "Syllabus".into(),
                description: None,
                timestamp: older,
                is_new: true,
            },
            Notification::Grade {
                id: 2,
                course: "Math".into(),
                assignment: "HW 1".into(),
                score: Some(90),
                feedback: None,
                timestamp: now,
                is_new: true,
            },
        ];
        feed.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));

        assert_eq!(feed[0].timestamp(), now);
        assert_eq!(feed[1].timestamp(), older);
    }

    #[test]
    fn notifications_serialize_with_type_tag() {
        let n = Notification::Announcement {
            id: 7,
            course: "History".into(),
            title: "Field trip".into(),
            content: "Friday".into(),
            timestamp: Utc::now().naive_utc(),
            is_new: true,
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "announcement");
        assert_eq!(json["isNew"], true);
        assert_eq!(json["course"], "History");
    }
}
