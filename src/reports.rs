//! Classroom grade reports.
//!
//! Pivots the per-student/per-assignment grade matrix into a JSON payload
//! or a two-sheet xlsx export. Missing or ungraded submissions score as 0
//! in both the cells and the per-student totals.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{assignment, classroom, enrollment, submission, user};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const STATUS_NOT_SUBMITTED: &str = "NOT_SUBMITTED";

/// Everything needed to render a classroom grade report, loaded once.
pub struct ReportData {
    pub classroom: classroom::Model,
    pub students: Vec<user::Model>,
    pub assignments: Vec<assignment::Model>,
    /// Submissions indexed by (assignment_id, user_id).
    submissions: HashMap<(i32, i32), submission::Model>,
}

impl ReportData {
    pub fn submission_for(&self, assignment_id: i32, user_id: i32) -> Option<&submission::Model> {
        self.submissions.get(&(assignment_id, user_id))
    }

    /// Cell value for the matrix: the grade, or 0 when unsubmitted or
    /// ungraded.
    pub fn grade_for(&self, assignment_id: i32, user_id: i32) -> i32 {
        self.submission_for(assignment_id, user_id)
            .and_then(|s| s.grade)
            .unwrap_or(0)
    }

    /// Per-student total: sum across all assignments, zeros included.
    pub fn total_for(&self, user_id: i32) -> i32 {
        self.assignments
            .iter()
            .map(|a| self.grade_for(a.id, user_id))
            .sum()
    }
}

/// Load the dense grade matrix for a classroom.
///
/// An unresolvable classroom surfaces as an internal error; the report
/// endpoint has no distinct 404 path.
pub async fn classroom_grades(
    db: &DatabaseConnection,
    classroom_id: i32,
) -> Result<ReportData, AppError> {
    let classroom = classroom::Entity::find_by_id(classroom_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Classroom not found".to_string()))?;

    let students: Vec<user::Model> = enrollment::Entity::find()
        .filter(enrollment::Column::ClassroomId.eq(classroom_id))
        .find_also_related(user::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(_, u)| u)
        .collect();

    let assignments = assignment::Entity::find()
        .filter(assignment::Column::ClassroomId.eq(classroom_id))
        .order_by_asc(assignment::Column::CreatedAt)
        .all(db)
        .await?;

    let assignment_ids: Vec<i32> = assignments.iter().map(|a| a.id).collect();
    let submissions: HashMap<(i32, i32), submission::Model> = if assignment_ids.is_empty() {
        HashMap::new()
    } else {
        submission::Entity::find()
            .filter(submission::Column::AssignmentId.is_in(assignment_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| ((s.assignment_id, s.user_id), s))
            .collect()
    };

    Ok(ReportData {
        classroom,
        students,
        assignments,
        submissions,
    })
}

// ── JSON output ──

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportJson {
    pub classroom: ClassroomInfo,
    pub students: Vec<StudentReport>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassroomInfo {
    pub name: String,
    pub code: String,
    pub subject: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student: StudentInfo,
    pub assignments: Vec<AssignmentGrade>,
    pub total_grade: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentGrade {
    pub assignment_id: i32,
    pub title: String,
    pub due_date: NaiveDateTime,
    pub submission_date: Option<NaiveDateTime>,
    pub status: String,
    pub grade: i32,
}

/// Render the matrix as the JSON report payload.
pub fn to_json(data: &ReportData) -> ReportJson {
    let students = data
        .students
        .iter()
        .map(|student| {
            let assignments: Vec<AssignmentGrade> = data
                .assignments
                .iter()
                .map(|a| {
                    let sub = data.submission_for(a.id, student.id);
                    AssignmentGrade {
                        assignment_id: a.id,
                        title: a.title.clone(),
                        due_date: a.due_date,
                        submission_date: sub.map(|s| s.submitted_at),
                        status: sub
                            .map(|s| s.status.clone())
                            .unwrap_or_else(|| STATUS_NOT_SUBMITTED.to_string()),
                        grade: data.grade_for(a.id, student.id),
                    }
                })
                .collect();

            StudentReport {
                student: StudentInfo {
                    id: student.id,
                    name: student.name.clone(),
                    email: student.email.clone(),
                },
                total_grade: assignments.iter().map(|a| a.grade).sum(),
                assignments,
            }
        })
        .collect();

    ReportJson {
        classroom: ClassroomInfo {
            name: data.classroom.name.clone(),
            code: data.classroom.code.clone(),
            subject: data.classroom.subject.clone(),
        },
        students,
    }
}

// ── xlsx output ──

/// Render the matrix as a two-sheet workbook: per-submission detail rows
/// plus a totals block, and a per-student summary pivot.
pub fn to_xlsx(data: &ReportData) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    // ── Sheet 1: detailed grade report ──
    {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Grade Report")
            .map_err(xlsx_error)?;

        let headers = [
            "Student Name",
            "Email",
            "Assignment Title",
            "Due Date",
            "Submission Date",
            "Submission Status",
            "Grade",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &bold)
                .map_err(xlsx_error)?;
        }

        let mut row: u32 = 1;
        for student in &data.students {
            for a in &data.assignments {
                let sub = data.submission_for(a.id, student.id);
                let status = sub
                    .map(|s| s.status.replace('_', " "))
                    .unwrap_or_else(|| "Not Submitted".to_string());
                let submitted = sub
                    .map(|s| s.submitted_at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string());

                sheet
                    .write(row, 0, student.name.as_str())
                    .map_err(xlsx_error)?;
                sheet
                    .write(row, 1, student.email.as_str())
                    .map_err(xlsx_error)?;
                sheet.write(row, 2, a.title.as_str()).map_err(xlsx_error)?;
                sheet
                    .write(row, 3, a.due_date.format("%Y-%m-%d").to_string())
                    .map_err(xlsx_error)?;
                sheet.write(row, 4, submitted).map_err(xlsx_error)?;
                sheet.write(row, 5, status).map_err(xlsx_error)?;
                sheet
                    .write(row, 6, data.grade_for(a.id, student.id) as f64)
                    .map_err(xlsx_error)?;
                row += 1;
            }
        }

        // Totals block under an empty separator row.
        row += 1;
        sheet
            .write_with_format(row, 0, "Student Totals", &bold)
            .map_err(xlsx_error)?;
        row += 1;
        for student in &data.students {
            sheet
                .write(row, 0, student.name.as_str())
                .map_err(xlsx_error)?;
            sheet
                .write(row, 1, student.email.as_str())
                .map_err(xlsx_error)?;
            sheet.write(row, 2, "Total Grade").map_err(xlsx_error)?;
            sheet
                .write(row, 6, data.total_for(student.id) as f64)
                .map_err(xlsx_error)?;
            row += 1;
        }
    }

    // ── Sheet 2: per-student summary pivot ──
    {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Student Summary")
            .map_err(xlsx_error)?;

        sheet
            .write_with_format(0, 0, "Student Name", &bold)
            .map_err(xlsx_error)?;
        sheet
            .write_with_format(0, 1, "Email", &bold)
            .map_err(xlsx_error)?;
        for (i, a) in data.assignments.iter().enumerate() {
            sheet
                .write_with_format(0, 2 + i as u16, a.title.as_str(), &bold)
                .map_err(xlsx_error)?;
        }
        let total_col = 2 + data.assignments.len() as u16;
        sheet
            .write_with_format(0, total_col, "Total Grade", &bold)
            .map_err(xlsx_error)?;

        for (i, student) in data.students.iter().enumerate() {
            let row = 1 + i as u32;
            sheet
                .write(row, 0, student.name.as_str())
                .map_err(xlsx_error)?;
            sheet
                .write(row, 1, student.email.as_str())
                .map_err(xlsx_error)?;
            for (j, a) in data.assignments.iter().enumerate() {
                sheet
                    .write(row, 2 + j as u16, data.grade_for(a.id, student.id) as f64)
                    .map_err(xlsx_error)?;
            }
            sheet
                .write(row, total_col, data.total_for(student.id) as f64)
                .map_err(xlsx_error)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> AppError {
    AppError::Internal(format!("Failed to build spreadsheet: {}", e))
}
