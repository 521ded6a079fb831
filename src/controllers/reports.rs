use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::reports::{self, ReportJson};

use super::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportQuery {
    /// `json` for the structured payload; anything else gets the workbook.
    pub format: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/{id}", get(classroom_report))
}

/// Grade report for a classroom, as JSON or a downloadable xlsx workbook.
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = i32, Path, description = "Classroom id"),
        ("format" = Option<String>, Query, description = "json or xlsx (default)")
    ),
    responses(
        (status = 200, description = "Grade report", body = ReportJson),
        (status = 500, description = "Report generation failed")
    ),
    tag = "reports"
)]
async fn classroom_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let data = reports::classroom_grades(&state.db, id).await?;

    if query.format.as_deref() == Some("json") {
        return Ok(axum::Json(reports::to_json(&data)).into_response());
    }

    let buffer = reports::to_xlsx(&data)?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                reports::XLSX_CONTENT_TYPE.to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"grade-report-{}.xlsx\"", id),
            ),
        ],
        buffer,
    )
        .into_response())
}
