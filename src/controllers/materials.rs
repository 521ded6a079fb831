use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::models::material::{self, Entity as Material};
use crate::response::ApiResponse;
use crate::uploads::UploadedFile;

use super::AppState;

// ── Request / Response types ──

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsQuery {
    pub classroom_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialListItem {
    pub id: i32,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCreated {
    pub id: i32,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: NaiveDateTime,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route("/{id}", axum::routing::delete(delete_material))
        .route("/{id}/download", get(download_material))
}

// ── Handlers ──

/// Materials in a classroom, newest first.
#[utoipa::path(
    get,
    path = "/api/materials",
    params(("classroomId" = i32, Query, description = "Classroom id")),
    responses(
        (status = 200, description = "Materials", body = ApiResponse<Vec<MaterialListItem>>),
        (status = 400, description = "classroomId missing")
    ),
    tag = "materials",
    security(("bearer_auth" = []))
)]
async fn list_materials(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<MaterialsQuery>,
) -> Result<ApiResponse<Vec<MaterialListItem>>, AppError> {
    let classroom_id = query
        .classroom_id
        .ok_or_else(|| AppError::Validation("Classroom ID required".to_string()))?;

    let materials = Material::find()
        .filter(material::Column::ClassroomId.eq(classroom_id))
        .order_by_desc(material::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|m| MaterialListItem {
            id: m.id,
            title: m.title,
            kind: m.kind,
            url: m.url,
            file_name: m.file_name,
            file_type: m.file_type,
            file_size: m.file_size,
            created_at: m.created_at,
        })
        .collect();

    Ok(ApiResponse::success(materials))
}

/// Add a material: an external link, or an uploaded file.
#[utoipa::path(
    post,
    path = "/api/materials",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Material created", body = ApiResponse<MaterialCreated>),
        (status = 400, description = "Missing fields for the chosen type")
    ),
    tag = "materials",
    security(("bearer_auth" = []))
)]
async fn create_material(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut kind: Option<String> = None;
    let mut url: Option<String> = None;
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
            "type" => kind = Some(read_text(field).await?),
            "url" => url = Some(read_text(field).await?),
            "classroomId" => {
                classroom_id = Some(read_text(field).await?.parse().map_err(|_| {
                    AppError::Validation("classroomId must be an integer".to_string())
                })?)
            }
            "file" => file = Some(UploadedFile::from_field(field).await?),
            _ => {}
        }
    }

    let title =
        title.ok_or_else(|| AppError::Validation("Missing required field: title".to_string()))?;
    let kind =
        kind.ok_or_else(|| AppError::Validation("Missing required field: type".to_string()))?;
    let classroom_id = classroom_id.ok_or_else(|| {
        AppError::Validation("Missing required field: classroomId".to_string())
    })?;

    let mut new_material = material::ActiveModel {
        title: Set(title),
        description: Set(description),
        kind: Set(kind.clone()),
        classroom_id: Set(classroom_id),
        user_id: Set(user_id),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    match kind.as_str() {
        material::KIND_LINK => {
            let url = url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
                AppError::Validation("URL is required for link type".to_string())
            })?;
            new_material.url = Set(Some(url));
        }
        material::KIND_FILE => {
            let file = file.ok_or_else(|| {
                AppError::Validation("File is required for file type".to_string())
            })?;
            new_material.file_name = Set(Some(file.name));
            new_material.file_type = Set(Some(file.content_type));
            new_material.file_size = Set(Some(file.size));
            new_material.file_data = Set(Some(file.data));
        }
        other => {
            return Err(AppError::Validation(format!(
                "Unknown material type: {}",
                other
            )))
        }
    }

    let created = new_material.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(ApiResponse::success(MaterialCreated {
            id: created.id,
            title: created.title,
            kind: created.kind,
            created_at: created.created_at,
        })),
    ))
}

/// Download a file material's bytes.
#[utoipa::path(
    get,
    path = "/api/materials/{id}/download",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "No stored file")
    ),
    tag = "materials",
    security(("bearer_auth" = []))
)]
async fn download_material(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let material = Material::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let data = material
        .file_data
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let content_type = material
        .file_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let file_name = material.file_name.unwrap_or_else(|| "material".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        data,
    ))
}

/// Remove a material. The only hard delete in the API.
#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 204, description = "Material deleted"),
        (status = 404, description = "Material not found")
    ),
    tag = "materials",
    security(("bearer_auth" = []))
)]
async fn delete_material(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let material = Material::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Material not found".to_string()))?;

    material.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field: {}", e)))
}
