//! Annotations API routes
//!
//! Direct access to stored annotations, one store call per request.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::marks::{
    Annotation, AnnotationFilter, AnnotationPatch, Changes, Created, MarkStore, MarksRepository,
    NewAnnotation,
};
use crate::state::AppState;
use crate::verses::UnitId;

/// Extended state with the marks repository
#[derive(Clone)]
pub struct MarksState {
    pub repo: MarksRepository,
}

/// Create the annotations router
pub fn router(repo: MarksRepository) -> Router<AppState> {
    let state = MarksState { repo };

    Router::new()
        .route("/", get(list_annotations).post(create_annotation))
        .route(
            "/:id",
            get(get_annotation)
                .patch(update_annotation)
                .delete(delete_annotation),
        )
        .layer(axum::Extension(state))
}

/// List annotations, optionally filtered by type, unit or group
async fn list_annotations(
    axum::Extension(state): axum::Extension<MarksState>,
    Query(filter): Query<AnnotationFilter>,
) -> Result<Json<Vec<Annotation>>> {
    let annotations = state.repo.list_annotations(&filter).await?;
    Ok(Json(annotations))
}

/// Store an annotation as given; ranges are not checked against verse text
async fn create_annotation(
    axum::Extension(state): axum::Extension<MarksState>,
    Json(payload): Json<NewAnnotation>,
) -> Result<(StatusCode, Json<Created>)> {
    if UnitId::new(payload.hizb, payload.quarter).is_none() {
        return Err(AppError::BadRequest(format!(
            "No such unit: hizb {} quarter {}",
            payload.hizb, payload.quarter
        )));
    }
    let created = state.repo.create_annotation(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_annotation(
    axum::Extension(state): axum::Extension<MarksState>,
    Path(id): Path<String>,
) -> Result<Json<Annotation>> {
    let annotation = state
        .repo
        .get_annotation(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Annotation not found: {}", id)))?;
    Ok(Json(annotation))
}

async fn update_annotation(
    axum::Extension(state): axum::Extension<MarksState>,
    Path(id): Path<String>,
    Json(patch): Json<AnnotationPatch>,
) -> Result<Json<Changes>> {
    let changes = state.repo.update_annotation(&id, &patch).await?;
    Ok(Json(changes))
}

async fn delete_annotation(
    axum::Extension(state): axum::Extension<MarksState>,
    Path(id): Path<String>,
) -> Result<Json<Changes>> {
    let changes = state.repo.delete_annotation(&id).await?;
    Ok(Json(changes))
}
