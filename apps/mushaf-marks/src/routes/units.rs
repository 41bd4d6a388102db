//! Reading unit routes
//!
//! Each request opens a [`ReadingSession`](crate::session::ReadingSession)
//! on the addressed unit, so responses carry the rendered segments and
//! creation goes through range validation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::marks::{Annotation, AnnotationFilter};
use crate::range::{RenderedRow, TextAnchor};
use crate::session::{AnnotationRequest, GroupSummary};
use crate::state::AppState;
use crate::verses::{QuarterPreview, UnitId, VerseRow, HIZB_COUNT};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/units/:hizb/:quarter", get(get_unit))
        .route("/units/:hizb/:quarter/selection", post(select))
        .route("/units/:hizb/:quarter/annotations", post(create_annotation))
        .route("/hizbs/:hizb/quarters", get(list_quarters))
}

/// Everything the reader needs to draw one unit
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitView {
    pub unit: UnitId,
    pub rows: Vec<VerseRow>,
    pub rendered: Vec<RenderedRow>,
    pub annotations: Vec<Annotation>,
    pub groups: Vec<GroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<UnitId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<UnitId>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub anchor: TextAnchor,
    pub focus: TextAnchor,
}

fn unit_id(hizb: i64, quarter: i64) -> Result<UnitId> {
    UnitId::new(hizb, quarter).ok_or_else(|| {
        AppError::BadRequest(format!("No such unit: hizb {} quarter {}", hizb, quarter))
    })
}

async fn get_unit(
    State(state): State<AppState>,
    Path((hizb, quarter)): Path<(i64, i64)>,
) -> Result<Json<UnitView>> {
    let unit = unit_id(hizb, quarter)?;
    let session = state.session(unit).await?;

    let annotations = session
        .annotations(&AnnotationFilter::unit(hizb, quarter))
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(UnitView {
        unit,
        rows: session.unit().rows().to_vec(),
        rendered: session.render().to_vec(),
        annotations,
        groups: session.group_summaries(),
        next: unit.next(),
        prev: unit.prev(),
    }))
}

/// Resolve a live selection; 204 when it is empty or outside the rows
async fn select(
    State(state): State<AppState>,
    Path((hizb, quarter)): Path<(i64, i64)>,
    Json(request): Json<SelectionRequest>,
) -> Result<Response> {
    let session = state.session(unit_id(hizb, quarter)?).await?;
    match session.select(&request.anchor, &request.focus) {
        Some(selection) => Ok(Json(selection).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Validate a range against the unit's rows and persist the annotation
async fn create_annotation(
    State(state): State<AppState>,
    Path((hizb, quarter)): Path<(i64, i64)>,
    Json(request): Json<AnnotationRequest>,
) -> Result<(StatusCode, Json<Annotation>)> {
    let mut session = state.session(unit_id(hizb, quarter)?).await?;
    let annotation = session.create_annotation(request).await?;
    tracing::info!(
        id = %annotation.id,
        kind = %annotation.annotation_type,
        hizb,
        quarter,
        "annotation created"
    );
    Ok((StatusCode::CREATED, Json(annotation)))
}

async fn list_quarters(
    State(state): State<AppState>,
    Path(hizb): Path<i64>,
) -> Result<Json<Vec<QuarterPreview>>> {
    if !(1..=HIZB_COUNT).contains(&hizb) {
        return Err(AppError::BadRequest(format!("No such hizb: {}", hizb)));
    }
    let previews = state.verses().quarter_previews(hizb).await?;
    Ok(Json(previews))
}
