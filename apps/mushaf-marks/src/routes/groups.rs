//! Mutashabih group routes

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use crate::error::Result;
use crate::marks::{Changes, Created, Group, GroupPatch, MarkStore, MarksRepository, NewGroup};
use crate::routes::annotations::MarksState;
use crate::state::AppState;

/// Create the groups router
pub fn router(repo: MarksRepository) -> Router<AppState> {
    let state = MarksState { repo };

    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/:id", patch(update_group).delete(delete_group))
        .route("/:id/apply-color", post(apply_color))
        .layer(axum::Extension(state))
}

async fn list_groups(
    axum::Extension(state): axum::Extension<MarksState>,
) -> Result<Json<Vec<Group>>> {
    let groups = state.repo.list_groups().await?;
    Ok(Json(groups))
}

async fn create_group(
    axum::Extension(state): axum::Extension<MarksState>,
    Json(payload): Json<NewGroup>,
) -> Result<(StatusCode, Json<Created>)> {
    let created = state.repo.create_group(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_group(
    axum::Extension(state): axum::Extension<MarksState>,
    Path(id): Path<String>,
    Json(patch): Json<GroupPatch>,
) -> Result<Json<Changes>> {
    let changes = state.repo.update_group(&id, &patch).await?;
    Ok(Json(changes))
}

/// Delete a group; its members keep their color and `groupId`
async fn delete_group(
    axum::Extension(state): axum::Extension<MarksState>,
    Path(id): Path<String>,
) -> Result<Json<Changes>> {
    let changes = state.repo.delete_group(&id).await?;
    Ok(Json(changes))
}

/// Copy the group's color onto all of its mutashabih members
async fn apply_color(
    axum::Extension(state): axum::Extension<MarksState>,
    Path(id): Path<String>,
) -> Result<Json<Changes>> {
    let changes = state.repo.apply_group_color(&id).await?;
    Ok(Json(changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::test_support::new_annotation;
    use crate::marks::AnnotationType;
    use crate::routes::test_support::{body_json, request, test_state};
    use axum::http::Method;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_group_lifecycle_and_recolor() {
        let state = test_state(&[]).await;
        let repo = state.marks().clone();
        let app = router(repo.clone()).with_state(state);

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/", Some(r##"{"color": "#ff0000"}"##)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let group_id = body_json(response).await["id"].as_str().unwrap().to_string();

        let mut member = new_annotation(AnnotationType::Mutashabih, (1, 0), (1, 3));
        member.color = Some("#ff0000".to_string());
        member.group_id = Some(group_id.clone());
        let member = repo.create_annotation(&member).await.unwrap();

        let response = app
            .clone()
            .oneshot(request(
                Method::PATCH,
                &format!("/{}", group_id),
                Some(r##"{"color": "#00ff00", "label": "pair"}"##),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["changes"], 1);

        let response = app
            .clone()
            .oneshot(request(Method::POST, &format!("/{}/apply-color", group_id), None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["changes"], 1);
        let recolored = repo.get_annotation(&member.id).await.unwrap().unwrap();
        assert_eq!(recolored.color.as_deref(), Some("#00ff00"));

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/", None))
            .await
            .unwrap();
        let groups = body_json(response).await;
        assert_eq!(groups[0]["label"], "pair");

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, &format!("/{}", group_id), None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["changes"], 1);

        let kept = repo.get_annotation(&member.id).await.unwrap().unwrap();
        assert_eq!(kept.group_id.as_deref(), Some(group_id.as_str()));
    }

    #[tokio::test]
    async fn test_apply_color_to_missing_group() {
        let state = test_state(&[]).await;
        let app = router(state.marks().clone()).with_state(state);

        let response = app
            .oneshot(request(Method::POST, "/missing/apply-color", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
