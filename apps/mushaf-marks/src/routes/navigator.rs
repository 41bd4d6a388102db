//! Navigation command routes
//!
//! The front end posts [`Command`]s here and carries out the returned
//! [`Effect`]. View state lives in the shared [`Navigator`](crate::commands::Navigator).

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::commands::{Command, Effect, View};
use crate::error::Result;
use crate::marks::{Annotation, MarkStore};
use crate::range::RowId;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(current_view))
        .route("/commands", post(dispatch))
        .route("/unit-loaded", post(unit_loaded))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorView {
    pub view: View,
    pub panel_open: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub effect: Effect,
    pub view: View,
    pub panel_open: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollTarget {
    pub row_id: Option<RowId>,
}

async fn current_view(State(state): State<AppState>) -> Json<NavigatorView> {
    let navigator = state.navigator().lock().await;
    Json(NavigatorView {
        view: navigator.view(),
        panel_open: navigator.panel_open(),
    })
}

async fn dispatch(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<CommandOutcome>> {
    // Jump targets may live in any unit, so look them up in the store
    let targets: Vec<Annotation> = match &command {
        Command::JumpToAnnotation { id } => {
            state.marks().get_annotation(id).await?.into_iter().collect()
        }
        _ => Vec::new(),
    };

    let mut navigator = state.navigator().lock().await;
    let effect = navigator.dispatch(command, &targets);
    tracing::debug!(?effect, "command dispatched");

    Ok(Json(CommandOutcome {
        effect,
        view: navigator.view(),
        panel_open: navigator.panel_open(),
    }))
}

/// Report that the requested unit is on screen; returns the deferred scroll row
async fn unit_loaded(State(state): State<AppState>) -> Json<ScrollTarget> {
    let row_id = state.navigator().lock().await.unit_loaded();
    Json(ScrollTarget { row_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::test_support::new_annotation;
    use crate::marks::AnnotationType;
    use crate::routes::test_support::{body_json, request, test_state};
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    async fn post(app: &Router, uri: &str, body: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(request(Method::POST, uri, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_commands_drive_view_state() {
        let app = router().with_state(test_state(&[]).await);

        let outcome = post(&app, "/commands", r#"{"command": "selectHizb", "hizb": 4}"#).await;
        assert_eq!(outcome["effect"]["effect"], "showQuarters");
        assert_eq!(outcome["view"]["view"], "quarters");

        let outcome = post(&app, "/commands", r#"{"command": "openAnnotationsPanel"}"#).await;
        assert_eq!(outcome["effect"]["effect"], "loadUnit");
        assert_eq!(outcome["effect"]["unit"]["hizb"], 4);
        assert_eq!(outcome["panelOpen"], true);

        let response = app
            .oneshot(request(Method::GET, "/", None))
            .await
            .unwrap();
        let view = body_json(response).await;
        assert_eq!(view["view"]["view"], "reading");
        assert_eq!(view["view"]["unit"]["quarter"], 1);
    }

    #[tokio::test]
    async fn test_jump_loads_target_unit_then_scrolls() {
        let state = test_state(&[]).await;
        let mut target = new_annotation(AnnotationType::Note, (900, 0), (900, 2));
        target.hizb = 30;
        target.quarter = 3;
        let created = state.marks().create_annotation(&target).await.unwrap();
        let app = router().with_state(state);

        post(&app, "/commands", r#"{"command": "openUnit", "hizb": 1, "quarter": 1}"#).await;
        let body = format!(r#"{{"command": "jumpToAnnotation", "id": "{}"}}"#, created.id);
        let outcome = post(&app, "/commands", &body).await;
        assert_eq!(outcome["effect"]["effect"], "loadUnit");
        assert_eq!(outcome["effect"]["unit"]["hizb"], 30);

        let scroll = post(&app, "/unit-loaded", "{}").await;
        assert_eq!(scroll["rowId"], 900);
        let scroll = post(&app, "/unit-loaded", "{}").await;
        assert!(scroll["rowId"].is_null());
    }

    #[tokio::test]
    async fn test_jump_to_missing_annotation_is_ignored() {
        let app = router().with_state(test_state(&[]).await);
        let outcome = post(
            &app,
            "/commands",
            r#"{"command": "jumpToAnnotation", "id": "gone"}"#,
        )
        .await;
        assert_eq!(outcome["effect"]["effect"], "none");
        assert_eq!(outcome["view"]["view"], "hizbs");
    }
}
