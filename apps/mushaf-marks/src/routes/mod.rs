//! Route modules for the Mushaf Marks service

pub mod annotations;
pub mod groups;
pub mod health;
pub mod navigator;
pub mod units;

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{header, Method, Request, Response};

    use crate::config::Config;
    use crate::db::memory_pool;
    use crate::marks::MarksRepository;
    use crate::state::AppState;
    use crate::verses::test_support::seed_verses;
    use crate::verses::VerseRepository;

    /// State over one in-memory database holding both marks and verses
    pub async fn test_state(rows: &[(i64, i64, i64, &str)]) -> AppState {
        let pool = memory_pool().await.unwrap();
        seed_verses(&pool, rows).await;
        let marks = MarksRepository::new(pool.clone());
        marks.init().await.unwrap();
        AppState::new(Config::default(), marks, VerseRepository::new(pool))
    }

    pub fn request(method: Method, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
