use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Json` that reports malformed or incomplete bodies as 400 in the API's
/// error envelope instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Query-string counterpart of [`JsonBody`].
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        routing::{get, post},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        dto::enrollments::ProgressRequest,
        routes::params::{Pagination, SearchQuery},
    };

    fn app() -> Router {
        Router::new()
            .route(
                "/search",
                get(|QueryParams(q): QueryParams<SearchQuery>| async move { q.name }),
            )
            .route(
                "/list",
                get(|QueryParams(p): QueryParams<Pagination>| async move {
                    p.normalize().0.to_string()
                }),
            )
            .route(
                "/progress",
                post(|JsonBody(p): JsonBody<ProgressRequest>| async move {
                    p.progress.to_string()
                }),
            )
    }

    async fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn missing_search_term_is_a_json_bad_request() {
        let (status, body) = send(Request::get("/search").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["message"].as_str().unwrap().contains("name"));
        assert!(json["data"]["error"].is_string());
    }

    #[tokio::test]
    async fn search_term_is_extracted() {
        let (status, body) = send(
            Request::get("/search?name=rust")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"rust");
    }

    #[tokio::test]
    async fn non_numeric_page_is_a_json_bad_request() {
        let (status, body) = send(
            Request::get("/list?page=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_bad_request() {
        let (status, body) = send(
            Request::post("/progress")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"progress":"lots"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["data"]["error"].is_string());
    }
}
