//! Axum route handlers for the viewer backend.

use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::domain::model::{BucketObject, PublicToken, TranslationStatus};
use crate::domain::ports::ModelService;
use crate::utils::error::{Result, ViewerError};

// ── Shared state ─────────────────────────────────────────────────────────────

pub type SharedService = Arc<dyn ModelService>;

#[derive(Clone)]
pub struct AppState {
    pub service: SharedService,
    pub max_upload_mb: usize,
}

const FILE_FIELD: &str = "model-file";
const ENTRYPOINT_FIELD: &str = "model-zip-entrypoint";

#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// viewer 前端的靜態檔目錄
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn create_router(service: SharedService, options: RouterOptions) -> Router {
    let state = AppState {
        service,
        max_upload_mb: options.max_upload_bytes / (1024 * 1024),
    };

    Router::new()
        .route("/api/auth/token", get(get_access_token))
        .route("/api/models", get(get_models).post(upload_and_translate_model))
        .route("/api/models/{urn}/status", get(get_model_status))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .with_state(state)
        .fallback_service(ServeDir::new(options.static_dir))
        .layer(TraceLayer::new_for_http())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `GET /api/auth/token`: viewer-scoped token for the browser.
pub async fn get_access_token(State(state): State<AppState>) -> Result<Json<PublicToken>> {
    let token = state.service.public_token().await?;
    Ok(Json(PublicToken::from(&token)))
}

/// `GET /api/models`: every object in the application bucket.
pub async fn get_models(State(state): State<AppState>) -> Result<Json<Vec<BucketObject>>> {
    Ok(Json(state.service.list_models().await?))
}

/// `GET /api/models/{urn}/status`
pub async fn get_model_status(
    State(state): State<AppState>,
    Path(urn): Path<String>,
) -> Result<Json<TranslationStatus>> {
    Ok(Json(state.service.translation_status(&urn).await?))
}

/// `POST /api/models`: upload a model and start its translation.
///
/// Expects `multipart/form-data` with a `model-file` file part and an
/// optional `model-zip-entrypoint` text part.
pub async fn upload_and_translate_model(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BucketObject>> {
    let limit_mb = state.max_upload_mb;
    let mut file: Option<(String, Bytes)> = None;
    let mut entrypoint: Option<String> = None;

    let multipart_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ViewerError::UploadTooLarge { limit_mb }
        } else {
            ViewerError::invalid_request(format!("malformed multipart body: {}", e.body_text()))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        ViewerError::invalid_request(format!("'{}' must be a file part", FILE_FIELD))
                    })?;
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, data));
            }
            Some(ENTRYPOINT_FIELD) => {
                entrypoint = Some(field.text().await.map_err(multipart_error)?);
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (file_name, data) = file.ok_or_else(|| {
        ViewerError::invalid_request(format!("missing '{}' in upload form", FILE_FIELD))
    })?;

    tracing::info!("📥 Received '{}' ({} bytes)", file_name, data.len());
    let object = state
        .service
        .upload_model(&file_name, data, entrypoint.as_deref())
        .await?;
    Ok(Json(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Token;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-VIEWER-TEST-BOUNDARY";

    #[derive(Default)]
    struct MockModelService {
        uploads: Mutex<Vec<(String, usize, Option<String>)>>,
    }

    #[async_trait]
    impl ModelService for MockModelService {
        async fn public_token(&self) -> Result<Token> {
            Token::new("viewer-token".to_string(), 3600)
        }

        async fn list_models(&self) -> Result<Vec<BucketObject>> {
            Ok(vec![BucketObject {
                name: "house.rvt".to_string(),
                urn: "dXJuOmhvdXNl".to_string(),
            }])
        }

        async fn upload_model(
            &self,
            file_name: &str,
            content: Bytes,
            entrypoint: Option<&str>,
        ) -> Result<BucketObject> {
            self.uploads.lock().unwrap().push((
                file_name.to_string(),
                content.len(),
                entrypoint.map(str::to_string),
            ));
            Ok(BucketObject {
                name: file_name.to_string(),
                urn: "dXJuOnVwbG9hZGVk".to_string(),
            })
        }

        async fn translation_status(&self, urn: &str) -> Result<TranslationStatus> {
            if urn == "missing" {
                return Err(ViewerError::api(500, "manifest service unavailable"));
            }
            Ok(TranslationStatus {
                status: "success".to_string(),
                progress: "complete".to_string(),
                messages: vec![],
            })
        }
    }

    fn test_router(service: Arc<MockModelService>, static_dir: PathBuf) -> Router {
        create_router(
            service,
            RouterOptions {
                static_dir,
                max_upload_bytes: 1024,
            },
        )
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/models")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let app = test_router(Arc::default(), PathBuf::from("wwwroot"));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_token_route_shape() {
        let app = test_router(Arc::default(), PathBuf::from("wwwroot"));
        let req = Request::builder()
            .uri("/api/auth/token")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["access_token"], "viewer-token");
        let expires_in = body["expires_in"].as_i64().unwrap();
        assert!((3599..=3600).contains(&expires_in));
    }

    #[tokio::test]
    async fn test_models_route_lists_objects() {
        let app = test_router(Arc::default(), PathBuf::from("wwwroot"));
        let req = Request::builder().uri("/api/models").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!([{"name": "house.rvt", "urn": "dXJuOmhvdXNl"}])
        );
    }

    #[tokio::test]
    async fn test_status_route() {
        let app = test_router(Arc::default(), PathBuf::from("wwwroot"));
        let req = Request::builder()
            .uri("/api/models/dXJuOmhvdXNl/status")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({"status": "success", "progress": "complete", "messages": []})
        );
    }

    #[tokio::test]
    async fn test_status_route_upstream_failure_is_bad_gateway() {
        let app = test_router(Arc::default(), PathBuf::from("wwwroot"));
        let req = Request::builder()
            .uri("/api/models/missing/status")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_upload_with_entrypoint() {
        let service = Arc::new(MockModelService::default());
        let app = test_router(service.clone(), PathBuf::from("wwwroot"));

        let body = multipart_body(&[
            ("model-zip-entrypoint", None, &b"assembly/main.iam"[..]),
            ("model-file", Some("assembly.zip"), &b"PK fake zip"[..]),
        ]);
        let resp = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({"name": "assembly.zip", "urn": "dXJuOnVwbG9hZGVk"})
        );

        let uploads = service.uploads.lock().unwrap();
        assert_eq!(
            uploads.as_slice(),
            &[(
                "assembly.zip".to_string(),
                11,
                Some("assembly/main.iam".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_upload_without_file_is_bad_request() {
        let service = Arc::new(MockModelService::default());
        let app = test_router(service.clone(), PathBuf::from("wwwroot"));

        let body = multipart_body(&[("model-zip-entrypoint", None, &b"main.iam"[..])]);
        let resp = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["error"]
            .as_str()
            .unwrap()
            .contains("model-file"));
        assert!(service.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let service = Arc::new(MockModelService::default());
        let app = test_router(service.clone(), PathBuf::from("wwwroot"));

        let big = vec![0u8; 4096];
        let body = multipart_body(&[("model-file", Some("big.rvt"), &big[..])]);
        let resp = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(service.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>viewer</html>").unwrap();

        let app = test_router(Arc::default(), dir.path().to_path_buf());
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"<html>viewer</html>");
    }
}
