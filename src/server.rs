//! Archive HTTP server.
//!
//! Serves `GET /healthcheck` and the archived digest pages under
//! `GET /archive/{*path}`. Every request first passes a sanitizer that rejects
//! `..` anywhere in the raw path and turns directory-style paths (trailing `/`)
//! into 404s. The file handler then accepts only plain components in the
//! percent-decoded path, so the archive tree can never be listed or escaped.

use std::future::Future;
use std::path::{Component, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

#[derive(Debug)]
struct ArchiveState {
    base_dir: PathBuf,
}

/// Build the router for an archive rooted at `base_dir`.
pub fn router(base_dir: PathBuf) -> Router {
    let state = Arc::new(ArchiveState { base_dir });

    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/archive/{*path}", get(serve_archive_file))
        .with_state(state)
        .layer(middleware::from_fn(sanitize_request))
}

/// Bind `listen` and serve until `shutdown` resolves.
pub async fn serve(
    listen: &str,
    base_dir: PathBuf,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind archive server to {listen}"))?;
    tracing::info!(addr = %listen, base = %base_dir.display(), "archive server listening");

    axum::serve(listener, router(base_dir))
        .with_graceful_shutdown(shutdown)
        .await
        .context("archive server failed")?;

    tracing::info!("archive server shut down");
    Ok(())
}

async fn sanitize_request(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if path.contains("..") {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    }
    if path.len() > 1 && path.ends_with('/') {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

async fn healthcheck() -> &'static str {
    "OK"
}

async fn serve_archive_file(
    State(state): State<Arc<ArchiveState>>,
    Path(path): Path<String>,
) -> Response {
    let Some(relative) = archive_relative_path(&path) else {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };
    let file_path = state.base_dir.join(relative);

    match tokio::fs::metadata(&file_path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    match tokio::fs::read(&file_path).await {
        Ok(bytes) => Response::builder()
            .header(header::CONTENT_TYPE, content_type(&file_path))
            .body(Body::from(bytes))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => {
            tracing::warn!(path = %file_path.display(), error = %e, "failed to read archive file");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// The decoded wildcard as a path below the archive base, or `None` if it
/// holds anything but plain names (`..`, `.`, a root or a drive prefix).
fn archive_relative_path(decoded: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in std::path::Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(name) => relative.push(name),
            _ => return None,
        }
    }
    Some(relative)
}

fn content_type(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn archive_with_page() -> tempfile::TempDir {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("tech")).unwrap();
        std::fs::write(tmp.path().join("tech/2024-01-01.html"), "<p>digest</p>").unwrap();
        tmp
    }

    #[tokio::test]
    async fn healthcheck_is_ok() {
        let tmp = tempfile::TempDir::new().unwrap();
        let response = router(tmp.path().to_path_buf())
            .oneshot(get_request("/healthcheck"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn serves_archived_page() {
        let tmp = archive_with_page();
        let response = router(tmp.path().to_path_buf())
            .oneshot(get_request("/archive/tech/2024-01-01.html"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<p>digest</p>");
    }

    #[tokio::test]
    async fn dot_dot_is_rejected() {
        let tmp = archive_with_page();
        let response = router(tmp.path().to_path_buf())
            .oneshot(get_request("/archive/tech/../../etc/passwd"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn encoded_dot_dot_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let base = tmp.path().join("archive");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(tmp.path().join("secret.txt"), "TOP-SECRET").unwrap();
        let app = router(base);

        for uri in [
            "/archive/%2e%2e/secret.txt",
            "/archive/%2E%2E%2Fsecret.txt",
            "/archive/tech/%2e%2e/%2e%2e/secret.txt",
        ] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert!(!body.windows(10).any(|w| w == b"TOP-SECRET"), "{uri}");
        }
    }

    #[test]
    fn relative_path_accepts_only_plain_names() {
        assert_eq!(
            archive_relative_path("tech/2024-01-01.html"),
            Some(PathBuf::from("tech/2024-01-01.html"))
        );
        assert_eq!(archive_relative_path("../x"), None);
        assert_eq!(archive_relative_path("a/./b"), Some(PathBuf::from("a/b")));
    }

    #[tokio::test]
    async fn directory_paths_are_not_listed() {
        let tmp = archive_with_page();
        let app = router(tmp.path().to_path_buf());

        let response = app.clone().oneshot(get_request("/archive/tech/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get_request("/archive/tech")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let tmp = archive_with_page();
        let response = router(tmp.path().to_path_buf())
            .oneshot(get_request("/archive/tech/2099-01-01.html"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
