//! HTTP and WebSocket surface.
//!
//! - `POST /api/download` validates the request and starts a job
//! - `GET /ws` streams every progress event to the connected client
//! - `GET /api/download-file/{filename}` serves a finished file, then schedules its deletion
//! - `GET /health` liveness probe
//! - `GET /` serves `index.html`; `/static/*` serves the rest of the front-end

use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::validation::{validate_served_filename, validate_youtube_url};
use crate::download::broadcaster::{Broadcaster, Subscription};
use crate::download::orchestrator::Downloader;
use crate::download::quality::Quality;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    downloader: Arc<Downloader>,
    cleanup_delay: Duration,
}

impl AppState {
    pub fn new(downloader: Arc<Downloader>) -> Self {
        Self {
            downloader,
            cleanup_delay: config::download::cleanup_delay(),
        }
    }

    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }
}

/// Body of `POST /api/download`.
#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default)]
    pub quality: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

/// Builds the application router.
pub fn router(state: AppState, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/api/download", post(download_handler))
        .route("/ws", get(ws_handler))
        .route("/api/download-file/{filename}", get(file_handler))
        .route("/health", get(health_handler))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server and serve until the listener fails.
pub async fn start_web_server(port: u16, downloader: Arc<Downloader>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::new(downloader), config::STATIC_DIR.as_path());

    log::info!("Starting web server on http://{}", addr);
    log::info!("  POST /api/download  - Start a download job");
    log::info!("  GET  /ws            - Progress event stream (WebSocket)");
    log::info!("  GET  /api/download-file/{{filename}} - Fetch a finished file");
    log::info!("  GET  /health        - Health check");
    log::info!("  GET  /static/*      - Static files from {}", config::STATIC_DIR.display());

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// POST /api/download: validates and starts a job, answering before it completes.
async fn download_handler(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if let Err(e) = validate_youtube_url(&request.url) {
        log::warn!("Rejected download request: {}", e);
        return Err(e.into());
    }

    let quality = Quality::parse(&request.quality);
    log::info!("Accepted download request: {} (quality: {})", request.url.trim(), quality.as_str());

    // Detached: the job reports through the broadcaster.
    drop(state.downloader.spawn(request.url.trim().to_string(), quality));

    Ok(Json(json!({ "success": true, "message": "download started" })))
}

/// GET /ws: upgrades and streams events.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let broadcaster = Arc::clone(state.downloader.broadcaster());
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

/// Forwards broadcaster events to one client until either side goes away.
async fn handle_socket(socket: WebSocket, broadcaster: Arc<Broadcaster>) {
    let (mut sender, mut receiver) = socket.split();
    let Subscription { id, receiver: mut events } = broadcaster.subscribe();

    let mut heartbeat = tokio::time::interval(Duration::from_secs(config::broadcast::HEARTBEAT_INTERVAL_SECS));
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(payload) => {
                        if sender.send(Message::Text(payload.to_string().into())).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    None => break, // Dropped by the broadcaster
                }
            }

            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::<u8>::new().into())).await.is_err() {
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        log::debug!("WebSocket read error for subscriber {}: {}", id, e);
                        break;
                    }
                }
            }
        }
    }

    broadcaster.unsubscribe(id);
}

/// GET /api/download-file/{filename}: streams a finished file as an attachment.
async fn file_handler(Path(name): Path<String>, State(state): State<AppState>) -> Response {
    let name = match validate_served_filename(&name) {
        Ok(name) => name,
        Err(e) => {
            log::warn!("Rejected file request: {}", e);
            return AppError::from(e).into_response();
        }
    };

    let path = state.downloader.download_dir().join(name);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "error": "file not found" })),
            )
                .into_response();
        }
    };

    log::info!("Serving {} (deletion in {}s)", path.display(), state.cleanup_delay.as_secs());
    schedule_cleanup(path, state.cleanup_delay);

    let headers = [
        (header::CONTENT_TYPE, content_type_for(name).to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(name)),
    ];
    (headers, Body::from_stream(ReaderStream::new(file))).into_response()
}

/// GET /health: simple health check.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "timestamp": chrono::Utc::now().timestamp() }))
}

/// Deletes a served file after `delay`.
fn schedule_cleanup(path: PathBuf, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::info!("🧹 Removed served file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove served file {}: {}", path.display(), e),
        }
    });
}

fn content_type_for(name: &str) -> &'static str {
    let ext = FsPath::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987 UTF-8 name.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", fallback, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::error::DownloadError;
    use crate::download::invoker::{MediaTool, ProbeResult, RunningTransfer, TransferPlan};
    use crate::download::strategy::{Strategy, StrategyCatalog};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    struct UnreachableTool;

    #[async_trait]
    impl MediaTool for UnreachableTool {
        async fn probe(&self, strategy: &Strategy, _url: &str) -> Result<ProbeResult, DownloadError> {
            Err(DownloadError::probe_failed(&strategy.name, "offline"))
        }

        async fn start_transfer(
            &self,
            _strategy: &Strategy,
            _url: &str,
            _plan: &TransferPlan,
        ) -> Result<RunningTransfer, DownloadError> {
            Err(DownloadError::TransferFailed("offline".to_string()))
        }
    }

    fn test_app(dir: &FsPath) -> (Router, Arc<Downloader>) {
        let catalog = StrategyCatalog::new(vec![Strategy::new("only", Vec::<String>::new())]).unwrap();
        let downloader = Arc::new(
            Downloader::new(Arc::new(UnreachableTool), catalog, Arc::new(Broadcaster::new()), dir)
                .with_backoff_step(Duration::ZERO),
        );
        let state = AppState::new(Arc::clone(&downloader)).with_cleanup_delay(Duration::from_secs(3600));
        (router(state, &dir.join("static")), downloader)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_download(body: &str) -> Request<Body> {
        Request::post("/api/download")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path());

        let response = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_download_rejects_non_youtube_url() {
        let dir = tempfile::tempdir().unwrap();
        let (app, downloader) = test_app(dir.path());
        let mut sub = downloader.broadcaster().subscribe();

        let response = app
            .oneshot(post_download(r#"{"url": "https://vimeo.com/123", "quality": "720p"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("vimeo.com"));
        // No job was started.
        tokio::task::yield_now().await;
        assert!(sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_download_accepts_and_acknowledges() {
        let dir = tempfile::tempdir().unwrap();
        let (app, downloader) = test_app(dir.path());
        let mut sub = downloader.broadcaster().subscribe();

        let response = app
            .oneshot(post_download(r#"{"url": "https://www.youtube.com/watch?v=abc"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, json!({ "success": true, "message": "download started" }));

        // The detached job runs to its terminal event.
        let mut last = None;
        while let Some(msg) = sub.receiver.recv().await {
            let event: serde_json::Value = serde_json::from_str(&msg).unwrap();
            let done = event["type"] == "error" || event["type"] == "success";
            last = Some(event);
            if done {
                break;
            }
        }
        assert_eq!(last.unwrap()["type"], "error");
    }

    #[tokio::test]
    async fn test_download_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path());

        let response = app.oneshot(post_download("{not json")).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_file_served_as_attachment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Test Video AB.mp4"), b"media-bytes").unwrap();
        let (app, _) = test_app(dir.path());

        let response = app
            .oneshot(Request::get("/api/download-file/Test%20Video%20AB.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"Test Video AB.mp4\""));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"media-bytes");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path());

        let response = app
            .oneshot(Request::get("/api/download-file/nothing.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path());

        let response = app
            .oneshot(Request::get("/api/download-file/..%2Fsecret.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    fn write_front_end(dir: &FsPath) {
        let static_dir = dir.join("static");
        std::fs::create_dir(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<h1>tubeloader</h1>").unwrap();
        std::fs::write(static_dir.join("app.js"), "connectWebSocket();").unwrap();
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        write_front_end(dir.path());
        let (app, _) = test_app(dir.path());

        let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>tubeloader</h1>");
    }

    #[tokio::test]
    async fn test_assets_served_under_static() {
        let dir = tempfile::tempdir().unwrap();
        write_front_end(dir.path());
        let (app, _) = test_app(dir.path());

        let response = app
            .clone()
            .oneshot(Request::get("/static/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"connectWebSocket();");

        // Assets are not mounted at the root.
        let response = app.oneshot(Request::get("/app.js").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_file_route_serves_finished_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Clip.mp4"), b"clip").unwrap();
        let (app, _) = test_app(dir.path());

        let old_route = app
            .clone()
            .oneshot(Request::get("/files/Clip.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(old_route.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(Request::get("/api/download-file/Clip.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cleanup_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.mp4");
        std::fs::write(&path, b"x").unwrap();

        schedule_cleanup(path.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!path.exists());
    }

    #[test]
    fn test_content_disposition_encodes_unicode() {
        assert_eq!(
            content_disposition("Vídeo 1.mp4"),
            "attachment; filename=\"V_deo 1.mp4\"; filename*=UTF-8''V%C3%ADdeo%201.mp4"
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.MKV"), "video/x-matroska");
        assert_eq!(content_type_for("a.webm"), "video/webm");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
