mod credentials;
mod gemini;
mod http;
mod metrics;
mod models;
mod normalize;
mod stylist;
mod weather;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::{ApiError, ChatRequest, Inventory, ModelReply};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use stylist::{Stylist, StylistError, StylistErrorKind};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "stylist.api", "server crashed: {err}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let stylist = Stylist::from_env();
    let openapi_raw = include_str!("../docs/openapi.yaml");
    let openapi: serde_json::Value =
        serde_yaml::from_str(openapi_raw).unwrap_or(serde_json::json!({"openapi":"3.0.3"}));
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("prom recorder");

    let state = AppState {
        stylist,
        openapi: Arc::new(openapi),
        prometheus_handle,
    };

    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
        .route("/analyze-video", post(analyze_video))
        .route("/api/chat", post(chat))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit_from_env()));

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "stylist.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    stylist: Stylist,
    openapi: Arc<serde_json::Value>,
    prometheus_handle: PrometheusHandle,
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
/// - Auth: none
///
/// Returns a small JSON payload with `status` and `service`.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "stylist-api-rs",
    }))
}

async fn openapi_json(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Ok(key) = std::env::var("OPENAPI_KEY") {
        let presented = headers
            .get("X-Docs-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != key {
            return Err(AppError::Stylist(StylistError::invalid_input(
                "docs",
                "unauthorized",
            )));
        }
    }
    Ok(Json((*state.openapi).clone()))
}

async fn swagger_ui() -> axum::http::Response<String> {
    let html = r#"<!doctype html>
<html>
<head>
  <meta charset='utf-8'/>
  <title>Stylist API Docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: '/openapi.json', dom_id: '#swagger-ui' });
    };
  </script>
</body>
</html>"#;
    axum::http::Response::builder()
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.to_string())
        .unwrap()
}

fn body_limit_from_env() -> usize {
    std::env::var("REQUEST_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(100 * 1024 * 1024)
}

async fn metrics_endpoint(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::http::Response<String> {
    if let Ok(secret) = std::env::var("METRICS_KEY") {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return axum::http::Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .body("unauthorized".into())
                .unwrap();
        }
    }
    let body = state.prometheus_handle.render();
    axum::http::Response::builder()
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .unwrap()
}

/// Analyze an uploaded wardrobe video into a structured inventory.
///
/// - Method: `POST`
/// - Path: `/analyze-video`
/// - Body: multipart form with `file` (video) and optional `lat`/`lon`
/// - Response: `Inventory` (items + suggestion starter + welcome message)
async fn analyze_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Inventory>, AppError> {
    crate::metrics::inc_requests("/analyze-video");

    let mut video: Option<(Vec<u8>, String)> = None;
    let mut lat = None;
    let mut lon = None;
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        AppError::Stylist(StylistError::invalid_input("read_upload", err.to_string()))
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let mime = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "video/mp4".to_string());
                let bytes = field.bytes().await.map_err(|err| {
                    AppError::Stylist(StylistError::invalid_input("read_upload", err.to_string()))
                })?;
                video = Some((bytes.to_vec(), mime));
            }
            Some("lat") => {
                lat = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            Some("lon") => {
                lon = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            _ => {}
        }
    }

    let Some((bytes, mime)) = video else {
        return Err(AppError::Stylist(StylistError::invalid_input(
            "read_upload",
            "missing file field",
        )));
    };
    if bytes.is_empty() {
        return Err(AppError::Stylist(StylistError::invalid_input(
            "read_upload",
            "empty video upload",
        )));
    }

    info!(
        target = "stylist.api",
        bytes = bytes.len(),
        mime = %mime,
        has_location = lat.is_some() && lon.is_some(),
        "video analysis invoked",
    );

    let inventory = state.stylist.analyze(bytes, &mime, lat, lon).await?;
    Ok(Json(inventory))
}

/// Grounded outfit-advice chat turn.
///
/// - Method: `POST`
/// - Path: `/api/chat`
/// - Body: `ChatRequest`
/// - Response: `ModelReply` (`text`, `related_item_ids`, `sources`)
async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ModelReply>, AppError> {
    crate::metrics::inc_requests("/api/chat");
    info!(
        target = "stylist.api",
        history_len = payload.chat_history.len(),
        inventory_len = payload.inventory_context.len(),
        "chat invoked",
    );
    let reply = state.stylist.chat(payload).await?;
    Ok(Json(reply))
}

#[derive(Debug)]
enum AppError {
    Stylist(StylistError),
}

impl From<StylistError> for AppError {
    fn from(value: StylistError) -> Self {
        Self::Stylist(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Stylist(err) => {
                let status = match err.kind() {
                    StylistErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    StylistErrorKind::NoCredentials => StatusCode::SERVICE_UNAVAILABLE,
                    StylistErrorKind::AssetProcessing | StylistErrorKind::Upstream => {
                        StatusCode::BAD_GATEWAY
                    }
                    StylistErrorKind::AssetTimeout => StatusCode::GATEWAY_TIMEOUT,
                };
                let payload = ApiError {
                    error: err.stage().to_string(),
                    detail: Some(err.detail().to_string()),
                };
                (status, Json(payload)).into_response()
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
