use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::CommandError;
use crate::handler::SharedCommandHandler;
use crate::inventory::Device;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
    devices: usize,
}

/// Request body for POST /v1/command
#[derive(Debug, Deserialize)]
struct CommandRequest {
    command: String,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    version: &'static str,
    handler: Arc<SharedCommandHandler>,
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<AppState>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
            devices: state.handler.inventory().snapshot().len(),
        }),
    )
}

/// Handler for POST /v1/command
///
/// Replies 200 with a plain-text summary of what changed, or 500 with the
/// error message.
#[tracing::instrument(skip(state))]
async fn command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Result<String, CommandError> {
    let outcome = state.handler.handle(&req.command).await?;
    Ok(format!("Command executed successfully. {}", outcome))
}

/// Handler for GET /v1/devices
#[tracing::instrument(skip(state))]
async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.handler.inventory().snapshot();
    Json(Vec::clone(&snapshot))
}

/// Handler for PUT /v1/devices
///
/// Replaces the whole inventory.
#[tracing::instrument(skip(state, devices))]
async fn replace_devices(
    State(state): State<AppState>,
    Json(devices): Json<Vec<Device>>,
) -> impl IntoResponse {
    state.handler.inventory().update(devices);
    StatusCode::NO_CONTENT
}

/// Create the API router with all endpoints
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/command", post(command))
        .route("/v1/devices", get(list_devices).put(replace_devices))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// This function will bind to the specified address and serve the API endpoints.
/// It will run until the provided shutdown signal is triggered.
///
/// # Arguments
/// * `listen` - The IP address to listen on (e.g., "127.0.0.1")
/// * `port` - The port to listen on (e.g., 8566)
/// * `handler` - The command pipeline behind POST /v1/command
/// * `shutdown_rx` - A oneshot receiver that will trigger graceful shutdown
///
/// # Returns
/// Returns Ok(()) if the server shuts down gracefully, or an error if startup fails
pub async fn serve(
    listen: String,
    port: u16,
    handler: Arc<SharedCommandHandler>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let version = env!("CARGO_PKG_VERSION");

    let state = AppState { version, handler };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    tracing::info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}
