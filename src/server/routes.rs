// src/server/routes.rs

//! Builds the HTTP router: the WebSocket upgrade route and the trigger routes.

use super::triggers::{send_many_handler, send_one_handler};
use crate::config::{SEND_MANY_PATH, SEND_ONE_PATH};
use crate::connection;
use crate::core::RelayError;
use crate::core::metrics;
use crate::core::state::ServerState;
use axum::Router;
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// State shared by every route.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) state: Arc<ServerState>,
    pub(crate) shutdown_tx: broadcast::Sender<()>,
}

/// Builds the router. Serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()`, since sessions derive
/// their identity from the peer address.
pub fn build_router(state: Arc<ServerState>, shutdown_tx: broadcast::Sender<()>) -> Router {
    let ws_path = state.config.relay.ws_path.clone();
    let triggers_enabled = state.config.triggers.enabled;
    let app_state = AppState { state, shutdown_tx };

    let router = Router::new().route(&ws_path, get(ws_upgrade_handler));
    let router = if triggers_enabled {
        router
            .route(SEND_ONE_PATH, get(send_one_handler))
            .route(SEND_MANY_PATH, get(send_many_handler))
    } else {
        router
    };
    router.with_state(app_state)
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(app): State<AppState>,
) -> Response {
    // Admission happens before the upgrade, so a rejected peer never reaches
    // the registry.
    let permit = match app.state.connection_permits.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            metrics::HANDSHAKE_REJECTIONS_TOTAL.inc();
            let err = RelayError::CapacityExhausted(app.state.config.max_clients);
            warn!("Rejecting WebSocket connection from {}: {}", addr, err);
            return (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response();
        }
    };

    let state = app.state.clone();
    let shutdown_rx = app.shutdown_tx.subscribe();
    ws.on_failed_upgrade(move |e| {
        metrics::HANDSHAKE_REJECTIONS_TOTAL.inc();
        warn!("WebSocket upgrade failed for {}: {}", addr, e);
    })
    .on_upgrade(move |socket| connection::serve(socket, addr, state, shutdown_rx, permit))
}
