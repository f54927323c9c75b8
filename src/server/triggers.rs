// src/server/triggers.rs

//! Out-of-band triggers: push a message to one identified client or to all of them.
//!
//! Both are fire-and-forget. They always answer `"ok"` and never reveal who, if
//! anyone, received the payload.

use super::routes::AppState;
use crate::core::metrics;
use crate::core::protocol::RelayFrame;
use crate::core::state::ServerState;
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::info;

/// Query string of `/send-one`.
#[derive(Debug, Default, Deserialize)]
pub struct SendOneQuery {
    /// Hex identifier of the target client. A missing value matches nobody.
    #[serde(default)]
    pub client_id: String,
    /// Overrides the configured unicast payload.
    pub message: Option<String>,
}

/// Query string of `/send-many`.
#[derive(Debug, Default, Deserialize)]
pub struct SendManyQuery {
    /// Overrides the configured broadcast payload.
    pub message: Option<String>,
}

/// Sends the unicast payload to the client named in `query`, if connected.
pub fn send_one(state: &ServerState, query: SendOneQuery) {
    let payload = query
        .message
        .unwrap_or_else(|| state.config.triggers.unicast_message.clone());
    state.stats.increment_total_triggers();
    metrics::TRIGGER_INVOCATIONS_TOTAL
        .with_label_values(&["unicast"])
        .inc();
    let outcome = state
        .dispatcher
        .unicast(&query.client_id, RelayFrame::text(payload));
    info!(
        "Unicast trigger for client {:?} (matched={}).",
        query.client_id,
        outcome.delivered > 0
    );
}

/// Sends the broadcast payload to every connected client.
pub fn send_many(state: &ServerState, query: SendManyQuery) {
    let payload = query
        .message
        .unwrap_or_else(|| state.config.triggers.broadcast_message.clone());
    state.stats.increment_total_triggers();
    metrics::TRIGGER_INVOCATIONS_TOTAL
        .with_label_values(&["broadcast"])
        .inc();
    let outcome = state.dispatcher.broadcast_all(RelayFrame::text(payload));
    info!(
        "Broadcast trigger delivered to {} client(s).",
        outcome.delivered
    );
}

pub(crate) async fn send_one_handler(
    State(app): State<AppState>,
    Query(query): Query<SendOneQuery>,
) -> Json<&'static str> {
    send_one(&app.state, query);
    Json("ok")
}

pub(crate) async fn send_many_handler(
    State(app): State<AppState>,
    Query(query): Query<SendManyQuery>,
) -> Json<&'static str> {
    send_many(&app.state, query);
    Json("ok")
}
