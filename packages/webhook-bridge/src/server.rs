//! HTTP surface.
//!
//! - `/` (any method): liveness text
//! - `POST <endpoint>`: one route per enabled bridge, form-encoded
//!   `token`, `user_name`, `text`. A body that is not a form reads as a
//!   message with every field empty, which fails authentication.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, post},
    Form, Router,
};
use tower_http::trace::TraceLayer;

use crate::bridge::{BridgeRoute, InboundMessage, RouteDecision};
use crate::config::Config;
use crate::delivery::DeliverySender;

/// Body served at `/`.
pub const INDEX_TEXT: &str = "This is webhook-bridge";

/// Body of the 401 returned for an unknown token.
pub const WRONG_TOKEN: &str = "Wrong token!";

/// Per-endpoint handler state. Every enabled bridge gets its own.
#[derive(Clone)]
struct BridgeState {
    route: Arc<BridgeRoute>,
    sender: DeliverySender,
}

/// Build the application router for `config`.
///
/// Disabled bridges get no route, so their paths fall through to 404.
pub fn build_router(config: &Config, sender: DeliverySender) -> Router {
    let mut app = Router::new().route("/", any(index_handler));

    for bridge in &config.bridges {
        if !bridge.enabled {
            tracing::info!(
                bridge = bridge.name.as_str(),
                endpoint = bridge.endpoint.as_str(),
                "[Bridge] Bridge disabled, not serving"
            );
            continue;
        }

        let state = BridgeState {
            route: Arc::new(BridgeRoute::new(bridge.clone(), config.relay_marker.as_str())),
            sender: sender.clone(),
        };
        app = app.merge(
            Router::new()
                .route(&bridge.endpoint, post(inbound_handler))
                .with_state(state),
        );

        tracing::info!(
            bridge = bridge.name.as_str(),
            endpoint = bridge.endpoint.as_str(),
            "[Bridge] Serving bridge"
        );
    }

    app.layer(TraceLayer::new_for_http())
}

fn peer(remote: &Option<ConnectInfo<SocketAddr>>) -> String {
    match remote {
        Some(ConnectInfo(addr)) => addr.to_string(),
        None => "unknown".to_string(),
    }
}

// ── Route Handlers ────────────────────────────────────────────────────────────

async fn index_handler(remote: Option<ConnectInfo<SocketAddr>>) -> &'static str {
    tracing::info!(remote = peer(&remote).as_str(), "Request to index");
    INDEX_TEXT
}

/// Authenticate, route and relay one outgoing-webhook call.
///
/// Answers 200 whatever happens to the delivery; only an unknown token is
/// reported back to the caller.
async fn inbound_handler(
    State(state): State<BridgeState>,
    remote: Option<ConnectInfo<SocketAddr>>,
    form: Result<Form<InboundMessage>, FormRejection>,
) -> Response {
    let route = state.route.as_ref();
    let bridge = route.name();
    tracing::info!(
        bridge = bridge,
        remote = peer(&remote).as_str(),
        "[Bridge] Bridge called"
    );

    let msg = match form {
        Ok(Form(msg)) => msg,
        Err(e) => {
            tracing::debug!(bridge = bridge, error = %e, "[Bridge] Unreadable form body");
            InboundMessage::default()
        }
    };

    match route.route(&msg) {
        RouteDecision::Unauthorized => {
            tracing::warn!(bridge = bridge, "[Bridge] Wrong token");
            return (StatusCode::UNAUTHORIZED, WRONG_TOKEN).into_response();
        }
        RouteDecision::Suppressed { direction } => {
            tracing::info!(
                bridge = bridge,
                user = msg.user_name.as_str(),
                from = %direction.origin(),
                "[Bridge] Not reposting our own relay"
            );
        }
        RouteDecision::NoDestination { direction } => {
            tracing::warn!(
                bridge = bridge,
                user = msg.user_name.as_str(),
                to = %direction.destination(),
                "[Bridge] Destination side has no url, dropping message"
            );
        }
        RouteDecision::Forward {
            direction,
            url,
            payload,
        } => {
            tracing::info!(
                bridge = bridge,
                user = msg.user_name.as_str(),
                from = %direction.origin(),
                to = %direction.destination(),
                "[Bridge] Relaying message"
            );

            match state.sender.send(url, &payload).await {
                Ok(status) => tracing::info!(
                    bridge = bridge,
                    status = status.as_u16(),
                    "[Delivery] Outgoing webhook sent"
                ),
                Err(e) => tracing::error!(
                    bridge = bridge,
                    error = %e,
                    "[Delivery] Outgoing webhook failed"
                ),
            }
        }
    }

    StatusCode::OK.into_response()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
