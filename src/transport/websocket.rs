//! WebSocket server
//!
//! Accepts TCP connections and upgrades each one to a WebSocket. The
//! upgrade request must carry `Authorization: Bearer <token>`; the token is
//! resolved to a user id inside the handshake callback, so unauthenticated
//! clients are refused with HTTP 401 before any WebSocket traffic flows and
//! the hub only ever sees resolved identities.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tracing::{debug, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::http::header::AUTHORIZATION;

use crate::auth::{AuthValidator, bearer_token};
use crate::config::Settings;
use crate::hub::Hub;
use crate::hub::message::UserId;
use crate::utils::HubError;

/// Binds `server.host:server.port` and serves WebSocket clients forever.
pub async fn start_websocket_server(
    settings: &Settings,
    hub: Hub,
    validator: Arc<dyn AuthValidator>,
) -> Result<(), HubError> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("WebSocket server listening on ws://{addr}{}", settings.server.ws_path);

    serve(listener, hub, validator, &settings.server.ws_path).await;
    Ok(())
}

/// Accept loop over an already bound listener.
pub async fn serve(
    listener: TcpListener,
    hub: Hub,
    validator: Arc<dyn AuthValidator>,
    ws_path: &str,
) {
    let ws_path: Arc<str> = Arc::from(ws_path);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("failed to accept connection: {e}");
                continue;
            }
        };

        tokio::spawn(handle_stream(
            stream,
            peer,
            hub.clone(),
            validator.clone(),
            ws_path.clone(),
        ));
    }
}

fn error_response(status: StatusCode, body: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(body.to_string()));
    *response.status_mut() = status;
    response
}

async fn handle_stream(
    stream: TcpStream,
    peer: SocketAddr,
    hub: Hub,
    validator: Arc<dyn AuthValidator>,
    ws_path: Arc<str>,
) {
    let mut user_id: Option<UserId> = None;

    let authenticate = |request: &Request, response: Response| {
        if request.uri().path() != &*ws_path {
            return Err(error_response(StatusCode::NOT_FOUND, "Not Found"));
        }
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        match bearer_token(header).and_then(|token| validator.validate(token)) {
            Ok(id) => {
                user_id = Some(id);
                Ok(response)
            }
            Err(e) => {
                warn!(%peer, "rejecting upgrade: {e}");
                Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
    };

    let ws_stream = match accept_hdr_async(stream, authenticate).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(%peer, "WebSocket handshake failed: {e}");
            return;
        }
    };

    let Some(user_id) = user_id else {
        return;
    };

    if hub.on_connect(user_id, ws_stream).await.is_ok() {
        debug!(%peer, user_id, "connection handed to hub");
    }
}
