//! Webhook request authentication
//!
//! Every inbound telephony event passes this gate before the engine is
//! entered: signed requests (or loopback traffic during development) get
//! through, everything else is rejected with 403 and never touches a
//! session.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use call_agent_config::AuthConfig;
use call_agent_core::{RequestAuthenticator, RequestMetadata};

use crate::state::AppState;

/// Header the telephony provider signs requests with
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Shared-token signature gate
pub struct SignatureAuthenticator {
    enabled: bool,
    auth_token: Option<String>,
    allow_loopback: bool,
    public_paths: Vec<String>,
}

impl SignatureAuthenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            enabled: config.enabled,
            auth_token: config.auth_token.clone(),
            allow_loopback: config.allow_loopback,
            public_paths: config.public_paths.clone(),
        }
    }
}

impl RequestAuthenticator for SignatureAuthenticator {
    fn verify(&self, meta: &RequestMetadata) -> bool {
        if !self.enabled {
            return true;
        }

        if self.public_paths.iter().any(|p| p == &meta.path) {
            return true;
        }

        // Local requests skip validation (development and health probes).
        if self.allow_loopback {
            if let Some(addr) = meta.remote_addr {
                if addr.is_loopback() {
                    return true;
                }
            }
        }

        match (&self.auth_token, &meta.signature) {
            (Some(token), Some(signature)) => signature == token,
            _ => false,
        }
    }
}

/// Middleware applying the gate to the webhook routes
pub async fn require_signature(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let meta = RequestMetadata {
        remote_addr: Some(addr.ip()),
        path: request.uri().path().to_string(),
        signature: request
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    if state.authenticator.verify(&meta) {
        next.run(request).await
    } else {
        tracing::warn!(remote_addr = %addr, path = %meta.path, "Unauthorized webhook request");
        StatusCode::FORBIDDEN.into_response()
    }
}
