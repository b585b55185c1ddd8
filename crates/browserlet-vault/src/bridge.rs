//! The localhost token bridge: a minimal HTTP surface the browser
//! extension uses to fetch a credential value without ever holding the
//! vault password.

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rand::RngCore;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Default bridge port.
pub const DEFAULT_PORT: u16 = 9876;

/// Default token lifetime when the caller doesn't override it.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60);

/// How often the sweeper removes expired, never-consumed tokens.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Supplies a credential's plaintext value given the id a token was issued
/// for. Implemented by the unlocked vault; kept as a trait so the bridge
/// never depends on vault storage details directly.
pub trait CredentialSource: Send + Sync {
    /// Resolve `credential_id` to its plaintext value, or `None` if it no
    /// longer exists (vault was modified since the token was issued).
    fn credential_value(&self, credential_id: &str) -> Option<String>;
}

struct TokenEntry {
    credential_id: String,
    expires_at: Instant,
}

/// Single-use, time-bounded tokens keyed by their random hex string.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<Mutex<HashMap<String, TokenEntry>>>,
}

impl TokenStore {
    /// Create an empty token store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh 32-random-byte hex token for `credential_id`, valid
    /// for `ttl`.
    pub fn generate(&self, credential_id: &str, ttl: Duration) -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        self.inner.lock().expect("token store mutex poisoned").insert(
            token.clone(),
            TokenEntry { credential_id: credential_id.to_string(), expires_at: Instant::now() + ttl },
        );
        token
    }

    /// Consume `token`: it is removed unconditionally, and its associated
    /// credential id is returned only if it had not yet expired. A token
    /// presented twice always misses on the second attempt, expired or not.
    pub fn consume(&self, token: &str) -> Option<String> {
        let entry = self.inner.lock().expect("token store mutex poisoned").remove(token)?;
        (entry.expires_at >= Instant::now()).then_some(entry.credential_id)
    }

    /// Drop every expired entry that was never consumed.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.inner.lock().expect("token store mutex poisoned").retain(|_, entry| entry.expires_at >= now);
    }

    /// Remove every token, used when the bridge server stops.
    pub fn clear(&self) {
        self.inner.lock().expect("token store mutex poisoned").clear();
    }
}

#[derive(Clone)]
struct BridgeState {
    tokens: TokenStore,
    credentials: Arc<dyn CredentialSource>,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

#[derive(Serialize)]
struct CredentialBody {
    value: String,
}

async fn credential(State(state): State<BridgeState>, headers: HeaderMap) -> Response {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(token) = token else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(credential_id) = state.tokens.consume(token) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    match state.credentials.credential_value(&credential_id) {
        Some(value) => Json(CredentialBody { value }).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Permissive CORS for every response, scoped to the extension's need to
/// call this bridge cross-origin.
async fn apply_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Authorization, Content-Type"));
    headers.insert(axum::http::header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS"));
    response
}

async fn cors_middleware(req: axum::extract::Request, next: axum::middleware::Next) -> Response {
    if req.method() == axum::http::Method::OPTIONS {
        return apply_cors(StatusCode::NO_CONTENT.into_response()).await;
    }
    apply_cors(next.run(req).await).await
}

fn router(tokens: TokenStore, credentials: Arc<dyn CredentialSource>) -> Router {
    let state = BridgeState { tokens, credentials };
    Router::new()
        .route("/health", get(health))
        .route("/credential", get(credential))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(axum::middleware::from_fn(cors_middleware))
        .with_state(state)
}

/// A running bridge server: holds the handle needed to stop it.
pub struct Bridge {
    shutdown: tokio::sync::oneshot::Sender<()>,
    sweeper: tokio::task::JoinHandle<()>,
    server: tokio::task::JoinHandle<()>,
    /// The token store, shared with whoever issues tokens for newly
    /// resolved `{{credential:ALIAS}}` placeholders.
    pub tokens: TokenStore,
}

impl Bridge {
    /// Start the bridge bound to `127.0.0.1:port`.
    pub async fn start(port: u16, credentials: Arc<dyn CredentialSource>) -> std::io::Result<Self> {
        let tokens = TokenStore::new();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        let listener = TcpListener::bind(addr).await?;
        let app = router(tokens.clone(), credentials);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        info!(%addr, "credential bridge listening");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        let sweep_tokens = tokens.clone();
        let sweeper = tokio::spawn(async move {
            let mut tick = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tick.tick().await;
                sweep_tokens.sweep();
            }
        });
        Ok(Self { shutdown: shutdown_tx, sweeper, server, tokens })
    }

    /// Stop the bridge: signal graceful shutdown, stop the sweeper, and
    /// clear every outstanding token.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        self.sweeper.abort();
        if let Err(err) = self.server.await {
            warn!(?err, "bridge server task did not shut down cleanly");
        }
        self.tokens.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn a_token_is_single_use() {
        let store = TokenStore::new();
        let token = store.generate("cred-1", Duration::from_secs(60));
        assert_eq!(store.consume(&token).as_deref(), Some("cred-1"));
        assert_eq!(store.consume(&token), None);
    }

    #[test]
    fn an_expired_token_misses_on_consume() {
        let store = TokenStore::new();
        let token = store.generate("cred-1", Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.consume(&token), None);
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let store = TokenStore::new();
        let short = store.generate("cred-1", Duration::from_millis(0));
        let long = store.generate("cred-2", Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));
        store.sweep();
        assert_eq!(store.consume(&short), None);
        assert_eq!(store.consume(&long).as_deref(), Some("cred-2"));
    }

    #[test]
    fn clear_removes_every_token() {
        let store = TokenStore::new();
        let token = store.generate("cred-1", Duration::from_secs(60));
        store.clear();
        assert_eq!(store.consume(&token), None);
    }
}
