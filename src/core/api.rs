//! HTTP + WebSocket API for Eatventure
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /catalog/restaurants - Restaurants (?rarity=, ?neighborhood=)
//! - GET /catalog/rewards - Rewards
//! - POST /session/new - Create new session
//! - GET /session/{id} - Get session status
//! - POST /session/{id}/checkin/{restaurant_id} - Start check-in ritual
//! - POST /session/{id}/redeem/{reward_id} - Start redemption ritual
//! - POST /session/{id}/cancel - Cancel running ritual
//! - WS /ws/{id} - Live ritual progress and results

use axum::{
    extract::{ws::{Message, WebSocket}, Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{sink::Sink, stream::Stream, SinkExt, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

use crate::core::{drive_ritual, share, Catalog, SessionConfig, SessionController, SharedSession};
use crate::types::{
    RarityTier, RestaurantEntry, RewardEntry, RitualProgress, SessionError, SessionEvent,
    SessionStats,
};
use crate::{DEFAULT_INITIAL_BALANCE, DEFAULT_TICK_MS};

/// Server settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Time between ritual ticks
    pub tick_period: Duration,
    /// Directory for per-session ledger records, None to keep sessions in memory
    pub store_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(DEFAULT_TICK_MS),
            store_dir: None,
        }
    }
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, SharedSession>>,
    pub catalog: Catalog,
    pub config: ApiConfig,
}

/// Restaurant listing filters
#[derive(Debug, Default, Deserialize)]
pub struct RestaurantFilter {
    pub rarity: Option<String>,
    pub neighborhood: Option<String>,
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub initial_balance: Option<u32>,
    pub visited: Option<Vec<u32>>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
    pub balance: u32,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub stats: SessionStats,
    pub visited: Vec<u32>,
    pub active_ritual: Option<RitualProgress>,
}

/// Cancel response
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
    pub ritual: Option<RitualProgress>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Error body: `{code, message}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Error with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    fn session_not_found(id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "E404_SESSION_NOT_FOUND", format!("no session {}", id))
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::UnknownRestaurant(_) | SessionError::UnknownReward(_) => StatusCode::NOT_FOUND,
            e if e.is_recoverable() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Create the API router
pub fn create_router(config: ApiConfig) -> Router {
    let catalog = Catalog::oakland();
    let sessions = match &config.store_dir {
        Some(dir) => restore_sessions(dir, &catalog),
        None => HashMap::new(),
    };
    let state = Arc::new(AppState {
        sessions: RwLock::new(sessions),
        catalog,
        config,
    });

    Router::new()
        .route("/health", get(health))
        .route("/catalog/restaurants", get(list_restaurants))
        .route("/catalog/rewards", get(list_rewards))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session))
        .route("/session/:id/checkin/:restaurant_id", post(start_check_in))
        .route("/session/:id/redeem/:reward_id", post(start_redemption))
        .route("/session/:id/cancel", post(cancel_ritual))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// List restaurants, optionally filtered
async fn list_restaurants(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RestaurantFilter>,
) -> Result<Json<Vec<RestaurantEntry>>, ApiError> {
    let rarity = filter
        .rarity
        .as_deref()
        .map(str::parse::<RarityTier>)
        .transpose()
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "E400_BAD_FILTER", e.to_string()))?;

    let restaurants = state
        .catalog
        .restaurants()
        .iter()
        .filter(|r| rarity.map_or(true, |tier| r.rarity == tier))
        .filter(|r| {
            filter
                .neighborhood
                .as_deref()
                .map_or(true, |n| r.neighborhood.eq_ignore_ascii_case(n))
        })
        .cloned()
        .collect();

    Ok(Json(restaurants))
}

/// List rewards
async fn list_rewards(State(state): State<Arc<AppState>>) -> Json<Vec<RewardEntry>> {
    Json(state.catalog.rewards().to_vec())
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let session_id = generate_session_id();
    let config = SessionConfig {
        initial_balance: req.initial_balance.unwrap_or(DEFAULT_INITIAL_BALANCE),
        initial_visited: req.visited.unwrap_or_else(|| crate::DEFAULT_VISITED.to_vec()),
        store_path: state
            .config
            .store_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", session_id))),
    };

    let session = SessionController::new(state.catalog.clone(), config)?;
    let balance = session.balance();

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), share(session));
    info!("session {} created with {} points", session_id, balance);

    Ok(Json(NewSessionResponse {
        session_id: session_id.clone(),
        websocket_url: format!("/ws/{}", session_id),
        balance,
    }))
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let shared = lookup(&state, &id).await?;
    let session = shared.lock().await;

    Ok(Json(SessionStatusResponse {
        session_id: id,
        stats: session.stats(),
        visited: session.ledger().visited().iter().copied().collect(),
        active_ritual: session.active_ritual().map(|r| r.progress_output()),
    }))
}

/// Start a check-in ritual and its clock
async fn start_check_in(
    State(state): State<Arc<AppState>>,
    Path((id, restaurant_id)): Path<(String, u32)>,
) -> Result<Json<RitualProgress>, ApiError> {
    let shared = lookup(&state, &id).await?;
    let progress = shared.lock().await.start_check_in(restaurant_id)?;
    spawn_clock(&state, id, shared, progress.seq);
    Ok(Json(progress))
}

/// Start a redemption ritual and its clock
async fn start_redemption(
    State(state): State<Arc<AppState>>,
    Path((id, reward_id)): Path<(String, u32)>,
) -> Result<Json<RitualProgress>, ApiError> {
    let shared = lookup(&state, &id).await?;
    let progress = shared.lock().await.start_redemption(reward_id)?;
    spawn_clock(&state, id, shared, progress.seq);
    Ok(Json(progress))
}

/// Cancel the running ritual (no-op if none)
async fn cancel_ritual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let shared = lookup(&state, &id).await?;
    let ritual = shared.lock().await.cancel_active_ritual();
    Ok(Json(CancelResponse {
        cancelled: ritual.is_some(),
        ritual,
    }))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let shared = lookup(&state, &id).await?;
    let rx = shared.lock().await.subscribe();

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

async fn handle_websocket(socket: WebSocket, rx: broadcast::Receiver<SessionEvent>) {
    let (sender, receiver) = socket.split();
    forward_events(sender, receiver, rx).await;
}

/// Forward session events as JSON text frames until either side goes away.
/// A lagging client skips the dropped events and keeps going.
async fn forward_events<S, R, E>(
    mut sender: S,
    mut receiver: R,
    mut rx: broadcast::Receiver<SessionEvent>,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            update = rx.recv() => {
                let event = match update {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let json = serde_json::to_string(&event).unwrap_or_default();
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn lookup(state: &AppState, id: &str) -> Result<SharedSession, ApiError> {
    let sessions = state.sessions.read().await;
    sessions
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::session_not_found(id))
}

/// Rebuild sessions from the `<id>.json` records an earlier run left in `dir`
fn restore_sessions(dir: &FsPath, catalog: &Catalog) -> HashMap<String, SharedSession> {
    let mut sessions = HashMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("cannot read store dir {}: {}", dir.display(), e);
            }
            return sessions;
        }
    };

    for path in entries.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string) else {
            continue;
        };
        let config = SessionConfig {
            store_path: Some(path.clone()),
            ..SessionConfig::default()
        };
        match SessionController::new(catalog.clone(), config) {
            Ok(session) => {
                info!("session {} restored with {} points", id, session.balance());
                sessions.insert(id, share(session));
            }
            Err(e) => warn!("skipping record {}: {} [{}]", path.display(), e, e.code()),
        }
    }
    sessions
}

/// Run the ritual clock in the background
fn spawn_clock(state: &AppState, session_id: String, shared: SharedSession, seq: u64) {
    let period = state.config.tick_period;
    tokio::spawn(async move {
        match drive_ritual(shared, seq, period).await {
            Ok(Some(done)) => info!("session {} ritual #{} finished: {}", session_id, seq, done.status),
            Ok(None) => info!("session {} ritual #{} ended without completing", session_id, seq),
            Err(e) => error!("session {} ritual #{} failed: {} [{}]", session_id, seq, e, e.code()),
        }
    });
}

/// Generate session ID
fn generate_session_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("session_{:x}_{}", nanos, n)
}

/// Run the API server
pub async fn run_server(addr: &str, config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Eatventure API listening on {}", addr);
    println!("🍽  Eatventure API running on {}", addr);
    println!("  GET  /catalog/restaurants             - Restaurants (?rarity=&neighborhood=)");
    println!("  GET  /catalog/rewards                 - Rewards");
    println!("  POST /session/new                     - Create session");
    println!("  GET  /session/:id                     - Get status");
    println!("  POST /session/:id/checkin/:restaurant - Start check-in");
    println!("  POST /session/:id/redeem/:reward      - Start redemption");
    println!("  POST /session/:id/cancel              - Cancel ritual");
    println!("  WS   /ws/:id                          - Live updates");
    println!("  GET  /health                          - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{sink, stream};
    use std::convert::Infallible;
    use tokio::sync::mpsc;

    /// Socket sender stand-in, frames land in the returned receiver
    fn frame_sink() -> (impl Sink<Message> + Unpin, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = sink::unfold(tx, |tx, frame: Message| async move {
            tx.send(frame).map_err(|_| ())?;
            Ok::<_, ()>(tx)
        });
        (Box::pin(sender), rx)
    }

    fn decode(mut frames: mpsc::UnboundedReceiver<Message>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = frames.try_recv() {
            match frame {
                Message::Text(json) => events.push(serde_json::from_str(&json).unwrap()),
                other => panic!("expected text frame, got {:?}", other),
            }
        }
        events
    }

    #[tokio::test]
    async fn test_forwards_events_until_session_closes() {
        let mut session = SessionController::new(Catalog::oakland(), SessionConfig::default()).unwrap();
        let rx = session.subscribe();
        session.start_check_in(4).unwrap();
        session.tick().unwrap();
        session.cancel_active_ritual();
        drop(session);

        let (sender, frames) = frame_sink();
        forward_events(sender, stream::pending::<Result<Message, Infallible>>(), rx).await;

        let events = decode(frames);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SessionEvent::RitualStarted { .. }));
        assert!(matches!(events[1], SessionEvent::RitualTick { .. }));
        assert!(matches!(
            events[2],
            SessionEvent::RitualCancelled { subject_id: 4, remaining_secs: 29, .. }
        ));
    }

    #[tokio::test]
    async fn test_lagging_client_skips_dropped_events() {
        let (tx, rx) = broadcast::channel(2);
        for code in ["E1", "E2", "E3", "E4", "E5"] {
            tx.send(SessionEvent::Rejected {
                code: code.to_string(),
                message: String::new(),
            })
            .unwrap();
        }
        drop(tx);

        let (sender, frames) = frame_sink();
        forward_events(sender, stream::pending::<Result<Message, Infallible>>(), rx).await;

        let codes: Vec<String> = decode(frames)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Rejected { code, .. } => Some(code),
                _ => None,
            })
            .collect();
        assert_eq!(codes, vec!["E4", "E5"]);
    }

    #[tokio::test]
    async fn test_client_close_ends_forwarding() {
        let session = SessionController::new(Catalog::oakland(), SessionConfig::default()).unwrap();
        let rx = session.subscribe();
        let incoming = stream::iter(vec![Ok::<_, Infallible>(Message::Close(None))]);

        let (sender, frames) = frame_sink();
        forward_events(sender, incoming, rx).await;

        assert!(decode(frames).is_empty());
        // The session outlives the socket
        assert_eq!(session.balance(), 485);
    }
}
