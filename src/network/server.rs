//! WebSocket Round Server
//!
//! Async WebSocket server for round clients.
//! Parses JSON frames, routes them to the [`RoundService`] and writes replies.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug};

use crate::network::protocol::{ClientMessage, ServerMessage, ServerError, ErrorCode};
use crate::network::service::RoundService;
use crate::round::engine::RoundConfig;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3001;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Close connections idle for this long.
    pub idle_timeout: Duration,
    /// Board limits.
    pub rounds: RoundConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            rounds: RoundConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// `BIND_ADDR` (full socket address) wins over `PORT`. Unset variables
    /// keep their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self, RoundServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RoundServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.bind_addr.set_port(parse_var("PORT", &port)?);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = parse_var("BIND_ADDR", &addr)?;
        }
        if let Some(max) = lookup("MAX_CONNECTIONS") {
            config.max_connections = parse_var("MAX_CONNECTIONS", &max)?;
        }
        if let Some(secs) = lookup("IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(parse_var("IDLE_TIMEOUT_SECS", &secs)?);
        }
        if let Some(rows) = lookup("MAX_ROWS") {
            config.rounds.max_rows = parse_var("MAX_ROWS", &rows)?;
        }
        if let Some(rows) = lookup("DEFAULT_ROWS") {
            config.rounds.default_rows = parse_var("DEFAULT_ROWS", &rows)?;
        }

        // Bounded ceiling, playable default.
        config
            .rounds
            .validate()
            .map_err(|e| RoundServerError::Config(format!("MAX_ROWS/DEFAULT_ROWS: {}", e)))?;

        Ok(config)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, RoundServerError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| RoundServerError::Config(format!("{}={:?}: {}", key, value, e)))
}

/// Round server errors.
#[derive(Debug, thiserror::Error)]
pub enum RoundServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// The round server.
pub struct RoundServer {
    /// Server configuration.
    config: ServerConfig,
    /// Round operations.
    service: Arc<RoundService>,
    /// Live connection count.
    connections: Arc<AtomicUsize>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl RoundServer {
    /// Create a new round server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let service = Arc::new(RoundService::new(config.rounds));

        Self {
            config,
            service,
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Round operations backing this server.
    pub fn service(&self) -> Arc<RoundService> {
        self.service.clone()
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), RoundServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Round server listening on {}", self.config.bind_addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), RoundServerError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connection_count() >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let service = self.service.clone();
        let connections = self.connections.clone();
        let idle_timeout = self.config.idle_timeout;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        connections.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    connections.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = tokio::time::timeout(idle_timeout, ws_receiver.next()) => {
                        match msg {
                            Err(_) => {
                                debug!("Client {} idle, closing", addr);
                                break;
                            }
                            Ok(Some(Ok(Message::Text(text)))) => {
                                let reply = match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => Self::handle_client_message(addr, client_msg, &service).await,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        ServerMessage::Error(ServerError {
                                            code: ErrorCode::InvalidInput,
                                            message: format!("Invalid message format: {}", e),
                                        })
                                    }
                                };
                                if msg_tx.send(reply).await.is_err() {
                                    break;
                                }
                            }
                            Ok(Some(Ok(Message::Binary(_)))) => {
                                let _ = msg_tx.send(ServerMessage::Error(ServerError {
                                    code: ErrorCode::InvalidInput,
                                    message: "Binary frames are not supported".to_string(),
                                })).await;
                            }
                            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Ok(Some(Err(e))) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            Ok(Some(Ok(_))) => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Let queued replies drain, then close.
            drop(msg_tx);
            let _ = sender_task.await;

            connections.fetch_sub(1, Ordering::SeqCst);
            info!("Client {} cleaned up", addr);
        });
    }

    /// Handle a client message.
    async fn handle_client_message(
        addr: SocketAddr,
        msg: ClientMessage,
        service: &RoundService,
    ) -> ServerMessage {
        debug!("Message from {}: {:?}", addr, msg);

        let result = match msg {
            ClientMessage::Commit { nonce, rows } => {
                service.commit(nonce, rows).await.map(ServerMessage::Committed)
            }
            ClientMessage::Start(request) => {
                let (round_id, request) = request.into_parts();
                service.start(round_id, request).await.map(ServerMessage::Started)
            }
            ClientMessage::Reveal { round_id } => {
                service.reveal(round_id).await.map(ServerMessage::Revealed)
            }
            ClientMessage::GetRound { round_id } => {
                service.get(round_id).await.map(ServerMessage::Round)
            }
            ClientMessage::ListRounds { limit } => {
                Ok(ServerMessage::Rounds { rounds: service.list(limit).await })
            }
            ClientMessage::Verify(request) => {
                let (round_id, input, expected) = request.into_parts();
                service.verify(round_id, input, expected).await.map(ServerMessage::Verified)
            }
            ClientMessage::Ping { timestamp } => Ok(ServerMessage::Pong {
                timestamp,
                server_time: u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0),
            }),
        };

        result.unwrap_or_else(|e| {
            debug!("Request from {} failed: {}", addr, e);
            ServerMessage::error(&e)
        })
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get connected client count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.rounds, RoundConfig::default());
    }

    #[test]
    fn test_server_config_from_lookup() {
        let vars: BTreeMap<&str, &str> = [
            ("PORT", "4000"),
            ("MAX_CONNECTIONS", "8"),
            ("DEFAULT_ROWS", "16"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:4000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.rounds.default_rows, 16);

        let config = ServerConfig::from_lookup(|k| {
            (k == "BIND_ADDR").then(|| "127.0.0.1:9000".to_string())
        })
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_server_config_rejects_bad_values() {
        let bad_port = ServerConfig::from_lookup(|k| (k == "PORT").then(|| "http".to_string()));
        assert!(matches!(bad_port, Err(RoundServerError::Config(_))));

        let bad_rows = ServerConfig::from_lookup(|k| (k == "DEFAULT_ROWS").then(|| "64".to_string()));
        assert!(matches!(bad_rows, Err(RoundServerError::Config(_))));

        let huge_board = ServerConfig::from_lookup(|k| (k == "MAX_ROWS").then(|| "100000".to_string()));
        assert!(matches!(huge_board, Err(RoundServerError::Config(_))));

        let no_board = ServerConfig::from_lookup(|k| (k == "MAX_ROWS").then(|| "0".to_string()));
        assert!(matches!(no_board, Err(RoundServerError::Config(_))));

        let widest = ServerConfig::from_lookup(|k| (k == "MAX_ROWS").then(|| "64".to_string())).unwrap();
        assert_eq!(widest.rounds.max_rows, 64);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = RoundServer::new(config);

        assert_eq!(server.connection_count(), 0);
        assert!(server.service().store().is_empty().await);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = Arc::new(RoundServer::new(ServerConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let running = server.clone();
        let handle = tokio::spawn(async move { running.serve(listener).await });

        // Keep signalling until the loop has subscribed and exited.
        let result = tokio::time::timeout(Duration::from_secs(2), async {
            while !handle.is_finished() {
                server.shutdown();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            handle.await
        })
        .await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn test_message_routing() {
        let service = RoundService::default();
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();

        let reply = RoundServer::handle_client_message(
            addr,
            ClientMessage::Commit { nonce: Some("1".into()), rows: Some(1) },
            &service,
        )
        .await;
        assert!(matches!(reply, ServerMessage::Committed(_)));

        let reply = RoundServer::handle_client_message(
            addr,
            ClientMessage::Reveal { round_id: crate::round::state::RoundId::new() },
            &service,
        )
        .await;
        match reply {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::NotFound),
            other => panic!("Wrong message type: {:?}", other),
        }

        let reply = RoundServer::handle_client_message(addr, ClientMessage::Ping { timestamp: 7 }, &service).await;
        assert!(matches!(reply, ServerMessage::Pong { timestamp: 7, .. }));
    }
}
