//! `BalatroClient` and its builder.
//!
//! The client owns at most one [`Connection`] and issues one call at a
//! time. Every call method takes `&mut self`, so the borrow checker is what
//! enforces the "no pipelining" rule: while a call is awaiting its reply,
//! nothing else can reach the socket.
//!
//! The client is strictly fail-fast. A socket error drops the connection
//! and is returned; it never retries, because a retried call could repeat
//! a game-mutating action.

use std::marker::PhantomData;
use std::time::Duration;

use balatrobot_protocol::{
    ApiCall, ApiRequest, ApiResponse, BlindAction, BlindActionRequest,
    CashOut, Codec, ErrorCode, ErrorResponse, GameState, GetGameState,
    GetSaveInfo, GoToMenu, HandAction, HandActionRequest, JsonCodec,
    LoadSaveRequest, RearrangeConsumablesRequest, SaveInfo, ShopActionRequest,
    StartRunRequest, UseConsumableRequest,
};
use balatrobot_transport::{
    Connection, ConnectionId, TcpConnection, TransportConfig,
};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{BalatroError, ErrorDetails, PathTranslator};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`BalatroClient`].
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), balatrobot_client::BalatroError> {
/// use std::time::Duration;
/// use balatrobot_client::BalatroClient;
///
/// let mut client = BalatroClient::builder()
///     .port(12346)
///     .timeout(Duration::from_secs(10))
///     .build();
/// client.connect().await?;
/// let state = client.get_game_state().await?;
/// println!("peer is in {}", state.state);
/// # Ok(())
/// # }
/// ```
pub struct BalatroClientBuilder<C: Connection = TcpConnection> {
    config: TransportConfig,
    paths: Option<PathTranslator>,
    _conn: PhantomData<fn() -> C>,
}

impl<C: Connection> BalatroClientBuilder<C> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: TransportConfig::default(),
            paths: None,
            _conn: PhantomData,
        }
    }

    /// Replaces the whole transport configuration.
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the peer host name or address (default `127.0.0.1`).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the peer port (default `12346`).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the bound on connecting and on every send and receive
    /// (default 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the receive buffer size, which is also the largest reply
    /// accepted in one read (default 65536 bytes).
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Overrides how peer paths from `get_save_info` are translated.
    /// Defaults to [`PathTranslator::for_host`].
    pub fn path_translator(mut self, paths: PathTranslator) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Builds a disconnected client.
    pub fn build(self) -> BalatroClient<C> {
        let mut client = BalatroClient::new(self.config);
        if let Some(paths) = self.paths {
            client.paths = paths;
        }
        client
    }
}

impl<C: Connection> Default for BalatroClientBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A synchronous-style RPC client for one peer.
///
/// A freshly built client is disconnected and owns no socket. The
/// connection is either fully present or absent; there is no
/// half-connected state.
pub struct BalatroClient<C: Connection = TcpConnection> {
    config: TransportConfig,
    conn: Option<C>,
    paths: PathTranslator,
}

impl BalatroClient<TcpConnection> {
    /// Creates a builder for a stream (TCP) client.
    pub fn builder() -> BalatroClientBuilder<TcpConnection> {
        BalatroClientBuilder::new()
    }
}

impl<C: Connection> BalatroClient<C> {
    /// Creates a disconnected client. The config is passed through
    /// [`TransportConfig::validated`].
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config: config.validated(),
            conn: None,
            paths: PathTranslator::for_host(),
        }
    }

    /// Creates a client and connects it.
    pub async fn connect_with(
        config: TransportConfig,
    ) -> Result<Self, BalatroError> {
        let mut client = Self::new(config);
        client.connect().await?;
        Ok(client)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Identifier of the live socket, if any.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.conn.as_ref().map(Connection::id)
    }

    pub fn path_translator(&self) -> &PathTranslator {
        &self.paths
    }

    /// Opens the connection. A no-op when already connected.
    ///
    /// # Errors
    /// `Connection` (`E008`) with `host`, `port` and `error` context.
    pub async fn connect(&mut self) -> Result<(), BalatroError> {
        if self.conn.is_some() {
            return Ok(());
        }

        let host = self.config.host.as_str();
        let port = self.config.port;
        info!(host, port, contract = %C::CONTRACT, "connecting to peer");

        match C::connect(&self.config).await {
            Ok(conn) => {
                info!(host, port, id = %conn.id(), "connected to peer");
                self.conn = Some(conn);
                Ok(())
            }
            Err(e) => {
                error!(host, port, error = %e, "failed to connect");
                let details = ErrorDetails::new(
                    ErrorCode::ConnectionFailed,
                    format!("Failed to connect to {host}:{port}"),
                )
                .with_context("host", host)
                .with_context("port", port)
                .with_context("error", e.to_string());
                Err(BalatroError::Connection(details))
            }
        }
    }

    /// Closes the connection. Safe to call at any time, including before
    /// the first `connect`.
    pub async fn disconnect(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            info!(
                host = %self.config.host,
                port = self.config.port,
                id = %conn.id(),
                "disconnecting from peer"
            );
            if let Err(e) = conn.close().await {
                debug!(error = %e, "close reported an error; socket dropped anyway");
            }
        }
    }

    // -- raw calls --------------------------------------------------------

    /// Sends one named call and waits for its single reply.
    ///
    /// `null` arguments are sent as `{}`. A reply with an `"error"` key is
    /// always returned as `Err`, even if it also carries a `state`.
    ///
    /// # Errors
    /// - `Connection` (`E008`) if not connected, or on any socket failure
    ///   (the connection is dropped first).
    /// - `Protocol` (`E001`) if the reply is not JSON.
    /// - `Schema` if an error-shaped reply doesn't fit the error model.
    /// - The peer's own error, translated by code category.
    pub async fn call(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<Value, BalatroError> {
        let request =
            ApiRequest::new(name, arguments).map_err(BalatroError::from_request)?;
        self.send_request(&request).await
    }

    /// Issues a typed call: validates the request locally, sends it, and
    /// checks the reply against the call's response model.
    pub async fn invoke<R: ApiCall>(
        &mut self,
        request: &R,
    ) -> Result<R::Response, BalatroError> {
        let wire = request.to_request().map_err(BalatroError::from_request)?;
        let raw = self.send_request(&wire).await?;
        R::Response::parse(raw).map_err(|source| {
            error!(call = R::NAME, error = %source, "response failed schema validation");
            BalatroError::Schema {
                call: R::NAME.to_string(),
                source,
            }
        })
    }

    async fn send_request(
        &mut self,
        request: &ApiRequest,
    ) -> Result<Value, BalatroError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(BalatroError::Connection(
                ErrorDetails::new(
                    ErrorCode::ConnectionFailed,
                    "Not connected to the game API",
                )
                .with_context("connected", false)
                .with_context("socket", false),
            ));
        };

        let name = request.name.as_str();
        let bytes = C::CONTRACT
            .encode_request(request)
            .map_err(BalatroError::from_request)?;
        debug!(call = name, bytes = bytes.len(), "sending request");

        let exchange = match conn.send(&bytes).await {
            Ok(()) => conn.recv().await,
            Err(e) => Err(e),
        };
        let reply = match exchange {
            Ok(reply) => reply,
            Err(e) => {
                error!(call = name, error = %e, "socket error during request");
                let err = BalatroError::from_transport(
                    "Socket error during communication",
                    &e,
                );
                self.drop_connection().await;
                return Err(err);
            }
        };

        let value: Value = JsonCodec.decode(&reply).map_err(|e| {
            error!(call = name, error = %e, "invalid JSON response");
            BalatroError::Protocol(
                ErrorDetails::new(
                    ErrorCode::InvalidJson,
                    format!("Invalid JSON response from game: {e}"),
                )
                .with_context("error", e.to_string()),
            )
        })?;

        if ErrorResponse::is_error_shaped(&value) {
            let resp: ErrorResponse =
                serde_json::from_value(value).map_err(|e| BalatroError::Schema {
                    call: name.to_string(),
                    source: balatrobot_protocol::ProtocolError::Decode(e),
                })?;
            error!(
                call = name,
                code = %resp.error_code,
                message = %resp.error,
                "peer returned an error"
            );
            return Err(resp.into());
        }

        debug!(call = name, "request completed");
        Ok(value)
    }

    async fn drop_connection(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!(
                    id = %conn.id(),
                    error = %e,
                    "close after socket failure reported an error"
                );
            }
        }
    }

    // -- typed operations -------------------------------------------------

    pub async fn get_game_state(&mut self) -> Result<GameState, BalatroError> {
        self.invoke(&GetGameState {}).await
    }

    pub async fn go_to_menu(&mut self) -> Result<GameState, BalatroError> {
        self.invoke(&GoToMenu {}).await
    }

    pub async fn start_run(
        &mut self,
        request: &StartRunRequest,
    ) -> Result<GameState, BalatroError> {
        self.invoke(request).await
    }

    pub async fn skip_or_select_blind(
        &mut self,
        action: BlindAction,
    ) -> Result<GameState, BalatroError> {
        self.invoke(&BlindActionRequest { action }).await
    }

    /// Plays or discards the cards at the given zero-based hand indices.
    pub async fn play_hand_or_discard(
        &mut self,
        action: HandAction,
        cards: &[usize],
    ) -> Result<GameState, BalatroError> {
        let request = HandActionRequest {
            action,
            cards: cards.to_vec(),
        };
        self.invoke(&request).await
    }

    pub async fn cash_out(&mut self) -> Result<GameState, BalatroError> {
        self.invoke(&CashOut {}).await
    }

    pub async fn shop(
        &mut self,
        action: ShopActionRequest,
    ) -> Result<GameState, BalatroError> {
        self.invoke(&action).await
    }

    pub async fn use_consumable(
        &mut self,
        index: usize,
        cards: Option<Vec<usize>>,
    ) -> Result<GameState, BalatroError> {
        self.invoke(&UseConsumableRequest { index, cards }).await
    }

    /// Reorders consumables. `order` must be a permutation of
    /// `0..order.len()`; duplicates are rejected before sending.
    pub async fn rearrange_consumables(
        &mut self,
        order: Vec<usize>,
    ) -> Result<GameState, BalatroError> {
        self.invoke(&RearrangeConsumablesRequest {
            consumeables: order,
        })
        .await
    }

    /// Asks where the peer keeps its save file. Paths are translated to the
    /// local convention before they are returned.
    pub async fn get_save_info(&mut self) -> Result<SaveInfo, BalatroError> {
        let mut info = self.invoke(&GetSaveInfo {}).await?;
        for path in [&mut info.save_file_path, &mut info.save_directory]
            .into_iter()
            .flatten()
        {
            if !path.is_empty() {
                *path = self.paths.to_local(path);
            }
        }
        Ok(info)
    }

    /// Swaps in the save at `save_path` without restarting the game.
    /// `save_path` is a local path; it is translated to the peer's form.
    pub async fn load_save(
        &mut self,
        save_path: &str,
    ) -> Result<GameState, BalatroError> {
        let request = LoadSaveRequest {
            save_path: self.paths.to_remote(save_path),
        };
        self.invoke(&request).await
    }
}

impl<C: Connection> Drop for BalatroClient<C> {
    fn drop(&mut self) {
        if let Some(conn) = &self.conn {
            debug!(id = %conn.id(), "client dropped while connected; closing socket");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_is_disconnected() {
        let client: BalatroClient = BalatroClient::new(TransportConfig::default());
        assert!(!client.is_connected());
        assert!(client.connection_id().is_none());
    }

    #[test]
    fn test_builder_sets_fields() {
        let client = BalatroClient::builder()
            .host("localhost")
            .port(9999)
            .timeout(Duration::from_secs(3))
            .buffer_size(1024)
            .path_translator(PathTranslator::identity())
            .build();
        let config = client.config();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9999);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(client.path_translator(), &PathTranslator::identity());
    }

    #[test]
    fn test_builder_validates_config() {
        let client = BalatroClient::builder().buffer_size(0).build();
        assert_eq!(
            client.config().buffer_size,
            TransportConfig::DEFAULT_BUFFER_SIZE
        );
    }

    #[tokio::test]
    async fn test_disconnect_before_connect_is_noop() {
        let mut client = BalatroClient::builder().build();
        client.disconnect().await;
        client.disconnect().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_call_while_disconnected_is_connection_error() {
        let mut client = BalatroClient::builder().build();
        let err = client.call("get_game_state", Value::Null).await.unwrap_err();
        assert!(err.is_connection());
        assert_eq!(err.code(), ErrorCode::ConnectionFailed);
        assert_eq!(err.context()["connected"], false);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_connection_check() {
        let mut client = BalatroClient::builder().build();
        let request = StartRunRequest {
            stake: 0,
            ..StartRunRequest::new(balatrobot_protocol::Deck::Red)
        };
        let err = client.start_run(&request).await.unwrap_err();
        assert!(matches!(err, BalatroError::Validation(_)));
        assert_eq!(err.code(), ErrorCode::ParameterOutOfRange);
    }
}
