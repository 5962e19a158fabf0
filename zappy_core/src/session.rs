use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};
use zappy_proto::ClientRequest;

use crate::config::SpectatorConfig;
use crate::ingest::{spawn_ingestion, IngestHandle};
use crate::network::{Connection, ConnectionError};
use crate::state::GameState;
use crate::world::ConnectionPhase;

/// A connected spectator: the socket, the shared world and the thread
/// feeding one from the other.
pub struct Session {
    connection: Arc<Mutex<Connection>>,
    state: GameState,
    ingest: IngestHandle,
}

impl Session {
    pub fn connect(
        host: &str,
        port: u16,
        config: &SpectatorConfig,
    ) -> Result<Self, ConnectionError> {
        Self::connect_with_state(host, port, config, GameState::with_config(config))
    }

    /// Connect and stream into an existing world handle.
    pub fn connect_with_state(
        host: &str,
        port: u16,
        config: &SpectatorConfig,
        state: GameState,
    ) -> Result<Self, ConnectionError> {
        state.set_phase(ConnectionPhase::Handshaking);
        let connection =
            match Connection::connect_with_timeout(host, port, config.connection.handshake_timeout())
            {
                Ok(connection) => connection,
                Err(err) => {
                    warn!(
                        target: "zappy::session",
                        host,
                        port,
                        error = %err,
                        "session.connect_failed"
                    );
                    state.set_phase(ConnectionPhase::Disconnected);
                    return Err(err);
                }
            };

        let connection = Arc::new(Mutex::new(connection));
        state.set_phase(ConnectionPhase::Streaming);
        let ingest = match spawn_ingestion(
            Arc::clone(&connection),
            state.clone(),
            config.connection.poll_interval(),
        ) {
            Ok(ingest) => ingest,
            Err(err) => {
                connection.lock().close();
                state.set_phase(ConnectionPhase::Disconnected);
                return Err(err);
            }
        };

        info!(target: "zappy::session", host, port, "session.connected");
        Ok(Self {
            connection,
            state,
            ingest,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Send one spectator request. Returns bytes written, `-1` on failure.
    pub fn request(&self, request: &ClientRequest) -> isize {
        self.connection.lock().send(&request.to_line())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_connected()
    }

    /// Stop ingestion, then close the socket.
    pub fn shutdown(&mut self) {
        self.ingest.stop();
        self.connection.lock().close();
        self.state.set_phase(ConnectionPhase::Disconnected);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
