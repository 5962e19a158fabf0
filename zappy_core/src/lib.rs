//! Spectator client core for the Zappy server.
//!
//! [`Session::connect`] performs the graphic handshake and starts a
//! background thread that feeds every server line into a shared
//! [`GameState`]. A renderer polls that handle at its own pace; each
//! accessor takes the world lock once and returns owned copies.

mod animation;
mod components;
pub mod config;
mod dispatch;
mod ingest;
mod messages;
pub mod network;
mod session;
mod state;
mod world;

pub use animation::{AnimationEvent, AnimationKind, AnimationQueue};
pub use components::{player_label, Color, Player, Team, DEFAULT_TEAM_PALETTE};
pub use config::{load_spectator_config_from_env, ConfigError, SpectatorConfig};
pub use dispatch::{dispatch_line, DispatchError, DispatchOutcome};
pub use ingest::{spawn_ingestion, IngestHandle};
pub use messages::{Message, MessageCategory, MessageLog, SERVER_SOURCE};
pub use network::{resolve_host_alias, Connection, ConnectionError};
pub use session::Session;
pub use state::{GameState, PlayerCounts, StateError, WorldSnapshot};
pub use world::{ConnectionPhase, WorldState, MAX_TILE_COUNT};
