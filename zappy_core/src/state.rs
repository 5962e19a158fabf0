//! Thread-safe façade over the world model.
//!
//! Every accessor takes the lock once and returns owned data, so callers
//! never see a partially applied line and never hold the lock themselves.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use zappy_proto::{Inventory, PlayerId};

use crate::animation::AnimationEvent;
use crate::components::{Player, Team};
use crate::config::SpectatorConfig;
use crate::dispatch::{dispatch_line, DispatchOutcome};
use crate::messages::Message;
use crate::world::{ConnectionPhase, WorldState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("coordinate ({x}, {y}) is outside the map")]
    InvalidCoordinate { x: u32, y: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerCounts {
    pub living: usize,
    pub dead: usize,
}

/// Consistent copy of everything a frame needs, taken under one lock.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Inventory>,
    pub teams: Vec<Team>,
    pub messages: Vec<Message>,
    pub total_resources: Inventory,
    pub counts: PlayerCounts,
    pub frequency: Option<u32>,
    pub game_ended: bool,
    pub winner: Option<Team>,
    pub phase: ConnectionPhase,
}

#[derive(Clone, Default)]
pub struct GameState {
    world: Arc<Mutex<WorldState>>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &SpectatorConfig) -> Self {
        Self {
            world: Arc::new(Mutex::new(WorldState::new(config))),
        }
    }

    /// Parse and apply one server line under the lock.
    pub fn dispatch_line(&self, line: &str) -> DispatchOutcome {
        dispatch_line(&mut self.world.lock(), line)
    }

    pub fn evict_messages(&self) -> usize {
        self.world.lock().evict_messages()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let world = self.world.lock();
        (world.width(), world.height())
    }

    pub fn width(&self) -> u32 {
        self.world.lock().width()
    }

    pub fn height(&self) -> u32 {
        self.world.lock().height()
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Result<Inventory, StateError> {
        self.world
            .lock()
            .tile(x, y)
            .copied()
            .ok_or(StateError::InvalidCoordinate { x, y })
    }

    /// Row-major copy of the grid; index is `y * width + x`.
    pub fn tiles(&self) -> Vec<Inventory> {
        self.world.lock().tiles().to_vec()
    }

    pub fn teams(&self) -> Vec<Team> {
        self.world.lock().teams().to_vec()
    }

    pub fn team(&self, name: &str) -> Option<Team> {
        self.world.lock().team(name).cloned()
    }

    pub fn player(&self, id: PlayerId) -> Option<Player> {
        self.world.lock().player(id).cloned()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.world.lock().messages().iter().cloned().collect()
    }

    pub fn message_count(&self) -> usize {
        self.world.lock().messages().len()
    }

    pub fn total_resources(&self) -> Inventory {
        self.world.lock().total_resources()
    }

    pub fn player_counts(&self) -> PlayerCounts {
        let world = self.world.lock();
        PlayerCounts {
            living: world.living_count(),
            dead: world.dead_count(),
        }
    }

    pub fn frequency(&self) -> Option<u32> {
        self.world.lock().frequency()
    }

    /// Living players standing on `(x, y)`.
    pub fn players_at(&self, x: u32, y: u32) -> Vec<Player> {
        self.world
            .lock()
            .living_players()
            .filter(|player| player.x == x && player.y == y)
            .cloned()
            .collect()
    }

    pub fn pop_animation(&self) -> Option<AnimationEvent> {
        self.world.lock().pop_animation()
    }

    pub fn drain_animations(&self) -> Vec<AnimationEvent> {
        let mut world = self.world.lock();
        let events = std::iter::from_fn(|| world.pop_animation()).collect();
        events
    }

    pub fn has_changed(&self) -> bool {
        self.world.lock().changed()
    }

    pub fn clear_changed(&self) {
        self.world.lock().clear_changed();
    }

    pub fn has_game_ended(&self) -> bool {
        self.world.lock().game_ended()
    }

    pub fn winning_team(&self) -> Option<Team> {
        self.world.lock().winner().cloned()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.world.lock().phase()
    }

    pub(crate) fn set_phase(&self, phase: ConnectionPhase) {
        self.world.lock().set_phase(phase);
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        snapshot_of(&self.world.lock())
    }

    /// Snapshot and clear the change flag in one critical section, so a line
    /// applied between the two is never lost. `None` when nothing changed.
    pub fn take_snapshot_if_changed(&self) -> Option<WorldSnapshot> {
        let mut world = self.world.lock();
        if !world.changed() {
            return None;
        }
        let snapshot = snapshot_of(&world);
        world.clear_changed();
        Some(snapshot)
    }
}

fn snapshot_of(world: &WorldState) -> WorldSnapshot {
    WorldSnapshot {
        width: world.width(),
        height: world.height(),
        tiles: world.tiles().to_vec(),
        teams: world.teams().to_vec(),
        messages: world.messages().iter().cloned().collect(),
        total_resources: world.total_resources(),
        counts: PlayerCounts {
            living: world.living_count(),
            dead: world.dead_count(),
        },
        frequency: world.frequency(),
        game_ended: world.game_ended(),
        winner: world.winner().cloned(),
        phase: world.phase(),
    }
}
