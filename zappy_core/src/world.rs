//! The authoritative world model and the handlers that mutate it.
//!
//! Nothing here locks. [`crate::GameState`] owns the lock and hands
//! `&mut WorldState` to the dispatcher, so every handler runs inside one
//! critical section and the public accessors never re-enter it.

use std::time::Duration;

use tracing::trace;
use zappy_proto::{
    IncantationResult, Inventory, Orientation, PlayerId, PlayerRecord, ResourceKind,
    ServerCommand,
};

use crate::animation::{AnimationEvent, AnimationKind, AnimationQueue};
use crate::components::{player_label, Color, Player, Team};
use crate::config::SpectatorConfig;
use crate::dispatch::DispatchError;
use crate::messages::{Message, MessageCategory, MessageLog};

/// Upper bound on `width * height` accepted from a size announcement.
pub const MAX_TILE_COUNT: u64 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Handshaking,
    Streaming,
}

#[derive(Debug, Clone)]
pub struct WorldState {
    width: u32,
    height: u32,
    tiles: Vec<Inventory>,
    teams: Vec<Team>,
    palette: Vec<Color>,
    messages: MessageLog,
    animations: AnimationQueue,
    broadcast_duration: Duration,
    incantation_duration: Duration,
    frequency: Option<u32>,
    game_ended: bool,
    winner: Option<Team>,
    changed: bool,
    phase: ConnectionPhase,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(&SpectatorConfig::default())
    }
}

impl WorldState {
    pub fn new(config: &SpectatorConfig) -> Self {
        Self {
            width: 0,
            height: 0,
            tiles: Vec::new(),
            teams: Vec::new(),
            palette: config.palette(),
            messages: MessageLog::new(
                config.message_log.ceiling,
                config.message_log.eviction_batch,
            ),
            animations: AnimationQueue::new(config.animation.queue_limit),
            broadcast_duration: config.animation.broadcast_duration(),
            incantation_duration: config.animation.incantation_duration(),
            frequency: None,
            game_ended: false,
            winner: None,
            changed: false,
            phase: ConnectionPhase::Disconnected,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tiles(&self) -> &[Inventory] {
        &self.tiles
    }

    pub fn tile(&self, x: u32, y: u32) -> Option<&Inventory> {
        self.tile_index(x, y).and_then(|index| self.tiles.get(index))
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.name == name)
    }

    /// Any player ever announced, retired ones included.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.teams
            .iter()
            .flat_map(|team| team.players.iter().chain(team.retired.iter()))
            .find(|player| player.id == id)
    }

    pub fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.teams.iter().flat_map(|team| team.players.iter())
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn frequency(&self) -> Option<u32> {
        self.frequency
    }

    pub fn game_ended(&self) -> bool {
        self.game_ended
    }

    pub fn winner(&self) -> Option<&Team> {
        self.winner.as_ref()
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn total_resources(&self) -> Inventory {
        self.tiles.iter().sum()
    }

    pub fn living_count(&self) -> usize {
        self.teams.iter().map(Team::living_count).sum()
    }

    pub fn dead_count(&self) -> usize {
        self.teams.iter().map(Team::dead_count).sum()
    }

    pub(crate) fn clear_changed(&mut self) {
        self.changed = false;
    }

    pub(crate) fn set_phase(&mut self, phase: ConnectionPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.changed = true;
        }
    }

    pub(crate) fn pop_animation(&mut self) -> Option<AnimationEvent> {
        self.animations.pop()
    }

    pub(crate) fn evict_messages(&mut self) -> usize {
        self.messages.evict()
    }

    /// Apply one parsed command. On error nothing has been modified.
    pub fn apply(&mut self, command: ServerCommand) -> Result<(), DispatchError> {
        let changed = match command {
            ServerCommand::MapSize { width, height } => self.resize(width, height)?,
            ServerCommand::TileContent { x, y, content } => self.set_tile(x, y, content)?,
            ServerCommand::TeamName { name } => self.register_team(name),
            ServerCommand::PlayerNew(record) => self.add_player(record)?,
            ServerCommand::PlayerPosition {
                id,
                x,
                y,
                orientation,
            } => self.move_player(id, x, y, orientation)?,
            ServerCommand::PlayerLevel { id, level } => {
                self.living_mut(id)?.level = level;
                true
            }
            ServerCommand::PlayerInventory { id, x, y, content } => {
                let player = self.living_mut(id)?;
                player.x = x;
                player.y = y;
                player.inventory = content;
                true
            }
            ServerCommand::PlayerExpel { id } => self.expel_player(id)?,
            ServerCommand::PlayerBroadcast { id, message } => self.broadcast(id, message)?,
            ServerCommand::IncantationStart {
                x,
                y,
                level,
                participants,
            } => self.start_incantation(x, y, level, &participants),
            ServerCommand::IncantationEnd { x, y, result } => self.end_incantation(x, y, result),
            ServerCommand::PlayerFork { id } => {
                self.log_server(
                    format!("{} is laying an egg", player_label(id)),
                    MessageCategory::Egg,
                    false,
                );
                true
            }
            ServerCommand::PlayerDrop { id, resource } => self.log_resource(id, resource, "dropped"),
            ServerCommand::PlayerTake { id, resource } => {
                self.log_resource(id, resource, "collected")
            }
            ServerCommand::PlayerDeath { id } => self.kill_player(id)?,
            ServerCommand::EggNew { egg, parent, x, y } => {
                let text = match parent {
                    Some(parent) => format!(
                        "Egg #{} laid by {} at ({}, {})",
                        egg,
                        player_label(parent),
                        x,
                        y
                    ),
                    None => format!("Egg #{} spawned at ({}, {})", egg, x, y),
                };
                self.log_server(text, MessageCategory::Egg, false);
                true
            }
            ServerCommand::EggHatch { egg } => {
                self.log_server(
                    format!("A player connected through egg #{}", egg),
                    MessageCategory::Egg,
                    false,
                );
                true
            }
            ServerCommand::EggDestroy { egg } => {
                self.log_server(
                    format!("Egg #{} was destroyed", egg),
                    MessageCategory::Egg,
                    false,
                );
                true
            }
            ServerCommand::TimeUnit { frequency } => self.set_frequency(frequency),
            ServerCommand::TimeUnitSet { frequency } => {
                self.log_server(
                    format!("Time unit set to {}", frequency),
                    MessageCategory::Info,
                    false,
                );
                self.set_frequency(frequency);
                true
            }
            ServerCommand::EndOfGame { team } => {
                self.game_ended = true;
                self.winner = self.team(&team).cloned();
                self.log_server(
                    format!("Team {} wins the game!", team),
                    MessageCategory::Victory,
                    true,
                );
                true
            }
            ServerCommand::ServerMessage { text } => {
                self.log_server(text, MessageCategory::Info, false);
                true
            }
            ServerCommand::UnknownCommand => {
                self.log_server(
                    "Server reported an unknown command",
                    MessageCategory::Error,
                    false,
                );
                true
            }
            ServerCommand::BadParameter => {
                self.log_server(
                    "Server reported a bad command parameter",
                    MessageCategory::Error,
                    false,
                );
                true
            }
        };

        if changed {
            self.changed = true;
        }
        Ok(())
    }

    fn tile_index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<bool, DispatchError> {
        if u64::from(width) * u64::from(height) > MAX_TILE_COUNT {
            return Err(DispatchError::MapTooLarge { width, height });
        }
        self.width = width;
        self.height = height;
        self.tiles.clear();
        self.tiles
            .resize(width as usize * height as usize, Inventory::default());
        Ok(true)
    }

    fn set_tile(&mut self, x: u32, y: u32, content: Inventory) -> Result<bool, DispatchError> {
        let index = self
            .tile_index(x, y)
            .ok_or(DispatchError::TileOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })?;
        self.tiles[index] = content;
        Ok(true)
    }

    fn register_team(&mut self, name: String) -> bool {
        if self.team(&name).is_some() {
            trace!(target: "zappy::world", team = %name, "team.already_known");
            return false;
        }
        let color = self.palette[self.teams.len() % self.palette.len()];
        self.teams.push(Team::new(name, color));
        true
    }

    fn add_player(&mut self, record: PlayerRecord) -> Result<bool, DispatchError> {
        if self.teams.iter().any(|team| team.knows(record.id)) {
            return Err(DispatchError::DuplicatePlayer(record.id));
        }
        let team = self
            .teams
            .iter_mut()
            .find(|team| team.name == record.team)
            .ok_or_else(|| DispatchError::UnknownTeam(record.team.clone()))?;
        let player = Player::from_record(record);
        let text = format!("{} joined team {}", player.label(), team.name);
        team.players.push(player);
        self.log_server(text, MessageCategory::Event, false);
        Ok(true)
    }

    fn living_mut(&mut self, id: PlayerId) -> Result<&mut Player, DispatchError> {
        self.teams
            .iter_mut()
            .find_map(|team| team.living_mut(id))
            .ok_or(DispatchError::UnknownPlayer(id))
    }

    fn living(&self, id: PlayerId) -> Result<&Player, DispatchError> {
        self.living_players()
            .find(|player| player.id == id)
            .ok_or(DispatchError::UnknownPlayer(id))
    }

    fn move_player(
        &mut self,
        id: PlayerId,
        x: u32,
        y: u32,
        orientation: Orientation,
    ) -> Result<bool, DispatchError> {
        let player = self.living_mut(id)?;
        player.x = x;
        player.y = y;
        player.orientation = orientation;
        Ok(true)
    }

    fn retire(&mut self, id: PlayerId) -> Result<Player, DispatchError> {
        self.teams
            .iter_mut()
            .find_map(|team| team.retire(id).cloned())
            .ok_or(DispatchError::UnknownPlayer(id))
    }

    fn expel_player(&mut self, id: PlayerId) -> Result<bool, DispatchError> {
        let player = self.retire(id)?;
        self.log_server(
            format!("{} has left the game.", player.label()),
            MessageCategory::Event,
            true,
        );
        Ok(true)
    }

    fn kill_player(&mut self, id: PlayerId) -> Result<bool, DispatchError> {
        let player = self.retire(id)?;
        self.log_server(
            format!("{} of team {} died", player.label(), player.team),
            MessageCategory::Death,
            true,
        );
        Ok(true)
    }

    fn broadcast(&mut self, id: PlayerId, message: String) -> Result<bool, DispatchError> {
        let sender = self.living(id)?;
        let label = sender.label();
        let (x, y, team) = (sender.x, sender.y, sender.team.clone());
        self.messages.push(Message::new(
            message,
            MessageCategory::Broadcast,
            label,
            false,
        ));
        self.queue_animation(AnimationEvent {
            kind: AnimationKind::Broadcast,
            x,
            y,
            duration: self.broadcast_duration,
            team: Some(team),
        });
        Ok(true)
    }

    fn start_incantation(&mut self, x: u32, y: u32, level: u32, participants: &[PlayerId]) -> bool {
        let names = participants
            .iter()
            .map(|id| format!("#{}", id))
            .collect::<Vec<_>>()
            .join(", ");
        let team = participants
            .first()
            .and_then(|id| self.living(*id).ok())
            .map(|player| player.team.clone());
        self.log_server(
            format!(
                "Incantation for level {} started at ({}, {}) by {}",
                level, x, y, names
            ),
            MessageCategory::Incantation,
            false,
        );
        self.queue_animation(AnimationEvent {
            kind: AnimationKind::IncantationStart,
            x,
            y,
            duration: self.incantation_duration,
            team,
        });
        true
    }

    fn end_incantation(&mut self, x: u32, y: u32, result: IncantationResult) -> bool {
        let (verb, kind) = match result {
            IncantationResult::Success => ("succeeded", AnimationKind::IncantationSuccess),
            IncantationResult::Failure => ("failed", AnimationKind::IncantationFailure),
        };
        self.log_server(
            format!("Incantation at ({}, {}) {}", x, y, verb),
            MessageCategory::Incantation,
            true,
        );
        self.queue_animation(AnimationEvent {
            kind,
            x,
            y,
            duration: self.incantation_duration,
            team: None,
        });
        true
    }

    fn log_resource(&mut self, id: PlayerId, resource: ResourceKind, verb: &str) -> bool {
        self.log_server(
            format!("{} {} {}", player_label(id), verb, resource.as_str()),
            MessageCategory::Resource,
            false,
        );
        true
    }

    fn set_frequency(&mut self, frequency: u32) -> bool {
        self.frequency = Some(frequency);
        true
    }

    fn log_server(&mut self, text: impl Into<String>, category: MessageCategory, important: bool) {
        self.messages.push(Message::server(text, category, important));
    }

    fn queue_animation(&mut self, event: AnimationEvent) {
        if self.animations.push(event) {
            trace!(target: "zappy::world", "animation.dropped_oldest");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::DEFAULT_TEAM_PALETTE;
    use zappy_proto::parse_server_line;

    fn apply(world: &mut WorldState, line: &str) -> Result<(), DispatchError> {
        world.apply(parse_server_line(line)?)
    }

    fn world_with_team() -> WorldState {
        let mut world = WorldState::default();
        apply(&mut world, "msz 5 4").unwrap();
        apply(&mut world, "tna red").unwrap();
        apply(&mut world, "pnw #1 1 1 1 1 red").unwrap();
        apply(&mut world, "pnw #2 2 2 1 3 red").unwrap();
        world
    }

    #[test]
    fn resize_resets_every_tile() {
        let mut world = WorldState::default();
        apply(&mut world, "msz 3 2").unwrap();
        apply(&mut world, "bct 1 1 1 1 1 1 1 1 1").unwrap();
        apply(&mut world, "msz 4 3").unwrap();
        assert_eq!(world.tiles().len(), 12);
        assert!(world.tiles().iter().all(Inventory::is_empty));
    }

    #[test]
    fn huge_maps_are_refused() {
        let mut world = WorldState::default();
        let err = apply(&mut world, "msz 100000 100000").unwrap_err();
        assert!(matches!(err, DispatchError::MapTooLarge { .. }));
        assert_eq!(world.width(), 0);
    }

    #[test]
    fn out_of_range_tile_is_dropped() {
        let mut world = WorldState::default();
        apply(&mut world, "msz 2 2").unwrap();
        let before = world.tiles().to_vec();
        let err = apply(&mut world, "bct 2 0 9 9 9 9 9 9 9").unwrap_err();
        assert!(matches!(err, DispatchError::TileOutOfBounds { x: 2, y: 0, .. }));
        assert_eq!(world.tiles(), before.as_slice());
    }

    #[test]
    fn tile_overwrite_is_exact_and_indexed_row_major() {
        let mut world = WorldState::default();
        apply(&mut world, "msz 3 2").unwrap();
        apply(&mut world, "bct 2 1 1 2 3 4 5 6 7").unwrap();
        assert_eq!(world.tiles()[5].counts(), [1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(world.tile(2, 1), Some(&world.tiles()[5]));
        assert_eq!(world.tile(3, 0), None);
    }

    #[test]
    fn team_colors_cycle_through_palette() {
        let mut world = WorldState::default();
        let count = DEFAULT_TEAM_PALETTE.len() + 2;
        for index in 0..count {
            apply(&mut world, &format!("tna team{index}")).unwrap();
        }
        let colors: Vec<Color> = world.teams().iter().map(|team| team.color).collect();
        assert_eq!(&colors[..DEFAULT_TEAM_PALETTE.len()], &DEFAULT_TEAM_PALETTE);
        assert_eq!(colors[DEFAULT_TEAM_PALETTE.len()], DEFAULT_TEAM_PALETTE[0]);
        assert_eq!(colors[DEFAULT_TEAM_PALETTE.len() + 1], DEFAULT_TEAM_PALETTE[1]);
    }

    #[test]
    fn repeated_team_name_keeps_first_registration() {
        let mut world = WorldState::default();
        apply(&mut world, "tna red").unwrap();
        apply(&mut world, "tna blue").unwrap();
        world.clear_changed();
        apply(&mut world, "tna red").unwrap();
        assert_eq!(world.teams().len(), 2);
        assert!(!world.changed());
    }

    #[test]
    fn player_for_unknown_team_is_rejected() {
        let mut world = WorldState::default();
        let err = apply(&mut world, "pnw #1 0 0 1 1 ghosts").unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTeam(name) if name == "ghosts"));
        assert_eq!(world.living_count(), 0);
        assert!(world.messages().is_empty());
    }

    #[test]
    fn duplicate_player_ids_are_rejected() {
        let mut world = world_with_team();
        let err = apply(&mut world, "pnw #1 0 0 1 1 red").unwrap_err();
        assert!(matches!(err, DispatchError::DuplicatePlayer(1)));
        assert_eq!(world.living_count(), 2);
    }

    #[test]
    fn death_retires_exactly_one_player() {
        let mut world = world_with_team();
        apply(&mut world, "pdi #1").unwrap();
        assert_eq!(world.living_count(), 1);
        assert_eq!(world.dead_count(), 1);
        let dead = world.player(1).unwrap();
        assert!(!dead.alive);
        let survivor = world.player(2).unwrap();
        assert!(survivor.alive);
        assert_eq!(survivor.level, 3);

        let last = world.messages().iter().last().unwrap();
        assert_eq!(last.category, MessageCategory::Death);
        assert!(last.important);
    }

    #[test]
    fn expulsion_retires_and_logs_departure() {
        let mut world = world_with_team();
        apply(&mut world, "pex #2").unwrap();
        assert_eq!(world.team("red").map(Team::living_count), Some(1));
        assert_eq!(world.team("red").map(Team::dead_count), Some(1));
        let last = world.messages().iter().last().unwrap();
        assert_eq!(last.text, "Player #2 has left the game.");
    }

    #[test]
    fn unknown_ids_change_nothing() {
        let mut world = world_with_team();
        let messages_before = world.messages().len();
        world.clear_changed();
        for line in ["pdi #9", "pex #9", "ppo #9 1 1 1", "plv #9 2", "pbc #9 hi"] {
            let err = apply(&mut world, line).unwrap_err();
            assert!(matches!(err, DispatchError::UnknownPlayer(9)), "{line}");
        }
        assert_eq!(world.living_count(), 2);
        assert_eq!(world.dead_count(), 0);
        assert_eq!(world.messages().len(), messages_before);
        assert!(!world.changed());
    }

    #[test]
    fn retired_players_are_never_resurrected() {
        let mut world = world_with_team();
        apply(&mut world, "pdi #1").unwrap();
        assert!(apply(&mut world, "ppo #1 3 3 2").is_err());
        assert!(apply(&mut world, "pdi #1").is_err());
        assert!(apply(&mut world, "pnw #1 0 0 1 1 red").is_err());
        assert_eq!(world.dead_count(), 1);
        assert!(!world.player(1).unwrap().alive);
    }

    #[test]
    fn inventory_update_carries_position() {
        let mut world = world_with_team();
        apply(&mut world, "pin #2 4 3 9 1 0 0 0 0 2").unwrap();
        let player = world.player(2).unwrap();
        assert_eq!((player.x, player.y), (4, 3));
        assert_eq!(player.inventory.counts(), [9, 1, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn broadcast_logs_and_queues_animation_on_sender_tile() {
        let mut world = world_with_team();
        apply(&mut world, "ppo #2 3 1 4").unwrap();
        apply(&mut world, "pbc #2 hello team").unwrap();
        let last = world.messages().iter().last().unwrap();
        assert_eq!(last.text, "hello team");
        assert_eq!(last.to_string(), "[BROADCAST] Player #2: hello team");
        assert_eq!(last.source, "Player #2");
        assert_eq!(last.category, MessageCategory::Broadcast);

        let event = world.pop_animation().unwrap();
        assert_eq!(event.kind, AnimationKind::Broadcast);
        assert_eq!((event.x, event.y), (3, 1));
        assert_eq!(event.team.as_deref(), Some("red"));
        assert!(world.pop_animation().is_none());
    }

    #[test]
    fn incantation_cycle_emits_start_and_result() {
        let mut world = world_with_team();
        apply(&mut world, "pic 1 1 2 #1 #2").unwrap();
        apply(&mut world, "pie 1 1 ko").unwrap();
        let start = world.pop_animation().unwrap();
        assert_eq!(start.kind, AnimationKind::IncantationStart);
        assert_eq!(start.team.as_deref(), Some("red"));
        let end = world.pop_animation().unwrap();
        assert_eq!(end.kind, AnimationKind::IncantationFailure);
        let texts: Vec<&str> = world.messages().iter().map(|m| m.text.as_str()).collect();
        assert!(texts.contains(&"Incantation for level 2 started at (1, 1) by #1, #2"));
        assert!(texts.contains(&"Incantation at (1, 1) failed"));
    }

    #[test]
    fn end_of_game_binds_winner_snapshot_and_keeps_streaming() {
        let mut world = world_with_team();
        apply(&mut world, "seg red").unwrap();
        assert!(world.game_ended());
        let winner = world.winner().cloned().unwrap();
        assert_eq!(winner.name, "red");
        assert_eq!(winner.living_count(), 2);

        apply(&mut world, "pdi #1").unwrap();
        assert_eq!(world.winner().map(Team::living_count), Some(2));
        assert_eq!(world.living_count(), 1);
    }

    #[test]
    fn total_resources_sum_every_tile() {
        let mut world = WorldState::default();
        apply(&mut world, "msz 2 2").unwrap();
        apply(&mut world, "bct 0 0 1 0 0 0 0 0 1").unwrap();
        apply(&mut world, "bct 1 0 2 1 0 0 0 0 0").unwrap();
        apply(&mut world, "bct 1 1 0 0 5 0 0 3 0").unwrap();
        assert_eq!(world.total_resources().counts(), [3, 1, 5, 0, 0, 3, 1]);
    }

    #[test]
    fn time_unit_updates_frequency() {
        let mut world = WorldState::default();
        assert_eq!(world.frequency(), None);
        apply(&mut world, "sgt 100").unwrap();
        assert_eq!(world.frequency(), Some(100));
        apply(&mut world, "sst 250").unwrap();
        assert_eq!(world.frequency(), Some(250));
    }

    #[test]
    fn message_log_reads_like_a_match_report() {
        let mut world = WorldState::default();
        for line in [
            "msz 10 10",
            "tna teamA",
            "pnw #1 3 3 2 1 teamA",
            "pbc #1 hi",
            "pfk #1",
            "enw #5 #1 3 3",
            "pgt #1 0",
            "pic 3 3 1 #1",
            "pie 3 3 ok",
            "smg hello",
            "pdi #1",
            "seg teamA",
            "suc",
        ] {
            apply(&mut world, line).unwrap();
        }
        let rendered = world
            .messages()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(rendered, @r###"
        [EVENT] SERVER: Player #1 joined team teamA
        [BROADCAST] Player #1: hi
        [EGG] SERVER: Player #1 is laying an egg
        [EGG] SERVER: Egg #5 laid by Player #1 at (3, 3)
        [RESOURCE] SERVER: Player #1 collected food
        [INCANTATION] SERVER: Incantation for level 1 started at (3, 3) by #1
        [INCANTATION] SERVER: Incantation at (3, 3) succeeded
        [INFO] SERVER: hello
        [DEATH] SERVER: Player #1 of team teamA died
        [VICTORY] SERVER: Team teamA wins the game!
        [ERROR] SERVER: Server reported an unknown command
        "###);
    }

    #[test]
    fn log_stays_bounded_after_every_line() {
        let config = SpectatorConfig {
            message_log: crate::config::MessageLogConfig {
                ceiling: 20,
                eviction_batch: 5,
            },
            ..SpectatorConfig::default()
        };
        let mut world = WorldState::new(&config);
        apply(&mut world, "msz 4 4").unwrap();
        for index in 0..100 {
            let line = if index % 10 == 0 {
                "pie 0 0 ok".to_string()
            } else {
                format!("smg chatter {index}")
            };
            apply(&mut world, &line).unwrap();
            world.evict_messages();
            assert!(
                world.messages().len() <= 25,
                "{} entries after line {index}",
                world.messages().len()
            );
        }
        let kept_important = world.messages().iter().filter(|m| m.important).count();
        assert_eq!(kept_important, 10);
    }
}
