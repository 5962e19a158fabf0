use serde::{Deserialize, Serialize};

use crate::Inventory;

/// Greeting line the server sends before anything else.
pub const GREETING: &str = "WELCOME";

/// Reply that registers the connection as a graphical spectator.
pub const GRAPHIC_HANDSHAKE: &str = "GRAPHIC\n";

pub type PlayerId = u32;
pub type EggId = u32;

/// Facing of a player, encoded `1..=4` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Orientation::North),
            2 => Some(Orientation::East),
            3 => Some(Orientation::South),
            4 => Some(Orientation::West),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Orientation::North => 1,
            Orientation::East => 2,
            Orientation::South => 3,
            Orientation::West => 4,
        }
    }
}

/// Full description of a player as announced by `pnw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub x: u32,
    pub y: u32,
    pub orientation: Orientation,
    pub level: u32,
    pub team: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncantationResult {
    Success,
    Failure,
}

/// One fully parsed server notification.
///
/// Parsing always produces the whole value before anything is applied, so a
/// malformed trailing token never leaves a half-updated entity behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    MapSize {
        width: u32,
        height: u32,
    },
    TileContent {
        x: u32,
        y: u32,
        content: Inventory,
    },
    TeamName {
        name: String,
    },
    PlayerNew(PlayerRecord),
    PlayerPosition {
        id: PlayerId,
        x: u32,
        y: u32,
        orientation: Orientation,
    },
    PlayerLevel {
        id: PlayerId,
        level: u32,
    },
    PlayerInventory {
        id: PlayerId,
        x: u32,
        y: u32,
        content: Inventory,
    },
    PlayerExpel {
        id: PlayerId,
    },
    PlayerBroadcast {
        id: PlayerId,
        message: String,
    },
    IncantationStart {
        x: u32,
        y: u32,
        level: u32,
        participants: Vec<PlayerId>,
    },
    IncantationEnd {
        x: u32,
        y: u32,
        result: IncantationResult,
    },
    PlayerFork {
        id: PlayerId,
    },
    PlayerDrop {
        id: PlayerId,
        resource: crate::ResourceKind,
    },
    PlayerTake {
        id: PlayerId,
        resource: crate::ResourceKind,
    },
    PlayerDeath {
        id: PlayerId,
    },
    /// `parent` is `None` for eggs the server spawns on its own.
    EggNew {
        egg: EggId,
        parent: Option<PlayerId>,
        x: u32,
        y: u32,
    },
    EggHatch {
        egg: EggId,
    },
    EggDestroy {
        egg: EggId,
    },
    TimeUnit {
        frequency: u32,
    },
    TimeUnitSet {
        frequency: u32,
    },
    EndOfGame {
        team: String,
    },
    ServerMessage {
        text: String,
    },
    UnknownCommand,
    BadParameter,
}

impl ServerCommand {
    /// The wire tag this command was parsed from.
    pub fn tag(&self) -> &'static str {
        match self {
            ServerCommand::MapSize { .. } => "msz",
            ServerCommand::TileContent { .. } => "bct",
            ServerCommand::TeamName { .. } => "tna",
            ServerCommand::PlayerNew(_) => "pnw",
            ServerCommand::PlayerPosition { .. } => "ppo",
            ServerCommand::PlayerLevel { .. } => "plv",
            ServerCommand::PlayerInventory { .. } => "pin",
            ServerCommand::PlayerExpel { .. } => "pex",
            ServerCommand::PlayerBroadcast { .. } => "pbc",
            ServerCommand::IncantationStart { .. } => "pic",
            ServerCommand::IncantationEnd { .. } => "pie",
            ServerCommand::PlayerFork { .. } => "pfk",
            ServerCommand::PlayerDrop { .. } => "pdr",
            ServerCommand::PlayerTake { .. } => "pgt",
            ServerCommand::PlayerDeath { .. } => "pdi",
            ServerCommand::EggNew { .. } => "enw",
            ServerCommand::EggHatch { .. } => "ebo",
            ServerCommand::EggDestroy { .. } => "edi",
            ServerCommand::TimeUnit { .. } => "sgt",
            ServerCommand::TimeUnitSet { .. } => "sst",
            ServerCommand::EndOfGame { .. } => "seg",
            ServerCommand::ServerMessage { .. } => "smg",
            ServerCommand::UnknownCommand => "suc",
            ServerCommand::BadParameter => "sbp",
        }
    }
}

/// Requests a graphical client may send after the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    MapSize,
    MapContent,
    TeamNames,
    TileContent { x: u32, y: u32 },
    PlayerPosition(PlayerId),
    PlayerLevel(PlayerId),
    PlayerInventory(PlayerId),
    TimeUnit,
    SetTimeUnit(u32),
}

impl ClientRequest {
    /// Encode the request as a newline-terminated protocol line.
    pub fn to_line(&self) -> String {
        match self {
            ClientRequest::MapSize => "msz\n".to_string(),
            ClientRequest::MapContent => "mct\n".to_string(),
            ClientRequest::TeamNames => "tna\n".to_string(),
            ClientRequest::TileContent { x, y } => format!("bct {} {}\n", x, y),
            ClientRequest::PlayerPosition(id) => format!("ppo #{}\n", id),
            ClientRequest::PlayerLevel(id) => format!("plv #{}\n", id),
            ClientRequest::PlayerInventory(id) => format!("pin #{}\n", id),
            ClientRequest::TimeUnit => "sgt\n".to_string(),
            ClientRequest::SetTimeUnit(frequency) => format!("sst {}\n", frequency),
        }
    }
}
