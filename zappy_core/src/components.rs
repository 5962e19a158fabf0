use serde::{Deserialize, Serialize};
use zappy_proto::{Inventory, Orientation, PlayerId, PlayerRecord};

/// RGB display color handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Team colors, handed out in creation order and reused once exhausted.
pub const DEFAULT_TEAM_PALETTE: [Color; 8] = [
    Color::rgb(231, 76, 60),
    Color::rgb(52, 152, 219),
    Color::rgb(46, 204, 113),
    Color::rgb(241, 196, 15),
    Color::rgb(155, 89, 182),
    Color::rgb(230, 126, 34),
    Color::rgb(26, 188, 156),
    Color::rgb(236, 240, 241),
];

/// A player as last asserted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub team: String,
    pub x: u32,
    pub y: u32,
    pub orientation: Orientation,
    pub level: u32,
    pub alive: bool,
    pub inventory: Inventory,
}

impl Player {
    pub fn from_record(record: PlayerRecord) -> Self {
        Self {
            id: record.id,
            team: record.team,
            x: record.x,
            y: record.y,
            orientation: record.orientation,
            level: record.level,
            alive: true,
            inventory: Inventory::default(),
        }
    }

    /// Label used as a message source and in log lines.
    pub fn label(&self) -> String {
        player_label(self.id)
    }
}

pub fn player_label(id: PlayerId) -> String {
    format!("Player #{}", id)
}

/// A team and the players that belong to it.
///
/// `players` is the living roster; players that died or were expelled move to
/// `retired`. Counts are derived from those two lists and never stored apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub color: Color,
    pub players: Vec<Player>,
    pub retired: Vec<Player>,
}

impl Team {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            players: Vec::new(),
            retired: Vec::new(),
        }
    }

    pub fn living_count(&self) -> usize {
        self.players.len()
    }

    pub fn dead_count(&self) -> usize {
        self.retired.len()
    }

    /// Highest level among living members, `0` for an empty roster.
    pub fn max_level(&self) -> u32 {
        self.players
            .iter()
            .map(|player| player.level)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn living_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub(crate) fn knows(&self, id: PlayerId) -> bool {
        self.players
            .iter()
            .chain(self.retired.iter())
            .any(|player| player.id == id)
    }

    /// Move a living player out of the roster. This is the only path that
    /// changes the living/dead split.
    pub(crate) fn retire(&mut self, id: PlayerId) -> Option<&Player> {
        let index = self.players.iter().position(|player| player.id == id)?;
        let mut player = self.players.remove(index);
        player.alive = false;
        self.retired.push(player);
        self.retired.last()
    }
}
