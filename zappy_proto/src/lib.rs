//! Wire contracts for the Zappy graphical protocol.
//!
//! The server speaks newline-delimited ASCII. This crate turns one server line
//! into a typed [`ServerCommand`] and encodes the spectator's own
//! [`ClientRequest`]s, without knowing anything about sockets or shared state.

mod command_text;
mod commands;
mod inventory;

pub use command_text::{parse_server_line, split_tag, CommandParseError};
pub use commands::{
    ClientRequest, EggId, IncantationResult, Orientation, PlayerId, PlayerRecord, ServerCommand,
    GRAPHIC_HANDSHAKE, GREETING,
};
pub use inventory::{Inventory, ResourceKind};
