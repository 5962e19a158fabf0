use std::num::ParseIntError;
use std::str::SplitWhitespace;

use thiserror::Error;

use crate::{
    IncantationResult, Inventory, Orientation, PlayerId, PlayerRecord, ResourceKind,
    ServerCommand,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("line too short to carry a command tag")]
    Empty,
    #[error("unknown command tag: {0}")]
    UnknownTag(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
    #[error("invalid id token '{value}' for {context}")]
    InvalidId {
        value: String,
        context: &'static str,
    },
    #[error("invalid orientation code {0}")]
    InvalidOrientation(u32),
    #[error("invalid resource code {0}")]
    InvalidResource(u32),
    #[error("invalid player level {0}")]
    InvalidLevel(u32),
}

/// Split a raw line into its fixed-width tag and payload.
///
/// The first three bytes are the tag, the character after them is a separator
/// that is discarded whatever its width, and the payload is the rest.
pub fn split_tag(line: &str) -> Option<(&str, &str)> {
    let tag = line.get(..3)?;
    let mut rest = line[3..].chars();
    rest.next();
    Some((tag, rest.as_str()))
}

/// Parse one server line into a [`ServerCommand`].
///
/// Tags are case-sensitive. An unrecognized tag yields
/// [`CommandParseError::UnknownTag`], which callers treat as "ignore".
pub fn parse_server_line(line: &str) -> Result<ServerCommand, CommandParseError> {
    let (tag, payload) = split_tag(line).ok_or(CommandParseError::Empty)?;
    let mut parts = payload.split_whitespace();

    match tag {
        "msz" => {
            let width = next_u32(&mut parts, "map width")?;
            let height = next_u32(&mut parts, "map height")?;
            Ok(ServerCommand::MapSize { width, height })
        }
        "bct" => {
            let x = next_u32(&mut parts, "tile x")?;
            let y = next_u32(&mut parts, "tile y")?;
            let content = next_inventory(&mut parts)?;
            Ok(ServerCommand::TileContent { x, y, content })
        }
        "tna" => {
            let name = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("team name"))?;
            Ok(ServerCommand::TeamName {
                name: name.to_string(),
            })
        }
        "pnw" => {
            let id = next_id(&mut parts, "new player id")?;
            let x = next_u32(&mut parts, "new player x")?;
            let y = next_u32(&mut parts, "new player y")?;
            let orientation = next_orientation(&mut parts)?;
            let level = next_level(&mut parts)?;
            let team = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("new player team"))?;
            Ok(ServerCommand::PlayerNew(PlayerRecord {
                id,
                x,
                y,
                orientation,
                level,
                team: team.to_string(),
            }))
        }
        "ppo" => {
            let id = next_id(&mut parts, "position player id")?;
            let x = next_u32(&mut parts, "position x")?;
            let y = next_u32(&mut parts, "position y")?;
            let orientation = next_orientation(&mut parts)?;
            Ok(ServerCommand::PlayerPosition {
                id,
                x,
                y,
                orientation,
            })
        }
        "plv" => {
            let id = next_id(&mut parts, "level player id")?;
            let level = next_level(&mut parts)?;
            Ok(ServerCommand::PlayerLevel { id, level })
        }
        "pin" => {
            let id = next_id(&mut parts, "inventory player id")?;
            let x = next_u32(&mut parts, "inventory x")?;
            let y = next_u32(&mut parts, "inventory y")?;
            let content = next_inventory(&mut parts)?;
            Ok(ServerCommand::PlayerInventory { id, x, y, content })
        }
        "pex" => Ok(ServerCommand::PlayerExpel {
            id: next_id(&mut parts, "expelled player id")?,
        }),
        "pbc" => {
            let (id_token, message) = split_first_token(payload);
            let id = parse_id(id_token, "broadcast player id")?;
            Ok(ServerCommand::PlayerBroadcast {
                id,
                message: message.trim_end().to_string(),
            })
        }
        "pic" => {
            let x = next_u32(&mut parts, "incantation x")?;
            let y = next_u32(&mut parts, "incantation y")?;
            let level = next_level(&mut parts)?;
            let participants = parts
                .map(|token| parse_id(token, "incantation participant"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ServerCommand::IncantationStart {
                x,
                y,
                level,
                participants,
            })
        }
        "pie" => {
            let x = next_u32(&mut parts, "incantation x")?;
            let y = next_u32(&mut parts, "incantation y")?;
            let token = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("incantation result"))?;
            let result = match token {
                "ok" | "1" => IncantationResult::Success,
                _ => IncantationResult::Failure,
            };
            Ok(ServerCommand::IncantationEnd { x, y, result })
        }
        "pfk" => Ok(ServerCommand::PlayerFork {
            id: next_id(&mut parts, "forking player id")?,
        }),
        "pdr" => {
            let id = next_id(&mut parts, "dropping player id")?;
            let resource = next_resource(&mut parts)?;
            Ok(ServerCommand::PlayerDrop { id, resource })
        }
        "pgt" => {
            let id = next_id(&mut parts, "collecting player id")?;
            let resource = next_resource(&mut parts)?;
            Ok(ServerCommand::PlayerTake { id, resource })
        }
        "pdi" => Ok(ServerCommand::PlayerDeath {
            id: next_id(&mut parts, "dead player id")?,
        }),
        "enw" => {
            let egg = next_id(&mut parts, "egg id")?;
            let parent_token = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("egg parent id"))?;
            let parent = parse_parent_id(parent_token)?;
            let x = next_u32(&mut parts, "egg x")?;
            let y = next_u32(&mut parts, "egg y")?;
            Ok(ServerCommand::EggNew { egg, parent, x, y })
        }
        "ebo" => Ok(ServerCommand::EggHatch {
            egg: next_id(&mut parts, "hatched egg id")?,
        }),
        "edi" => Ok(ServerCommand::EggDestroy {
            egg: next_id(&mut parts, "destroyed egg id")?,
        }),
        "sgt" => Ok(ServerCommand::TimeUnit {
            frequency: next_u32(&mut parts, "time unit")?,
        }),
        "sst" => Ok(ServerCommand::TimeUnitSet {
            frequency: next_u32(&mut parts, "time unit")?,
        }),
        "seg" => {
            let team = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("winning team"))?;
            Ok(ServerCommand::EndOfGame {
                team: team.to_string(),
            })
        }
        "smg" => Ok(ServerCommand::ServerMessage {
            text: payload.trim().to_string(),
        }),
        "suc" => Ok(ServerCommand::UnknownCommand),
        "sbp" => Ok(ServerCommand::BadParameter),
        other => Err(CommandParseError::UnknownTag(other.to_string())),
    }
}

fn split_first_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(index) => (&text[..index], text[index..].trim_start()),
        None => (text, ""),
    }
}

fn next_u32(
    parts: &mut SplitWhitespace<'_>,
    context: &'static str,
) -> Result<u32, CommandParseError> {
    let value = parts
        .next()
        .ok_or(CommandParseError::MissingArgument(context))?;
    parse_u32(value, context)
}

fn parse_u32(value: &str, context: &'static str) -> Result<u32, CommandParseError> {
    value
        .parse::<u32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn next_id(
    parts: &mut SplitWhitespace<'_>,
    context: &'static str,
) -> Result<PlayerId, CommandParseError> {
    let value = parts
        .next()
        .ok_or(CommandParseError::MissingArgument(context))?;
    parse_id(value, context)
}

/// Ids travel as a type character followed by decimal digits (`#12`).
fn parse_id(token: &str, context: &'static str) -> Result<PlayerId, CommandParseError> {
    let mut chars = token.chars();
    if chars.next().is_none() {
        return Err(CommandParseError::MissingArgument(context));
    }
    let digits = chars.as_str();
    if digits.is_empty() {
        return Err(CommandParseError::InvalidId {
            value: token.to_string(),
            context,
        });
    }
    parse_u32(digits, context)
}

fn parse_parent_id(token: &str) -> Result<Option<PlayerId>, CommandParseError> {
    let digits = token.get(1..).unwrap_or("");
    if digits.starts_with('-') {
        return Ok(None);
    }
    parse_id(token, "egg parent id").map(Some)
}

fn next_orientation(parts: &mut SplitWhitespace<'_>) -> Result<Orientation, CommandParseError> {
    let code = next_u32(parts, "orientation")?;
    Orientation::from_code(code).ok_or(CommandParseError::InvalidOrientation(code))
}

fn next_level(parts: &mut SplitWhitespace<'_>) -> Result<u32, CommandParseError> {
    let level = next_u32(parts, "level")?;
    if level == 0 {
        return Err(CommandParseError::InvalidLevel(level));
    }
    Ok(level)
}

fn next_resource(parts: &mut SplitWhitespace<'_>) -> Result<ResourceKind, CommandParseError> {
    let code = next_u32(parts, "resource code")?;
    ResourceKind::from_code(code).ok_or(CommandParseError::InvalidResource(code))
}

fn next_inventory(parts: &mut SplitWhitespace<'_>) -> Result<Inventory, CommandParseError> {
    let mut counts = [0u32; 7];
    for (slot, kind) in counts.iter_mut().zip(ResourceKind::ALL) {
        *slot = next_u32(parts, kind.as_str())?;
    }
    Ok(Inventory::from_counts(counts))
}
