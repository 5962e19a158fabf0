use thiserror::Error;
use tracing::{debug, trace};
use zappy_proto::{parse_server_line, CommandParseError, PlayerId};

use crate::world::WorldState;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error("no living player with id #{0}")]
    UnknownPlayer(PlayerId),
    #[error("team '{0}' has not been announced")]
    UnknownTeam(String),
    #[error("player #{0} was already announced")]
    DuplicatePlayer(PlayerId),
    #[error("tile ({x}, {y}) outside {width}x{height} map")]
    TileOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("map {width}x{height} exceeds the supported tile count")]
    MapTooLarge { width: u32, height: u32 },
}

/// What happened to one server line.
#[derive(Debug)]
pub enum DispatchOutcome {
    Applied,
    /// Blank line or a tag this client does not handle.
    Ignored,
    Rejected(DispatchError),
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied)
    }
}

/// Route one server line to its handler. Never fails the caller: malformed
/// or inconsistent lines are logged and dropped without touching `world`.
pub fn dispatch_line(world: &mut WorldState, line: &str) -> DispatchOutcome {
    let command = match parse_server_line(line) {
        Ok(command) => command,
        Err(CommandParseError::Empty) => return DispatchOutcome::Ignored,
        Err(CommandParseError::UnknownTag(tag)) => {
            trace!(target: "zappy::dispatch", tag = %tag, "line.unhandled_tag");
            return DispatchOutcome::Ignored;
        }
        Err(err) => {
            debug!(
                target: "zappy::dispatch",
                line = %line,
                error = %err,
                "line.malformed"
            );
            return DispatchOutcome::Rejected(err.into());
        }
    };

    let tag = command.tag();
    match world.apply(command) {
        Ok(()) => DispatchOutcome::Applied,
        Err(err) => {
            debug!(
                target: "zappy::dispatch",
                tag,
                error = %err,
                "line.rejected"
            );
            DispatchOutcome::Rejected(err)
        }
    }
}
