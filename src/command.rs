//! Display commands fetched from the sign server

use serde::Deserialize;

use crate::BoardError;

/// What the server wants the sign to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommand {
    Test,
    LeftArrow,
    RightArrow,
    Cross,
}

/// Body of the command GET response
#[derive(Debug, Deserialize)]
struct CommandResponse {
    command: i32,
}

impl DisplayCommand {
    /// Map a server command code; unknown codes yield `None`
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(DisplayCommand::Test),
            1 => Some(DisplayCommand::LeftArrow),
            2 => Some(DisplayCommand::RightArrow),
            3 => Some(DisplayCommand::Cross),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            DisplayCommand::Test => 0,
            DisplayCommand::LeftArrow => 1,
            DisplayCommand::RightArrow => 2,
            DisplayCommand::Cross => 3,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DisplayCommand::Test => "TEST MODE",
            DisplayCommand::LeftArrow => "LEFT ARROW",
            DisplayCommand::RightArrow => "RIGHT ARROW",
            DisplayCommand::Cross => "CROSS",
        }
    }
}

/// Extract the raw command code from a `{"command": int}` body
pub fn parse_command_code(body: &[u8]) -> Result<i32, BoardError> {
    let (response, _): (CommandResponse, usize) =
        serde_json_core::from_slice(body).map_err(|_| BoardError::ProtocolError)?;
    Ok(response.command)
}

/// Parse a command body and map it to a display intent.
///
/// Unknown codes are logged and ignored.
pub fn decode_command(body: &[u8]) -> Result<Option<DisplayCommand>, BoardError> {
    let code = parse_command_code(body)?;
    log::info!("[COMMAND] Received command: {}", code);

    match DisplayCommand::from_code(code) {
        Some(command) => {
            log::info!("[COMMAND] -> {} (state {})", command.description(), code);
            Ok(Some(command))
        }
        None => {
            log::warn!("[COMMAND] -> Unknown state: {}", code);
            Ok(None)
        }
    }
}
