//! Command vocabulary understood by the hexapod controller.
//!
//! Every command travels as a fixed lowercase ASCII token ending in a colon,
//! one token per write, with no terminator, length prefix or acknowledgment.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseCommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Standby,
    LayDown,
    Walk0,
    Walk180,
    WalkR45,
    WalkR90,
    WalkR135,
    WalkL45,
    WalkL90,
    WalkL135,
    FastForward,
    FastBackward,
    TurnLeft,
    TurnRight,
    ClimbForward,
    ClimbBackward,
    RotateX,
    RotateY,
    RotateZ,
    Twist,
}

impl Command {
    pub const ALL: [Command; 20] = [
        Command::Standby,
        Command::LayDown,
        Command::Walk0,
        Command::Walk180,
        Command::WalkR45,
        Command::WalkR90,
        Command::WalkR135,
        Command::WalkL45,
        Command::WalkL90,
        Command::WalkL135,
        Command::FastForward,
        Command::FastBackward,
        Command::TurnLeft,
        Command::TurnRight,
        Command::ClimbForward,
        Command::ClimbBackward,
        Command::RotateX,
        Command::RotateY,
        Command::RotateZ,
        Command::Twist,
    ];

    pub const fn wire_token(self) -> &'static str {
        match self {
            Command::Standby => "standby:",
            Command::LayDown => "laydown:",
            Command::Walk0 => "walk0:",
            Command::Walk180 => "walk180:",
            Command::WalkR45 => "walkr45:",
            Command::WalkR90 => "walkr90:",
            Command::WalkR135 => "walkr135:",
            Command::WalkL45 => "walkl45:",
            Command::WalkL90 => "walkl90:",
            Command::WalkL135 => "walkl135:",
            Command::FastForward => "fastforward:",
            Command::FastBackward => "fastbackward:",
            Command::TurnLeft => "turnleft:",
            Command::TurnRight => "turnright:",
            Command::ClimbForward => "climbforward:",
            Command::ClimbBackward => "climbbackward:",
            Command::RotateX => "rotatex:",
            Command::RotateY => "rotatey:",
            Command::RotateZ => "rotatez:",
            Command::Twist => "twist:",
        }
    }

    /// Token without its trailing colon.
    pub fn name(self) -> &'static str {
        let token = self.wire_token();
        &token[..token.len() - 1]
    }

    pub fn is_neutral(self) -> bool {
        self == Command::Standby
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_token())
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let name = trimmed.strip_suffix(':').unwrap_or(trimmed);
        Command::ALL
            .into_iter()
            .find(|command| command.name() == name)
            .ok_or_else(|| ParseCommandError(value.to_string()))
    }
}
