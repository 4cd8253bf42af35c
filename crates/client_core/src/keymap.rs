//! Keyboard bindings for driving the robot without a touch surface.

use shared::protocol::Command;

/// Maps a key name to its command. Letter keys form a compass around `s`;
/// the arrow keys drive the outer ring.
pub fn command_for_key(key: &str) -> Option<Command> {
    let command = match key.trim().to_ascii_lowercase().as_str() {
        "w" => Command::Walk0,
        "e" => Command::WalkR45,
        "d" => Command::WalkR90,
        "c" => Command::WalkR135,
        "x" => Command::Walk180,
        "z" => Command::WalkL135,
        "a" => Command::WalkL90,
        "q" => Command::WalkL45,
        "s" | "space" => Command::Standby,
        "up" => Command::FastForward,
        "down" => Command::FastBackward,
        "left" => Command::TurnLeft,
        "right" => Command::TurnRight,
        _ => return None,
    };
    Some(command)
}
