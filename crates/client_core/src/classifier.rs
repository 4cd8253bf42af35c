//! Touch-to-command classification for the two control surfaces.
//!
//! The primary surface is a circular dial: a dead zone in the middle, a ring of
//! eight walking directions, and an outer ring of four turn/run commands. The
//! secondary surface is a rectangular pad split into a 2x3 grid of body-axis
//! commands. Classification is pure; `None` tells the caller to ignore the
//! event and keep whatever command is current.

use std::f64::consts::PI;

use shared::{
    domain::{TouchPoint, Zone},
    protocol::Command,
};

/// Inner dead-zone radius as a fraction of the dial radius.
pub const DEAD_ZONE_RATIO: f64 = 1.0 / 4.0;
/// Boundary between the walking ring and the turn/run ring.
pub const WALK_RING_RATIO: f64 = 2.0 / 3.0;

/// Angular slice `(lower, upper)`; `upper_closed` also admits `upper` itself.
#[derive(Debug, Clone, Copy)]
struct Sector {
    lower: f64,
    upper: f64,
    upper_closed: bool,
    command: Command,
}

impl Sector {
    const fn closed(lower: f64, upper: f64, command: Command) -> Self {
        Self {
            lower,
            upper,
            upper_closed: true,
            command,
        }
    }

    const fn open(lower: f64, upper: f64, command: Command) -> Self {
        Self {
            lower,
            upper,
            upper_closed: false,
            command,
        }
    }

    fn contains(&self, angle: f64) -> bool {
        angle > self.lower && (angle < self.upper || (self.upper_closed && angle == self.upper))
    }
}

/// Walking sectors are `(lo, hi]`. Angles outside `(-7π/8, 7π/8]` wrap to `WalkL90`.
const WALK_SECTORS: [Sector; 7] = [
    Sector::closed(-7.0 * PI / 8.0, -5.0 * PI / 8.0, Command::WalkL45),
    Sector::closed(-5.0 * PI / 8.0, -3.0 * PI / 8.0, Command::Walk0),
    Sector::closed(-3.0 * PI / 8.0, -PI / 8.0, Command::WalkR45),
    Sector::closed(-PI / 8.0, PI / 8.0, Command::WalkR90),
    Sector::closed(PI / 8.0, 3.0 * PI / 8.0, Command::WalkR135),
    Sector::closed(3.0 * PI / 8.0, 5.0 * PI / 8.0, Command::Walk180),
    Sector::closed(5.0 * PI / 8.0, 7.0 * PI / 8.0, Command::WalkL135),
];
const WALK_WRAP: Command = Command::WalkL90;

/// `FastForward` is open at both ends, so exactly `-π/4` falls to `TurnLeft`.
const OUTER_SECTORS: [Sector; 3] = [
    Sector::closed(-PI / 4.0, PI / 4.0, Command::TurnRight),
    Sector::closed(PI / 4.0, 3.0 * PI / 4.0, Command::FastBackward),
    Sector::open(-3.0 * PI / 4.0, -PI / 4.0, Command::FastForward),
];
const OUTER_WRAP: Command = Command::TurnLeft;

/// Stateless classifier; one instance is owned by each session.
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureClassifier;

impl GestureClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, zone: Zone, point: &TouchPoint) -> Option<Command> {
        classify(zone, point)
    }
}

pub fn classify(zone: Zone, point: &TouchPoint) -> Option<Command> {
    if !point.x.is_finite() || !point.y.is_finite() || point.surface.is_degenerate() {
        return None;
    }
    if point.x < 0.0 || point.y < 0.0 {
        return None;
    }

    match zone {
        Zone::Primary => classify_dial(point),
        Zone::Secondary => classify_pad(point),
    }
}

fn classify_dial(point: &TouchPoint) -> Option<Command> {
    let radius = point.surface.radius();
    let dx = point.x - point.surface.width / 2.0;
    let dy = point.y - point.surface.height / 2.0;
    let length = dx.hypot(dy);

    if length >= radius {
        return None;
    }
    if length < radius * DEAD_ZONE_RATIO {
        return Some(Command::Standby);
    }

    // Screen y grows downward, so "up" on the dial is -π/2.
    let angle = dy.atan2(dx);
    if length < radius * WALK_RING_RATIO {
        Some(sector_command(angle, &WALK_SECTORS, WALK_WRAP))
    } else {
        Some(sector_command(angle, &OUTER_SECTORS, OUTER_WRAP))
    }
}

/// First sector containing `angle`, or the wrap-around command when none does.
fn sector_command(angle: f64, sectors: &[Sector], wrap: Command) -> Command {
    sectors
        .iter()
        .find(|sector| sector.contains(angle))
        .map(|sector| sector.command)
        .unwrap_or(wrap)
}

fn classify_pad(point: &TouchPoint) -> Option<Command> {
    let width = point.surface.width;
    let height = point.surface.height;
    if point.x > width || point.y > height {
        return None;
    }

    let left = point.x < width / 2.0;
    let row = if point.y < height / 3.0 {
        0
    } else if point.y < 2.0 * height / 3.0 {
        1
    } else {
        2
    };

    let command = match (left, row) {
        (true, 0) => Command::RotateY,
        (true, 1) => Command::RotateX,
        (true, _) => Command::RotateZ,
        (false, 0) => Command::ClimbForward,
        (false, 1) => Command::Twist,
        (false, _) => Command::ClimbBackward,
    };
    Some(command)
}

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod tests;
