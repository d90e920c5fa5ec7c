// agent/src/env.rs
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::screen::TileGrid;

/// The six controls the actuator accepts. No other inputs exist.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Down,
    Left,
    Right,
    Up,
    Jump,
    Dash,
}

impl Action {
    pub fn all() -> &'static [Action] {
        use Action::*;
        &[Down, Left, Right, Up, Jump, Dash]
    }

    /// Strict 0..=5 id matching the actuator's button table.
    pub fn idx(self) -> u8 {
        use Action::*;
        match self {
            Down => 0,
            Left => 1,
            Right => 2,
            Up => 3,
            Jump => 4,
            Dash => 5,
        }
    }

    /// Inverse of `idx()`. Returns None for invalid ids.
    pub fn from_idx(idx: u8) -> Option<Self> {
        use Action::*;
        match idx {
            0 => Some(Down),
            1 => Some(Left),
            2 => Some(Right),
            3 => Some(Up),
            4 => Some(Jump),
            5 => Some(Dash),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        use Action::*;
        match self {
            Down => 'v',
            Left => '<',
            Right => '>',
            Up => '^',
            Jump => 'A',
            Dash => 'B',
        }
    }
}

/// Status record sampled alongside the grid.
///
/// The decision core reads only `stage` (one dash rule is level-specific);
/// the remaining fields exist for reporting and the end-of-run results dump.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStatus {
    pub world: u32,
    pub stage: u32,
    pub lives: u32,
    pub coins: u32,
    pub score: u64,
    pub x_position: u32,
    pub time_left: u32,
    pub dead: bool,
}

/**
 * The game side of the agent: grid/status sampling plus actuation.
 *
 * `apply` performs one full press/release cycle for the action and blocks
 * until the emulation has advanced; sampling right after an `apply` is
 * therefore guaranteed to observe its effect. Implementations: the real
 * emulator bridge (out of tree) and `sim::SimWorld`.
 */
pub trait Environment {
    fn sample_grid(&mut self) -> TileGrid;
    fn sample_status(&mut self) -> GameStatus;
    fn is_over(&mut self) -> bool;
    fn apply(&mut self, action: Action);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_id_roundtrip_covers_all_slots() {
        for &action in Action::all() {
            assert_eq!(Action::from_idx(action.idx()), Some(action));
        }
        assert_eq!(Action::from_idx(6), None);
    }

    #[test]
    fn status_survives_a_json_roundtrip() {
        let status = GameStatus {
            world: 1,
            stage: 2,
            lives: 2,
            coins: 7,
            score: 1300,
            x_position: 88,
            time_left: 211,
            dead: false,
        };
        let json = serde_json::to_string(&status).expect("serializes");
        let back: GameStatus = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, status);
    }
}
