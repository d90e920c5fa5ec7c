// agent/src/policy/maneuver.rs
#![forbid(unsafe_code)]

use std::time::Duration;

use tracing::debug;

use crate::env::{Action, Environment};
use crate::screen::{tile, Offset, Probe};

/// Multi-step crossing routines for compound hazards. These talk to the
/// actuator directly, bypassing the per-cycle action queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ManeuverKind {
    /// Blind scripted hop over a short drop.
    ShortHop,
    /// Grid-reactive crossing of a wide gap: back off, walk to the lip,
    /// dash-jump, then run until footing reappears.
    LongCross,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ManeuverOutcome {
    Completed,
    /// A reactive phase hit its iteration cap (or lost sight of the
    /// avatar) with its predicate still unsatisfied.
    Stalled { phase: &'static str },
}

/// Caps each reactive phase so a never-satisfied predicate surfaces as
/// `Stalled` instead of spinning the agent forever.
#[derive(Clone, Copy, Debug)]
pub struct ManeuverLimits {
    pub phase_cap: u32,
}

impl Default for ManeuverLimits {
    fn default() -> Self {
        Self { phase_cap: 48 }
    }
}

const SHORT_HOP_SCRIPT: [Action; 8] = [
    Action::Left,
    Action::Down,
    Action::Right,
    Action::Right,
    Action::Jump,
    Action::Right,
    Action::Right,
    Action::Right,
];

/// Support rows one and two below foot level, three tiles out. All empty
/// means the avatar is still hanging over the gap side of the lip.
const CROSS_BAND: [Offset; 6] = [(1, -1), (2, -1), (3, -1), (1, -2), (2, -2), (3, -2)];
/// Footing two tiles out; walking while this holds stops at the lip.
const CROSS_LIP: [Offset; 1] = [(2, -1)];
/// Footing directly ahead; the landing run ends when it appears.
const CROSS_LANDING: [Offset; 1] = [(1, -1)];

fn band_clear(probe: &mut Probe) -> bool {
    probe.all(&CROSS_BAND, tile::EMPTY)
}

fn lip_ahead(probe: &mut Probe) -> bool {
    probe.any(&CROSS_LIP, tile::GROUND)
}

fn no_footing_ahead(probe: &mut Probe) -> bool {
    !probe.any(&CROSS_LANDING, tile::GROUND)
}

fn apply_settled(env: &mut dyn Environment, action: Action, settle: Duration) {
    env.apply(action);
    if !settle.is_zero() {
        std::thread::sleep(settle);
    }
}

/// One reactive phase: re-sample the grid, locate the avatar, and keep
/// issuing `action` while `keep_going` holds. Returns the stall outcome if
/// the cap runs out (or the avatar disappears), None when the phase ends
/// normally.
fn reactive_phase(
    env: &mut dyn Environment,
    limits: &ManeuverLimits,
    settle: Duration,
    phase: &'static str,
    action: Action,
    keep_going: fn(&mut Probe) -> bool,
) -> Option<ManeuverOutcome> {
    for _ in 0..limits.phase_cap {
        let grid = env.sample_grid();
        let Some(pos) = grid.locate_avatar() else {
            debug!(phase, "avatar lost mid-maneuver");
            return Some(ManeuverOutcome::Stalled { phase });
        };
        let mut probe = Probe::new(&grid, pos);
        if !keep_going(&mut probe) {
            return None;
        }
        apply_settled(env, action, settle);
    }
    debug!(phase, cap = limits.phase_cap, "phase cap exhausted");
    Some(ManeuverOutcome::Stalled { phase })
}

pub fn run(
    env: &mut dyn Environment,
    kind: ManeuverKind,
    limits: &ManeuverLimits,
    settle: Duration,
) -> ManeuverOutcome {
    match kind {
        ManeuverKind::ShortHop => {
            for action in SHORT_HOP_SCRIPT {
                apply_settled(env, action, settle);
            }
            ManeuverOutcome::Completed
        }
        ManeuverKind::LongCross => {
            if let Some(stall) =
                reactive_phase(env, limits, settle, "retreat", Action::Left, band_clear)
            {
                return stall;
            }
            if let Some(stall) =
                reactive_phase(env, limits, settle, "approach", Action::Right, lip_ahead)
            {
                return stall;
            }
            apply_settled(env, Action::Dash, settle);
            apply_settled(env, Action::Jump, settle);
            if let Some(stall) = reactive_phase(
                env,
                limits,
                settle,
                "landing",
                Action::Right,
                no_footing_ahead,
            ) {
                return stall;
            }
            ManeuverOutcome::Completed
        }
    }
}
