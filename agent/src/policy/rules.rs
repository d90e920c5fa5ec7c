// agent/src/policy/rules.rs
#![forbid(unsafe_code)]

use tracing::debug;

use crate::env::{Action, GameStatus};
use crate::policy::maneuver::ManeuverKind;
use crate::policy::queue::PolicyState;
use crate::screen::{tile, AvatarPos, Offset, Probe, TileGrid};

// -------------------------------------------------------------------------
// Pattern tables
//
// All offsets are avatar-local: +x forward, +y up. The avatar anchor's y is
// the row BELOW the first avatar cell, so dy = -1 is the row the avatar's
// feet rest on and dy = 0 is level with the feet.
// -------------------------------------------------------------------------

/// Cell under the feet / under the cell one ahead. Both empty => airborne.
const AIR_BELOW: [Offset; 1] = [(0, -1)];
const AIR_BELOW_AHEAD: [Offset; 1] = [(1, -1)];
/// Cycles to sit out a fall before forcing forward motion again.
const AIR_TIMEOUT_FORCE: u32 = 6;
/// Columns probed for a bottomless drop while airborne.
const VOID_PROBE_COLS: [i32; 2] = [3, 4];

/// Hardcoded end-of-level coordinate; from here it is a straight sprint.
const LEVEL_EXIT: AvatarPos = AvatarPos { x: 16, y: 13 };

/// Crawler two tiles ahead at foot height.
const FRONT_GROUND: [Offset; 2] = [(2, 0), (2, 1)];
/// The cells the brace-jump would arc through; solid means no headroom.
const FRONT_OVERHEAD: [Offset; 2] = [(2, 2), (2, 3)];
/// Codes that block a jump arc.
const BLOCKING: [u8; 3] = [tile::BRICK, tile::BLOCK, tile::GROUND];

const OVERHEAD_CLOSE: [Offset; 4] = [(2, 2), (2, 3), (3, 2), (3, 3)];

const FAR_AHEAD: [Offset; 1] = [(5, 0)];
const FAR_OVERHEAD: [Offset; 2] = [(5, 1), (5, 2)];

const LEDGE_AHEAD_LOW: [Offset; 2] = [(2, 0), (3, 0)];
const LEDGE_AHEAD_RAISED: [Offset; 2] = [(2, 2), (3, 2)];

const BELOW_AHEAD: [Offset; 2] = [(1, -1), (2, -1)];

const AHEAD_CLUSTER: [Offset; 11] = [
    (3, 0),
    (3, 1),
    (4, 0),
    (4, 1),
    (4, 2),
    (4, 3),
    (4, 4),
    (5, 3),
    (5, 4),
    (6, 3),
    (6, 4),
];

/// Support row ahead missing / support resuming: a crossable gap.
const GAP_SUPPORT_NEAR: [Offset; 3] = [(1, -1), (2, -1), (3, -1)];
const GAP_LANDING_NEAR: [Offset; 2] = [(4, -1), (5, -1)];
const GAP_SUPPORT_FAR: [Offset; 3] = [(2, -1), (3, -1), (4, -1)];
const GAP_LANDING_FAR: [Offset; 2] = [(5, -1), (6, -1)];

/// Short-drop variant: same missing support, no confirmed landing, only
/// armed at ground height.
const DROP_AHEAD: [Offset; 3] = [(1, -1), (2, -1), (3, -1)];
const DROP_ROW: i32 = 13;

/// A wall two ahead with an open one-wide slot right before it.
const WALL_STRIP: [Offset; 4] = [(2, 0), (2, 1), (2, 2), (2, 3)];
const WALL_SLOT_STRIP: [Offset; 4] = [(1, 0), (1, 1), (1, 2), (1, 3)];

const BLOCK_TOP: [Offset; 2] = [(0, 4), (1, 4)];

const FLYER_BOX: [Offset; 4] = [(0, 5), (0, 6), (1, 5), (1, 6)];

const PIPE_AHEAD: [Offset; 2] = [(2, 0), (3, 0)];

const STEP_AHEAD: [Offset; 3] = [(1, 0), (2, 0), (3, 0)];

const BRICK_WALL: [Offset; 6] = [(1, 0), (2, 0), (3, 0), (1, 1), (2, 1), (3, 1)];

const DASH_STAGE: u32 = 2;
const DASH_CHASM: [Offset; 1] = [(1, 0)];
const DASH_STEP_UP: [Offset; 1] = [(2, 2)];

// -------------------------------------------------------------------------
// Decision
// -------------------------------------------------------------------------

/// Outcome of one policy evaluation. `action` is the rule's nominal pick;
/// a pending action queue still overrides it at apply time. A set
/// `maneuver` asks the executor to run a multi-step crossing first.
#[derive(Clone, Copy, Debug)]
pub struct Decision {
    pub action: Action,
    pub maneuver: Option<ManeuverKind>,
    pub rule: &'static str,
}

impl Decision {
    fn act(action: Action) -> Self {
        Self {
            action,
            maneuver: None,
            rule: "",
        }
    }

    fn cross(action: Action, kind: ManeuverKind) -> Self {
        Self {
            action,
            maneuver: Some(kind),
            rule: "",
        }
    }
}

struct Ctx<'g, 's> {
    probe: Probe<'g>,
    pos: AvatarPos,
    stage: u32,
    state: &'s mut PolicyState,
}

type RuleFn = for<'g, 's> fn(&mut Ctx<'g, 's>) -> Option<Decision>;

/// The chain, first match wins. Airborne safety outranks every terrain
/// rule; terrain rules run closest/most-specific first; the stage dash and
/// the plain advance close the chain.
const RULES: &[(&str, RuleFn)] = &[
    ("airborne_wait", airborne_wait),
    ("exit_sprint", exit_sprint),
    ("crawler_at_feet", crawler_at_feet),
    ("crawler_overhead", crawler_overhead),
    ("crawler_far_ahead", crawler_far_ahead),
    ("spike_far_ahead", spike_far_ahead),
    ("ledge_ahead", ledge_ahead),
    ("ledge_raised", ledge_raised),
    ("crawler_below_ahead", crawler_below_ahead),
    ("crawler_swarm", crawler_swarm),
    ("wide_gap", wide_gap),
    ("wide_gap_shifted", wide_gap_shifted),
    ("drop_gap", drop_gap),
    ("wall_slot_jump", wall_slot_jump),
    ("block_overhead", block_overhead),
    ("flyer_overhead", flyer_overhead),
    ("pipe_ahead", pipe_ahead),
    ("step_up", step_up),
    ("brick_wall", brick_wall),
    ("stage_two_dash", stage_two_dash),
];

/// Runs the rule chain against one sampled frame.
///
/// Never fails: an unlocatable avatar settles with `Down`, and an
/// unmatched chain falls through to the forward default.
pub fn choose(grid: &TileGrid, status: &GameStatus, state: &mut PolicyState) -> Decision {
    let Some(pos) = grid.locate_avatar() else {
        debug!(rule = "avatar_missing", "avatar not on screen, settling");
        return Decision {
            action: Action::Down,
            maneuver: None,
            rule: "avatar_missing",
        };
    };

    let mut ctx = Ctx {
        probe: Probe::new(grid, pos),
        pos,
        stage: status.stage,
        state,
    };

    for &(name, rule) in RULES {
        if let Some(mut decision) = rule(&mut ctx) {
            decision.rule = name;
            ctx.state.skipped_last = ctx.probe.skipped_last();
            debug!(rule = name, action = ?decision.action, "rule matched");
            return decision;
        }
    }

    ctx.state.skipped_last = ctx.probe.skipped_last();
    debug!(rule = "advance", "no rule matched, advancing");
    Decision {
        action: Action::Right,
        maneuver: None,
        rule: "advance",
    }
}

// -------------------------------------------------------------------------
// Rules
// -------------------------------------------------------------------------

fn airborne_wait(c: &mut Ctx) -> Option<Decision> {
    let airborne =
        c.probe.any(&AIR_BELOW, tile::EMPTY) && c.probe.any(&AIR_BELOW_AHEAD, tile::EMPTY);
    if !airborne {
        return None;
    }

    c.state.air_timeout += 1;

    // A bottomless column ahead means this fall must not drift forward.
    if VOID_PROBE_COLS.iter().any(|&dx| c.probe.column_is_void(dx)) {
        return Some(Decision::act(Action::Left));
    }
    if c.state.air_timeout < AIR_TIMEOUT_FORCE {
        return Some(Decision::act(Action::Down));
    }
    // Waited long enough; force motion so a phantom-airborne read cannot
    // stall the run.
    c.state.air_timeout = 0;
    Some(Decision::act(Action::Right))
}

fn exit_sprint(c: &mut Ctx) -> Option<Decision> {
    (c.pos == LEVEL_EXIT).then(|| Decision::act(Action::Right))
}

fn blocked_above(c: &mut Ctx, offsets: &[Offset]) -> bool {
    BLOCKING.iter().any(|&code| c.probe.any(offsets, code))
}

fn crawler_at_feet(c: &mut Ctx) -> Option<Decision> {
    if !c.probe.any(&FRONT_GROUND, tile::CRAWLER) {
        return None;
    }
    if blocked_above(c, &FRONT_OVERHEAD) {
        // No headroom to clear it; back out instead.
        c.state.queue.load(&[Action::Left, Action::Left]);
        return Some(Decision::act(Action::Left));
    }
    c.state.queue.load(&[Action::Down, Action::Jump]);
    Some(Decision::act(Action::Down))
}

fn crawler_overhead(c: &mut Ctx) -> Option<Decision> {
    c.probe
        .any(&OVERHEAD_CLOSE, tile::CRAWLER)
        .then(|| Decision::act(Action::Left))
}

fn crawler_far_ahead(c: &mut Ctx) -> Option<Decision> {
    if !c.probe.any(&FAR_AHEAD, tile::CRAWLER) {
        return None;
    }
    if blocked_above(c, &FAR_OVERHEAD) {
        return Some(Decision::act(Action::Left));
    }
    Some(Decision::act(Action::Jump))
}

fn spike_far_ahead(c: &mut Ctx) -> Option<Decision> {
    c.probe
        .any(&FAR_AHEAD, tile::SPIKE)
        .then(|| Decision::act(Action::Jump))
}

fn ledge_ahead(c: &mut Ctx) -> Option<Decision> {
    c.probe
        .any(&LEDGE_AHEAD_LOW, tile::LEDGE)
        .then(|| Decision::act(Action::Jump))
}

fn ledge_raised(c: &mut Ctx) -> Option<Decision> {
    if !c.probe.any(&LEDGE_AHEAD_RAISED, tile::LEDGE) {
        return None;
    }
    c.state
        .queue
        .load(&[Action::Left, Action::Left, Action::Right]);
    Some(Decision::act(Action::Left))
}

fn crawler_below_ahead(c: &mut Ctx) -> Option<Decision> {
    c.probe
        .any(&BELOW_AHEAD, tile::CRAWLER)
        .then(|| Decision::act(Action::Down))
}

fn crawler_swarm(c: &mut Ctx) -> Option<Decision> {
    c.probe
        .any(&AHEAD_CLUSTER, tile::CRAWLER)
        .then(|| Decision::act(Action::Down))
}

fn wide_gap(c: &mut Ctx) -> Option<Decision> {
    (c.probe.all(&GAP_SUPPORT_NEAR, tile::EMPTY)
        && c.probe.all(&GAP_LANDING_NEAR, tile::GROUND))
    .then(|| Decision::cross(Action::Down, ManeuverKind::LongCross))
}

fn wide_gap_shifted(c: &mut Ctx) -> Option<Decision> {
    (c.probe.all(&GAP_SUPPORT_FAR, tile::EMPTY) && c.probe.all(&GAP_LANDING_FAR, tile::GROUND))
        .then(|| Decision::cross(Action::Down, ManeuverKind::LongCross))
}

fn drop_gap(c: &mut Ctx) -> Option<Decision> {
    (c.pos.y == DROP_ROW && c.probe.all(&DROP_AHEAD, tile::EMPTY))
        .then(|| Decision::cross(Action::Down, ManeuverKind::ShortHop))
}

fn wall_slot_jump(c: &mut Ctx) -> Option<Decision> {
    let wall = c.probe.all(&WALL_STRIP, tile::GROUND);
    let wall_skips = c.probe.skipped_last();
    let slot = c.probe.all(&WALL_SLOT_STRIP, tile::EMPTY);
    let slot_skips = c.probe.skipped_last();
    // Only trust the pattern when the whole strip pair was on screen.
    (wall && slot && wall_skips + slot_skips == 0).then(|| Decision::act(Action::Jump))
}

fn block_overhead(c: &mut Ctx) -> Option<Decision> {
    if !c.probe.any(&BLOCK_TOP, tile::BLOCK) {
        return None;
    }
    c.state
        .queue
        .load(&[Action::Left, Action::Down, Action::Jump]);
    Some(Decision::act(Action::Jump))
}

fn flyer_overhead(c: &mut Ctx) -> Option<Decision> {
    c.probe
        .any(&FLYER_BOX, tile::FLYER)
        .then(|| Decision::act(Action::Down))
}

fn pipe_ahead(c: &mut Ctx) -> Option<Decision> {
    if !c.probe.any(&PIPE_AHEAD, tile::PIPE) {
        return None;
    }
    c.state.queue.load(&[
        Action::Right,
        Action::Right,
        Action::Jump,
        Action::Right,
        Action::Right,
    ]);
    Some(Decision::act(Action::Jump))
}

fn step_up(c: &mut Ctx) -> Option<Decision> {
    if !c.probe.any(&STEP_AHEAD, tile::GROUND) {
        return None;
    }
    c.state
        .queue
        .load(&[Action::Right, Action::Jump, Action::Right, Action::Right]);
    Some(Decision::act(Action::Jump))
}

fn brick_wall(c: &mut Ctx) -> Option<Decision> {
    if !c.probe.any(&BRICK_WALL, tile::BRICK) {
        return None;
    }
    c.state
        .queue
        .load(&[Action::Right, Action::Jump, Action::Right, Action::Right]);
    Some(Decision::act(Action::Jump))
}

fn stage_two_dash(c: &mut Ctx) -> Option<Decision> {
    if c.stage != DASH_STAGE {
        return None;
    }
    if c.probe.any(&DASH_CHASM, tile::LEDGE) || c.probe.any(&DASH_STEP_UP, tile::GROUND) {
        c.state.queue.load(&[Action::Right, Action::Jump]);
        return Some(Decision::act(Action::Down));
    }
    Some(Decision::act(Action::Right))
}
