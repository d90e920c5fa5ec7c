// agent/tests/policy_contracts.rs
#![forbid(unsafe_code)]

/**
 * Scenario tests for the rule chain.
 *
 * Purpose:
 * - Pin each hazard rule's trigger pattern, chosen action, and queued plan
 *   on hand-built fixture frames.
 * - Pin the priority order where rules overlap (airborne beats terrain,
 *   the wall/slot jump beats the step-up plan).
 * - Pin the queue contract end to end: a plan drains one entry per cycle
 *   with no re-evaluation until it is empty.
 */
use mario_agent::{
    choose, tile, Action, Environment, ExpertAgent, GameStatus, ManeuverKind, PolicyState,
    TileGrid, GRID_COLS, GRID_ROWS,
};

/// Frame with the avatar's top cell at (row, col) plus extra tiles.
fn frame(avatar_row: usize, avatar_col: usize, extra: &[(usize, usize, u8)]) -> TileGrid {
    let mut cells = [[tile::EMPTY; GRID_COLS]; GRID_ROWS];
    cells[avatar_row][avatar_col] = tile::MARIO;
    for &(r, c, code) in extra {
        cells[r][c] = code;
    }
    TileGrid::from_rows(cells)
}

/// Frame standing on full-width ground (surface at row 14, feet at 13).
fn grounded_frame(avatar_col: usize, extra: &[(usize, usize, u8)]) -> TileGrid {
    let mut cells = [[tile::EMPTY; GRID_COLS]; GRID_ROWS];
    for row in 14..GRID_ROWS {
        for col in 0..GRID_COLS {
            cells[row][col] = tile::GROUND;
        }
    }
    cells[12][avatar_col] = tile::MARIO;
    cells[13][avatar_col] = tile::MARIO;
    for &(r, c, code) in extra {
        cells[r][c] = code;
    }
    TileGrid::from_rows(cells)
}

fn status_stage(stage: u32) -> GameStatus {
    GameStatus {
        stage,
        ..GameStatus::default()
    }
}

fn drain(state: &mut PolicyState) -> Vec<Action> {
    let mut out = Vec::new();
    while !state.queue.is_empty() {
        out.push(state.queue.override_or(Action::Up));
    }
    out
}

#[test]
fn missing_avatar_settles_with_down() {
    let grid = TileGrid::empty();
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.action, Action::Down);
    assert_eq!(d.rule, "avatar_missing");
    assert!(d.maneuver.is_none());
}

#[test]
fn lone_avatar_on_empty_frame_advances() {
    // Bottom-row avatar: every probe lands off screen, so nothing matches
    // and the chain falls through to the forward default.
    let grid = frame(15, 5, &[]);
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.action, Action::Right);
    assert_eq!(d.rule, "advance");
}

#[test]
fn grounded_avatar_with_clear_road_advances() {
    let grid = grounded_frame(5, &[]);
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.action, Action::Right);
    assert_eq!(d.rule, "advance");
}

#[test]
fn crawler_at_feet_braces_then_jumps() {
    // Avatar anchor (x=2, y=5); crawler on both front-at-ground cells.
    let grid = frame(
        4,
        2,
        &[
            (6, 2, tile::GROUND), // footing: not airborne
            (6, 3, tile::GROUND),
            (5, 4, tile::CRAWLER), // offset (2, 0)
            (4, 4, tile::CRAWLER), // offset (2, 1)
        ],
    );
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.rule, "crawler_at_feet");
    assert_eq!(d.action, Action::Down);
    assert_eq!(drain(&mut state), vec![Action::Down, Action::Jump]);
}

#[test]
fn crawler_at_feet_backs_off_when_headroom_is_blocked() {
    let grid = frame(
        4,
        2,
        &[
            (6, 2, tile::GROUND),
            (6, 3, tile::GROUND),
            (5, 4, tile::CRAWLER),
            (3, 4, tile::BRICK), // offset (2, 2): jump arc blocked
        ],
    );
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.rule, "crawler_at_feet");
    assert_eq!(d.action, Action::Left);
    assert_eq!(drain(&mut state), vec![Action::Left, Action::Left]);
}

#[test]
fn airborne_waits_then_forces_forward_motion() {
    // Floating avatar; the void-probe columns have a floor so the fall is
    // just waited out.
    let grid = frame(4, 2, &[(15, 5, tile::GROUND), (15, 6, tile::GROUND)]);
    let mut state = PolicyState::new();

    for expected_timeout in 1..6u32 {
        let d = choose(&grid, &status_stage(1), &mut state);
        assert_eq!(d.rule, "airborne_wait");
        assert_eq!(d.action, Action::Down);
        assert_eq!(state.air_timeout, expected_timeout);
    }

    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.action, Action::Right, "sixth airborne cycle forces motion");
    assert_eq!(state.air_timeout, 0);
}

#[test]
fn airborne_over_a_bottomless_column_backs_off() {
    // No floor anywhere ahead: columns x+3 / x+4 scan empty to the bottom.
    let grid = frame(4, 2, &[]);
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.rule, "airborne_wait");
    assert_eq!(d.action, Action::Left);
}

#[test]
fn exit_coordinate_triggers_the_sprint() {
    let grid = grounded_frame(16, &[]);
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.rule, "exit_sprint");
    assert_eq!(d.action, Action::Right);
}

#[test]
fn wide_gap_requests_the_long_cross() {
    // Ground everywhere except columns 7..=9, carved to the bottom; the
    // avatar stands on the lip at column 6.
    let mut cells = [[tile::EMPTY; GRID_COLS]; GRID_ROWS];
    for row in 14..GRID_ROWS {
        for col in 0..GRID_COLS {
            if !(7..=9).contains(&col) {
                cells[row][col] = tile::GROUND;
            }
        }
    }
    cells[12][6] = tile::MARIO;
    cells[13][6] = tile::MARIO;
    let grid = TileGrid::from_rows(cells);

    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.rule, "wide_gap");
    assert_eq!(d.action, Action::Down);
    assert_eq!(d.maneuver, Some(ManeuverKind::LongCross));
}

#[test]
fn pipe_ahead_queues_the_crossing_plan() {
    let grid = grounded_frame(
        5,
        &[
            (13, 7, tile::PIPE), // offset (2, 0)
            (12, 7, tile::PIPE),
        ],
    );
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.rule, "pipe_ahead");
    assert_eq!(d.action, Action::Jump);
    assert_eq!(
        drain(&mut state),
        vec![
            Action::Right,
            Action::Right,
            Action::Jump,
            Action::Right,
            Action::Right
        ]
    );
}

#[test]
fn wall_with_open_slot_jumps() {
    let grid = grounded_frame(
        5,
        &[
            (13, 7, tile::GROUND), // four-tall wall two ahead
            (12, 7, tile::GROUND),
            (11, 7, tile::GROUND),
            (10, 7, tile::GROUND),
        ],
    );
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_eq!(d.rule, "wall_slot_jump", "must outrank the step-up plan");
    assert_eq!(d.action, Action::Jump);
    assert!(state.queue.is_empty());
}

#[test]
fn wall_slot_pattern_is_rejected_when_partially_off_screen() {
    // Same shape pushed to the top of the window: part of the strip pair
    // resolves off screen, so the high jump must not fire.
    let grid = frame(
        1,
        5,
        &[
            (3, 5, tile::GROUND), // footing below the feet: not airborne
            (2, 7, tile::GROUND),
            (1, 7, tile::GROUND),
            (0, 7, tile::GROUND),
        ],
    );
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_ne!(d.rule, "wall_slot_jump");
}

#[test]
fn stage_two_dash_queues_past_a_chasm_marker() {
    let grid = grounded_frame(5, &[(13, 6, tile::LEDGE)]); // offset (1, 0)
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(2), &mut state);
    assert_eq!(d.rule, "stage_two_dash");
    assert_eq!(d.action, Action::Down);
    assert_eq!(drain(&mut state), vec![Action::Right, Action::Jump]);
}

#[test]
fn stage_two_dash_defaults_to_running() {
    let grid = grounded_frame(5, &[]);
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(2), &mut state);
    assert_eq!(d.rule, "stage_two_dash");
    assert_eq!(d.action, Action::Right);
    assert!(state.queue.is_empty());
}

#[test]
fn stage_one_never_reaches_the_dash_rule() {
    let grid = grounded_frame(5, &[(13, 6, tile::LEDGE)]);
    let mut state = PolicyState::new();
    let d = choose(&grid, &status_stage(1), &mut state);
    assert_ne!(d.rule, "stage_two_dash");
}

// -------------------------------------------------------------------------
// Queue contract, driven through the agent
// -------------------------------------------------------------------------

/// Scripted environment: serves a fixed sequence of frames (repeating the
/// last one) and records every applied action.
struct ScriptedEnv {
    frames: Vec<TileGrid>,
    sampled: usize,
    applied: Vec<Action>,
}

impl ScriptedEnv {
    fn new(frames: Vec<TileGrid>) -> Self {
        Self {
            frames,
            sampled: 0,
            applied: Vec::new(),
        }
    }
}

impl Environment for ScriptedEnv {
    fn sample_grid(&mut self) -> TileGrid {
        let i = self.sampled.min(self.frames.len() - 1);
        self.sampled += 1;
        self.frames[i]
    }

    fn sample_status(&mut self) -> GameStatus {
        GameStatus::default()
    }

    fn is_over(&mut self) -> bool {
        false
    }

    fn apply(&mut self, action: Action) {
        self.applied.push(action);
    }
}

#[test]
fn queued_plan_drains_one_entry_per_cycle_before_reevaluation() {
    let crawler_frame = frame(
        4,
        2,
        &[
            (6, 2, tile::GROUND),
            (6, 3, tile::GROUND),
            (5, 4, tile::CRAWLER),
        ],
    );
    let quiet_frame = frame(15, 5, &[]);

    let env = ScriptedEnv::new(vec![crawler_frame, quiet_frame]);
    let mut agent = ExpertAgent::new(env);

    // Cycle 1 evaluates, loads [Down, Jump], and consumes the first entry.
    let r1 = agent.step();
    assert_eq!(r1.rule, "crawler_at_feet");
    assert_eq!(r1.action, Action::Down);

    // Cycle 2 drains the plan without consulting the rules (no sampling).
    let r2 = agent.step();
    assert_eq!(r2.rule, "queued");
    assert_eq!(r2.action, Action::Jump);

    // Cycle 3 re-evaluates from scratch on the next frame.
    let r3 = agent.step();
    assert_eq!(r3.rule, "advance");
    assert_eq!(r3.action, Action::Right);

    assert_eq!(
        agent.env().applied,
        vec![Action::Down, Action::Jump, Action::Right]
    );
    assert_eq!(agent.env().sampled, 2, "queued cycle takes no sample");
}
