// agent/src/sim.rs
#![forbid(unsafe_code)]

/*
Simulated side-scroller environment.

A deterministic stand-in for the emulator bridge: a strip of terrain
columns, a 2-tile-tall avatar with gravity, and a 16x20 camera window
rendered in the same tile codes the real environment produces. Terrain can
be generated from a seed (flat ground with gaps, pipes, crawlers, raised
runs and ledges) or parsed from an ASCII fixture for tests.

Kinematics are deliberately coarse: one walk step or one jump arc per
`apply`, followed by a gravity settle. That is enough to exercise every
decision rule without modelling sub-tile physics.
*/

use std::fmt;

use rand::prelude::*;

use crate::env::{Action, Environment, GameStatus};
use crate::screen::{tile, TileGrid, GRID_COLS, GRID_ROWS};

/// Columns between the avatar and the window's left edge.
const WINDOW_LEAD: usize = 6;
/// Rows gained at the start of a jump arc.
const JUMP_RISE: usize = 3;
/// Columns glided during a plain jump arc.
const JUMP_SPAN: usize = 3;
/// Columns glided when the jump follows a dash press.
const DASH_JUMP_SPAN: usize = 5;
/// Row of the default terrain surface; feet rest one row above it.
const GROUND_ROW: usize = 14;
/// Crawlers advance one column every this many ticks.
const CRAWLER_PACE: u64 = 2;

const STARTING_LIVES: u32 = 2;
const STARTING_TIME: u32 = 400;
const CLEAR_BONUS: u64 = 1000;

type Column = [u8; GRID_ROWS];

#[derive(Debug)]
pub enum MapError {
    BadHeight { lines: usize },
    BadWidth { line: usize, width: usize },
    UnknownGlyph { glyph: char, line: usize, col: usize },
    NoAvatar,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::BadHeight { lines } => {
                write!(f, "map must have exactly {GRID_ROWS} lines, got {lines}")
            }
            MapError::BadWidth { line, width } => {
                write!(
                    f,
                    "map line {line} is {width} columns wide, need at least {GRID_COLS} and equal widths"
                )
            }
            MapError::UnknownGlyph { glyph, line, col } => {
                write!(f, "unknown map glyph {glyph:?} at line {line}, column {col}")
            }
            MapError::NoAvatar => write!(f, "map has no avatar marker 'M'"),
        }
    }
}

impl std::error::Error for MapError {}

pub struct SimWorld {
    cols: Vec<Column>,
    /// Top cell of the 2-tall avatar.
    avatar_col: usize,
    avatar_row: usize,
    goal_col: usize,
    status: GameStatus,
    completed: bool,
    /// Set by a dash press; the next jump glides further and clears it.
    boosted: bool,
    ticks: u64,
}

fn is_solid(code: u8) -> bool {
    matches!(
        code,
        tile::GROUND | tile::BRICK | tile::BLOCK | tile::PIPE | tile::LEDGE
    )
}

fn is_hazard(code: u8) -> bool {
    matches!(code, tile::FLYER | tile::CRAWLER | tile::SPIKE)
}

impl SimWorld {
    /// Seeded terrain: flat ground with gaps, pipes, crawlers, raised runs
    /// and ledges spaced so every feature is survivable for the rule set.
    pub fn generate(seed: u64, length: usize, stage: u32) -> Self {
        let length = length.max(GRID_COLS * 2);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut cols = vec![[tile::EMPTY; GRID_ROWS]; length];
        for col in cols.iter_mut() {
            for row in GROUND_ROW..GRID_ROWS {
                col[row] = tile::GROUND;
            }
        }

        // Keep the spawn and the goal approach flat.
        let mut x = GRID_COLS - 6;
        while x + 16 < length {
            match rng.gen_range(0..8u32) {
                0 | 1 => {
                    // Three-wide gap: the long-cross maneuver's case.
                    for gx in x..x + 3 {
                        cols[gx] = [tile::EMPTY; GRID_ROWS];
                    }
                    x += 3 + 7;
                }
                2 => {
                    // Pipe, two tiles tall.
                    cols[x][GROUND_ROW - 1] = tile::PIPE;
                    cols[x][GROUND_ROW - 2] = tile::PIPE;
                    x += 8;
                }
                3 => {
                    // Crawler patrolling the surface.
                    cols[x][GROUND_ROW - 1] = tile::CRAWLER;
                    x += 7;
                }
                4 => {
                    // Raised run, one tile higher than the surface.
                    for rx in x..x + 5 {
                        cols[rx][GROUND_ROW - 1] = tile::GROUND;
                    }
                    x += 5 + 4;
                }
                5 => {
                    // Ledge pair sitting on the surface.
                    cols[x][GROUND_ROW - 1] = tile::LEDGE;
                    cols[x + 1][GROUND_ROW - 1] = tile::LEDGE;
                    x += 6;
                }
                _ => x += 3,
            }
        }

        Self::with_terrain(cols, 2, GROUND_ROW - 2, stage)
    }

    /// Featureless flat ground; the agent should cross it on the default
    /// rule alone.
    pub fn flat(length: usize) -> Self {
        let length = length.max(GRID_COLS * 2);
        let mut cols = vec![[tile::EMPTY; GRID_ROWS]; length];
        for col in cols.iter_mut() {
            for row in GROUND_ROW..GRID_ROWS {
                col[row] = tile::GROUND;
            }
        }
        Self::with_terrain(cols, 2, GROUND_ROW - 2, 1)
    }

    /**
     * Parses an ASCII fixture: exactly 16 lines of equal width (>= 20).
     *
     * Legend: `.` empty, `#` ground, `B` brick, `?` block, `P` pipe,
     * `c` crawler, `f` flyer, `s` spike, `=` ledge, `M` avatar (top cell).
     */
    pub fn from_ascii(map: &str) -> Result<Self, MapError> {
        let lines: Vec<&str> = map
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() != GRID_ROWS {
            return Err(MapError::BadHeight { lines: lines.len() });
        }

        let width = lines[0].chars().count();
        if width < GRID_COLS {
            return Err(MapError::BadWidth { line: 0, width });
        }

        let mut cols = vec![[tile::EMPTY; GRID_ROWS]; width];
        let mut avatar: Option<(usize, usize)> = None;

        for (row, line) in lines.iter().enumerate() {
            let w = line.chars().count();
            if w != width {
                return Err(MapError::BadWidth { line: row, width: w });
            }
            for (col, glyph) in line.chars().enumerate() {
                let code = match glyph {
                    '.' | ' ' => tile::EMPTY,
                    '#' => tile::GROUND,
                    'B' => tile::BRICK,
                    '?' => tile::BLOCK,
                    'P' => tile::PIPE,
                    'c' => tile::CRAWLER,
                    'f' => tile::FLYER,
                    's' => tile::SPIKE,
                    '=' => tile::LEDGE,
                    'M' => {
                        avatar.get_or_insert((col, row));
                        tile::EMPTY
                    }
                    _ => {
                        return Err(MapError::UnknownGlyph {
                            glyph,
                            line: row,
                            col,
                        })
                    }
                };
                cols[col][row] = code;
            }
        }

        let (avatar_col, avatar_row) = avatar.ok_or(MapError::NoAvatar)?;
        Ok(Self::with_terrain(cols, avatar_col, avatar_row, 1))
    }

    fn with_terrain(cols: Vec<Column>, avatar_col: usize, avatar_row: usize, stage: u32) -> Self {
        let goal_col = cols.len().saturating_sub(3);
        Self {
            cols,
            avatar_col,
            avatar_row,
            goal_col,
            status: GameStatus {
                world: 1,
                stage,
                lives: STARTING_LIVES,
                time_left: STARTING_TIME,
                ..GameStatus::default()
            },
            completed: false,
            boosted: false,
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn avatar_world_col(&self) -> usize {
        self.avatar_col
    }

    fn over(&self) -> bool {
        self.status.dead || self.completed || self.status.time_left == 0
    }

    fn feet_row(&self) -> usize {
        self.avatar_row + 1
    }

    fn solid_at(&self, col: usize, row: usize) -> bool {
        col < self.cols.len() && row < GRID_ROWS && is_solid(self.cols[col][row])
    }

    fn body_fits(&self, col: usize, top_row: usize) -> bool {
        !self.solid_at(col, top_row) && !self.solid_at(col, top_row + 1)
    }

    fn try_walk(&mut self, dx: i32) {
        let target = self.avatar_col as i32 + dx;
        if target < 0 || target as usize >= self.cols.len() {
            return;
        }
        let target = target as usize;
        if self.body_fits(target, self.avatar_row) {
            self.avatar_col = target;
        }
    }

    /// Coarse jump: gain height while there is headroom, glide forward
    /// while the body fits, then gravity does the rest.
    fn jump_arc(&mut self) {
        let span = if self.boosted {
            DASH_JUMP_SPAN
        } else {
            JUMP_SPAN
        };
        self.boosted = false;
        for _ in 0..JUMP_RISE {
            if self.avatar_row == 0 || self.solid_at(self.avatar_col, self.avatar_row - 1) {
                break;
            }
            self.avatar_row -= 1;
        }
        for _ in 0..span {
            let next = self.avatar_col + 1;
            if next >= self.cols.len() || !self.body_fits(next, self.avatar_row) {
                break;
            }
            self.avatar_col = next;
        }
    }

    /// Gravity: fall until footing, or out the bottom of the world.
    fn settle(&mut self) {
        loop {
            let feet = self.feet_row();
            if feet + 1 >= GRID_ROWS {
                // Nothing below the visible world: a bottomless drop.
                if !self.solid_at(self.avatar_col, feet + 1) {
                    self.kill();
                }
                return;
            }
            if self.solid_at(self.avatar_col, feet + 1) {
                return;
            }
            self.avatar_row += 1;
        }
    }

    fn kill(&mut self) {
        self.status.dead = true;
        self.status.lives = self.status.lives.saturating_sub(1);
    }

    fn advance_crawlers(&mut self) {
        if self.ticks % CRAWLER_PACE != 0 {
            return;
        }
        let mut moves: Vec<(usize, usize, usize)> = Vec::new();
        for col in 0..self.cols.len() {
            for row in 0..GRID_ROWS {
                if self.cols[col][row] != tile::CRAWLER {
                    continue;
                }
                let dir: i32 = if col > self.avatar_col { -1 } else { 1 };
                let target = col as i32 + dir;
                if target < 0 || target as usize >= self.cols.len() {
                    continue;
                }
                let target = target as usize;
                // Crawlers stay on footing and never stack.
                if self.cols[target][row] == tile::EMPTY && self.solid_at(target, row + 1) {
                    moves.push((col, row, target));
                }
            }
        }
        for (col, row, target) in moves {
            if self.cols[target][row] == tile::EMPTY {
                self.cols[col][row] = tile::EMPTY;
                self.cols[target][row] = tile::CRAWLER;
            }
        }
    }

    fn check_contact(&mut self) {
        let col = self.avatar_col;
        for row in [self.avatar_row, self.feet_row()] {
            if row < GRID_ROWS && is_hazard(self.cols[col][row]) {
                self.kill();
                return;
            }
        }
    }

    fn window(&self) -> TileGrid {
        let max_cam = self.cols.len() - GRID_COLS;
        let cam = self.avatar_col.saturating_sub(WINDOW_LEAD).min(max_cam);

        let mut cells = [[tile::EMPTY; GRID_COLS]; GRID_ROWS];
        for wc in 0..GRID_COLS {
            for row in 0..GRID_ROWS {
                cells[row][wc] = self.cols[cam + wc][row];
            }
        }

        if !self.status.dead {
            let ac = self.avatar_col - cam;
            for row in [self.avatar_row, self.feet_row()] {
                if row < GRID_ROWS {
                    cells[row][ac] = tile::MARIO;
                }
            }
        }
        TileGrid::from_rows(cells)
    }
}

impl Environment for SimWorld {
    fn sample_grid(&mut self) -> TileGrid {
        self.window()
    }

    fn sample_status(&mut self) -> GameStatus {
        let mut status = self.status.clone();
        status.x_position = self.avatar_col as u32;
        status
    }

    fn is_over(&mut self) -> bool {
        self.over()
    }

    fn apply(&mut self, action: Action) {
        if self.over() {
            return;
        }

        match action {
            Action::Left => self.try_walk(-1),
            Action::Right => self.try_walk(1),
            Action::Jump => self.jump_arc(),
            Action::Dash => self.boosted = true,
            // Down settles in place; Up has no standalone effect at this
            // granularity.
            Action::Down | Action::Up => {}
        }

        self.settle();
        self.ticks += 1;
        self.advance_crawlers();
        if !self.status.dead {
            self.check_contact();
        }

        self.status.time_left = self.status.time_left.saturating_sub(1);
        let progress = self.avatar_col as u64;
        self.status.score = self.status.score.max(progress * 10);

        if !self.status.dead && self.avatar_col >= self.goal_col {
            self.completed = true;
            self.status.score += CLEAR_BONUS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT_MAP: &str = "\
........................
........................
........................
........................
........................
........................
........................
........................
........................
........................
........................
........................
..M.....................
........................
########################
########################
";

    #[test]
    fn ascii_round_trip_places_avatar_and_terrain() {
        let mut world = SimWorld::from_ascii(FLAT_MAP).expect("fixture parses");
        let grid = world.sample_grid();
        let pos = grid.locate_avatar().expect("avatar rendered");
        assert_eq!((pos.x, pos.y), (2, 13));
        assert_eq!(grid.get(14, 0), tile::GROUND);
        assert_eq!(grid.get(0, 0), tile::EMPTY);
    }

    #[test]
    fn gravity_settles_onto_ground() {
        let mut map = String::from(FLAT_MAP);
        // Lift the avatar: move the marker up four rows.
        map = map.replace("..M", "...");
        let mut lines: Vec<String> = map.lines().map(String::from).collect();
        lines[8].replace_range(2..3, "M");
        let mut world = SimWorld::from_ascii(&lines.join("\n")).expect("fixture parses");

        world.apply(Action::Down);
        let pos = world.sample_grid().locate_avatar().expect("still visible");
        assert_eq!(pos.y, 13, "avatar should rest with feet on the surface");
    }

    #[test]
    fn walking_off_the_world_bottom_is_fatal() {
        let mut lines: Vec<String> = FLAT_MAP.lines().map(String::from).collect();
        // Carve a full-depth hole right of the avatar.
        for line in lines.iter_mut().skip(14) {
            line.replace_range(4..7, "...");
        }
        let mut world = SimWorld::from_ascii(&lines.join("\n")).expect("fixture parses");

        world.apply(Action::Right);
        world.apply(Action::Right);
        assert!(world.is_over());
        assert!(world.sample_status().dead);
    }

    #[test]
    fn generation_is_seed_deterministic() {
        let mut a = SimWorld::generate(77, 120, 1);
        let mut b = SimWorld::generate(77, 120, 1);
        assert_eq!(a.sample_grid(), b.sample_grid());

        for _ in 0..10 {
            a.apply(Action::Right);
            b.apply(Action::Right);
        }
        assert_eq!(a.sample_grid(), b.sample_grid());
        assert_eq!(a.sample_status(), b.sample_status());
    }

    #[test]
    fn reaching_the_goal_column_completes_the_level() {
        let mut world = SimWorld::flat(40);
        for _ in 0..60 {
            if world.is_over() {
                break;
            }
            world.apply(Action::Right);
        }
        assert!(world.completed());
        assert!(!world.sample_status().dead);
    }
}
