// agent/src/screen/pattern.rs
#![forbid(unsafe_code)]

use crate::screen::constants::{tile, GRID_COLS, GRID_ROWS};
use crate::screen::grid::{AvatarPos, TileGrid};

/// Displacement from the avatar's anchor: `+x` is forward (right),
/// `+y` is up (toward row 0).
pub type Offset = (i32, i32);

/**
 * Pattern probe bound to one sampled frame and one avatar position.
 *
 * Offsets resolve as `row = y - dy`, `col = x + dx`. A resolved cell that
 * falls outside the 16x20 window is skipped: it never matches and never
 * errors. The number of skips in the most recent query is retained because
 * one jump rule refuses to fire on a partially off-screen pattern.
 */
pub struct Probe<'a> {
    grid: &'a TileGrid,
    origin: AvatarPos,
    skipped_last: u32,
}

impl<'a> Probe<'a> {
    pub fn new(grid: &'a TileGrid, origin: AvatarPos) -> Self {
        Self {
            grid,
            origin,
            skipped_last: 0,
        }
    }

    pub fn origin(&self) -> AvatarPos {
        self.origin
    }

    /// Out-of-bounds skips recorded by the most recent `any`/`all` call.
    pub fn skipped_last(&self) -> u32 {
        self.skipped_last
    }

    fn resolve(&self, (dx, dy): Offset) -> Option<(usize, usize)> {
        let row = self.origin.y - dy;
        let col = self.origin.x + dx;
        if row < 0 || row >= GRID_ROWS as i32 || col < 0 || col >= GRID_COLS as i32 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// True iff at least one offset resolves in-bounds to a cell equal to
    /// `code`. Evaluates in list order and short-circuits on the first hit;
    /// an empty offset list never matches.
    pub fn any(&mut self, offsets: &[Offset], code: u8) -> bool {
        self.skipped_last = 0;
        for &off in offsets {
            match self.resolve(off) {
                None => self.skipped_last += 1,
                Some((row, col)) => {
                    if self.grid.get(row, col) == code {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// True iff every single offset resolves in-bounds to a cell equal to
    /// `code`. A skipped (out-of-bounds) offset cannot match, so it makes
    /// the whole predicate false. All offsets are visited so the skip count
    /// stays exact.
    pub fn all(&mut self, offsets: &[Offset], code: u8) -> bool {
        let mut skipped = 0;
        let mut hit_all = true;
        for &off in offsets {
            match self.resolve(off) {
                None => {
                    skipped += 1;
                    hit_all = false;
                }
                Some((row, col)) => {
                    if self.grid.get(row, col) != code {
                        hit_all = false;
                    }
                }
            }
        }
        self.skipped_last = skipped;
        hit_all
    }

    /// Scans straight down from the avatar's row to the bottom of the
    /// window along the column `dx` ahead. True iff every visited cell is
    /// empty, i.e. there is nothing visible to land on. An avatar sitting
    /// on the last visible row sees an empty scan, which also counts as a
    /// void. A column outside the window is not a void.
    pub fn column_is_void(&self, dx: i32) -> bool {
        let col = self.origin.x + dx;
        if col < 0 || col >= GRID_COLS as i32 {
            return false;
        }
        let col = col as usize;
        let start = self.origin.y.max(0) as usize;
        (start..GRID_ROWS).all(|row| self.grid.get(row, col) == tile::EMPTY)
    }
}
