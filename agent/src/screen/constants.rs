// agent/src/screen/constants.rs
#![forbid(unsafe_code)]

/// Visible screen window, in tiles. Row 0 is the top of the screen,
/// column 0 the left edge.
pub const GRID_ROWS: usize = 16;
pub const GRID_COLS: usize = 20;

/**
 * Tile-type codes as they appear in the sampled screen grid.
 *
 * The decision core only ever compares these for equality; what a code
 * means physically (solidity, damage, motion) is the environment's
 * business. Names follow the objects the stage-1 tilemap uses them for.
 */
pub mod tile {
    pub const EMPTY: u8 = 0;
    pub const MARIO: u8 = 1;
    pub const FLYER: u8 = 6;
    pub const GROUND: u8 = 10;
    pub const BRICK: u8 = 12;
    pub const BLOCK: u8 = 13;
    pub const PIPE: u8 = 14;
    pub const CRAWLER: u8 = 15;
    pub const SPIKE: u8 = 16;
    pub const LEDGE: u8 = 18;
}
