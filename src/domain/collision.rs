/// Collision layer: swept, axis-separated movement against the tile grid.
///
/// ## Bounding box
///
/// Every body is an 8×8 box anchored at its top-left pixel `(x, y)`.
/// The box covers tile columns `floor(x)/8 ..= (ceil(x)+7)/8` and rows
/// `floor(y)/8 ..= (ceil(y)+7)/8`, rounded outward so a fractional position
/// counts every tile it touches.
///
/// ## One-way floors
///
/// Floor tiles only block a body that is falling AND whose candidate `y`
/// sits one pixel past a cell boundary (`y mod 8 == 1`): the first pixel of
/// the box bottom entering the floor row from above. Upward motion and
/// mid-cell overlap pass straight through.
///
/// ## Resolution order
///
///   1. Vertical: `ceil(|dy|)` steps of at most one pixel.
///   2. Horizontal: `ceil(|dx|)` steps of at most one pixel.
///
/// The first refused step ends that axis; the rest of its delta is dropped.
/// The fall flag is taken from the requested `dy` and reused unchanged for
/// the horizontal phase, so a horizontal step can be refused by a one-way
/// floor in the frame a body moves down.

use super::tile::{TileGrid, TileKind, TILE_SIZE};

#[inline]
fn min_cell(px: f32) -> i32 {
    (px.floor() as i32).div_euclid(TILE_SIZE)
}

#[inline]
fn max_cell(px: f32) -> i32 {
    (px.ceil() as i32 + TILE_SIZE - 1).div_euclid(TILE_SIZE)
}

/// Would an 8×8 box at `(x, y)` collide with the map?
pub fn is_blocked<G: TileGrid + ?Sized>(grid: &G, x: f32, y: f32, is_falling: bool) -> bool {
    let (x1, y1) = (min_cell(x), min_cell(y));
    let (x2, y2) = (max_cell(x), max_cell(y));

    for row in y1..=y2 {
        for col in x1..=x2 {
            if grid.tile_at(col, row).is_wall() {
                return true;
            }
        }
    }

    if is_falling && y.rem_euclid(TILE_SIZE as f32) == 1.0 {
        for col in x1..=x2 {
            if grid.tile_at(col, y1 + 1) == TileKind::Floor {
                return true;
            }
        }
    }

    false
}

#[inline]
fn step_count(delta: f32) -> u32 {
    delta.abs().ceil() as u32
}

/// Move a box by `(dx, dy)`, stopping each axis at the first blocked step.
/// Returns only the resolved position; velocities are the caller's business.
pub fn resolve_move<G: TileGrid + ?Sized>(
    grid: &G,
    mut x: f32,
    mut y: f32,
    dx: f32,
    dy: f32,
) -> (f32, f32) {
    let is_falling = dy > 0.0;

    let mut remaining = dy;
    for _ in 0..step_count(dy) {
        let step = remaining.clamp(-1.0, 1.0);
        if is_blocked(grid, x, y + step, is_falling) {
            break;
        }
        y += step;
        remaining -= step;
    }

    let mut remaining = dx;
    for _ in 0..step_count(dx) {
        let step = remaining.clamp(-1.0, 1.0);
        if is_blocked(grid, x + step, y, is_falling) {
            break;
        }
        x += step;
        remaining -= step;
    }

    (x, y)
}

/// Is the single tile under pixel `(x, y)` a Floor or a Wall?
/// Point lookup for enemy wall/ledge sensing; no box, no one-way rule.
pub fn is_wall_tile<G: TileGrid + ?Sized>(grid: &G, x: f32, y: f32) -> bool {
    let col = (x / TILE_SIZE as f32).floor() as i32;
    let row = (y / TILE_SIZE as f32).floor() as i32;
    grid.tile_at(col, row).is_solid_ground()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
