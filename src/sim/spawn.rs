/// SpawnManager: turns markers in newly revealed map columns into entities.
///
/// A scan covers tile columns `ceil(left/8) ..= floor(right/8)` over the
/// first `SCAN_ROWS` rows. Columns already visited this stage are skipped
/// (`StageState::scanned_to`), so each marker spawns at most once per stage
/// session no matter how the windows overlap.

use tracing::debug;

use crate::domain::entity::{Goal, Hostile};
use crate::domain::tile::{TileGrid, TileKind, TILE_SIZE};
use super::world::StageState;

/// Rows checked per column.
pub const SCAN_ROWS: i32 = 16;

/// Scan `[left, right]` (pixels) for markers. Returns the number of
/// entities created.
pub fn scan(state: &mut StageState, left: f32, right: f32) -> usize {
    let tile = TILE_SIZE as f32;
    let first = ((left / tile).ceil() as i32).max(state.scanned_to).max(0);
    let last = (right / tile).floor() as i32;
    if last < first {
        return 0;
    }

    let mut spawned = 0;
    for col in first..=last {
        for row in 0..SCAN_ROWS {
            let (x, y) = ((col * TILE_SIZE) as f32, (row * TILE_SIZE) as f32);
            match state.map.tile_at(col, row) {
                TileKind::Spawn(n) => {
                    if let Some(h) = Hostile::from_marker(n, x, y) {
                        debug!(kind = ?h.kind(), x, y, "spawn");
                        state.hostiles.push(h);
                        spawned += 1;
                    }
                }
                TileKind::GoalMarker if state.goal.is_none() => {
                    debug!(x, y, "goal installed");
                    state.goal = Some(Goal { x, y });
                    spawned += 1;
                }
                _ => {}
            }
        }
    }

    state.scanned_to = last + 1;
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EntityKind;
    use crate::domain::tile::TileMap;

    fn state_from(rows: &[&str]) -> StageState {
        let mut s = StageState::new();
        s.map = TileMap::from_rows(rows);
        s.reset_runtime(128.0);
        s
    }

    fn kinds(s: &StageState) -> Vec<EntityKind> {
        s.hostiles.iter().map(|h| h.kind()).collect()
    }

    #[test]
    fn markers_spawn_at_cell_origin() {
        let mut s = state_from(&[
            "   1  ",
            "      ",
            " 2  3 ",
        ]);
        assert_eq!(scan(&mut s, 0.0, 47.0), 3);
        assert_eq!(kinds(&s), vec![EntityKind::Enemy2, EntityKind::Enemy1, EntityKind::Enemy3]);
        assert_eq!(s.hostiles[0].pos(), (8.0, 16.0));
        assert_eq!(s.hostiles[1].pos(), (24.0, 0.0));
        assert_eq!(s.hostiles[2].pos(), (32.0, 16.0));
    }

    #[test]
    fn span_rounds_inward() {
        let mut s = state_from(&["1 1 1"]);
        // ceil(1/8)=1 .. floor(31/8)=3 → columns 1..=3
        assert_eq!(scan(&mut s, 1.0, 31.0), 1);
        assert_eq!(s.hostiles[0].pos(), (16.0, 0.0));
    }

    #[test]
    fn rows_beyond_scan_extent_ignored() {
        let mut rows = vec!["  "; 17];
        rows[16] = "1 ";
        let mut s = state_from(&rows);
        assert_eq!(scan(&mut s, 0.0, 15.0), 0);
    }

    #[test]
    fn overlapping_scans_never_duplicate() {
        let mut s = state_from(&["1  2  3  1"]);
        scan(&mut s, 0.0, 39.0);
        scan(&mut s, 16.0, 63.0);
        scan(&mut s, 0.0, 79.0);
        assert_eq!(s.hostiles.len(), 4);
    }

    #[test]
    fn goal_marker_installs_goal_once() {
        let mut s = state_from(&["  G G"]);
        scan(&mut s, 0.0, 39.0);
        assert_eq!(s.goal, Some(Goal { x: 16.0, y: 0.0 }));
        assert!(s.hostiles.is_empty());
    }

    #[test]
    fn malformed_marker_spawns_nothing() {
        let mut s = state_from(&["? ?"]);
        assert_eq!(scan(&mut s, 0.0, 23.0), 0);
        assert!(s.goal.is_none());
    }

    #[test]
    fn inverted_span_is_noop() {
        let mut s = state_from(&["111"]);
        assert_eq!(scan(&mut s, 20.0, 10.0), 0);
        assert_eq!(s.scanned_to, 0);
    }
}
