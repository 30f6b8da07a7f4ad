/// ScrollCamera: horizontal-only, forward-only scrolling.
///
/// The offset is the world x of the screen's left edge. It only moves
/// right, when the player passes `offset + border`, and stops at
/// `max_scroll` (map width minus one screen). The player can never walk
/// back past the left edge.

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScrollCamera {
    pub offset: f32,
    pub max_scroll: f32,
}

impl ScrollCamera {
    /// Camera at the level start for a map `map_width` pixels wide.
    pub fn for_level(map_width: f32, screen_width: f32) -> Self {
        ScrollCamera {
            offset: 0.0,
            max_scroll: (map_width - screen_width).max(0.0),
        }
    }

    /// Push the offset forward if the player crossed the scroll border.
    /// Returns `(old, new)` only when the offset actually changed.
    pub fn advance(&mut self, player_x: f32, border: f32) -> Option<(f32, f32)> {
        if player_x <= self.offset + border {
            return None;
        }
        let target = (player_x - border).min(self.max_scroll);
        if target <= self.offset {
            return None;
        }
        let old = self.offset;
        self.offset = target;
        Some((old, target))
    }

    /// Keep an x coordinate on screen at the left edge.
    #[inline]
    pub fn clamp_left(&self, x: f32) -> f32 {
        x.max(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_map_never_scrolls() {
        let mut cam = ScrollCamera::for_level(100.0, 128.0);
        assert_eq!(cam.max_scroll, 0.0);
        assert_eq!(cam.advance(120.0, 80.0), None);
        assert_eq!(cam.offset, 0.0);
    }

    #[test]
    fn follows_player_past_border() {
        let mut cam = ScrollCamera::for_level(1024.0, 128.0);
        assert_eq!(cam.advance(80.0, 80.0), None);
        assert_eq!(cam.advance(83.0, 80.0), Some((0.0, 3.0)));
        assert_eq!(cam.offset, 3.0);
    }

    #[test]
    fn never_moves_backwards() {
        let mut cam = ScrollCamera::for_level(1024.0, 128.0);
        cam.advance(200.0, 80.0);
        assert_eq!(cam.advance(100.0, 80.0), None);
        assert_eq!(cam.offset, 120.0);
    }

    #[test]
    fn clamped_to_level_end() {
        let mut cam = ScrollCamera::for_level(256.0, 128.0);
        assert_eq!(cam.advance(500.0, 80.0), Some((0.0, 128.0)));
        assert_eq!(cam.advance(600.0, 80.0), None);
        assert_eq!(cam.offset, 128.0);
    }

    #[test]
    fn left_clamp() {
        let mut cam = ScrollCamera::for_level(1024.0, 128.0);
        cam.advance(150.0, 80.0);
        assert_eq!(cam.clamp_left(40.0), 70.0);
        assert_eq!(cam.clamp_left(90.0), 90.0);
    }
}
