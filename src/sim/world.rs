/// StageState: everything one running stage owns.
///
/// The controller holds exactly one of these and passes it explicitly to
/// step, spawn and the renderer. A stage load or restart rebuilds the
/// per-stage fields in place; `stage_index` and `last_intent` survive.

use crate::domain::entity::{DirectionIntent, Goal, Hostile, Player};
use crate::domain::tile::TileMap;
use super::camera::ScrollCamera;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Loading,
    Playing,
    GameOver,
    Cleared,
    Completed,
}

#[derive(Clone, Debug)]
pub struct StageState {
    pub phase: Phase,
    pub stage_index: usize,
    pub stage_name: String,
    pub map: TileMap,
    pub camera: ScrollCamera,
    pub frame: u64,
    pub player: Player,
    pub hostiles: Vec<Hostile>,
    pub goal: Option<Goal>,
    /// First map column not yet visited by a spawn scan.
    pub scanned_to: i32,
    /// Last answer from the voice classifier, shown in the HUD.
    pub last_intent: DirectionIntent,
}

impl StageState {
    pub fn new() -> Self {
        StageState {
            phase: Phase::Loading,
            stage_index: 0,
            stage_name: String::new(),
            map: TileMap::default(),
            camera: ScrollCamera::default(),
            frame: 0,
            player: Player::new(0.0, 0.0),
            hostiles: Vec::new(),
            goal: None,
            scanned_to: 0,
            last_intent: DirectionIntent::None,
        }
    }

    /// Clear per-stage runtime state. The map is kept.
    pub fn reset_runtime(&mut self, screen_width: f32) {
        self.camera = ScrollCamera::for_level(self.map.pixel_width() as f32, screen_width);
        self.frame = 0;
        self.player = Player::new(0.0, 0.0);
        self.hostiles.clear();
        self.goal = None;
        self.scanned_to = 0;
    }

    /// Whole seconds elapsed, counting frames at the nominal frame rate.
    pub fn elapsed_secs(&self, tick_rate_ms: u64) -> u64 {
        let fps = (1000 / tick_rate_ms.max(1)).max(1);
        self.frame / fps
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self::new()
    }
}
