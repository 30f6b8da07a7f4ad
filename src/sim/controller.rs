/// StageController: owns the stage list, the StageState and the phase
/// machine around the per-frame step.
///
///   Loading  ──load──▶ Playing ──fall/contact──▶ GameOver ──restart──▶ Playing
///                         │
///                         └──goal──▶ Cleared ──next──▶ Loading | Completed
///
/// Every transition takes one `tick`; Cleared is visible for exactly one
/// frame before the stage index advances.

use tracing::info;

use crate::config::PhysicsConfig;
use crate::domain::entity::{DirectionIntent, FrameInput};
use super::event::GameEvent;
use super::level::StageDef;
use super::spawn;
use super::step;
use super::world::{Phase, StageState};

pub struct StageController {
    pub state: StageState,
    pub stages: Vec<StageDef>,
    pub physics: PhysicsConfig,
}

impl StageController {
    pub fn new(stages: Vec<StageDef>, physics: PhysicsConfig) -> Self {
        StageController { state: StageState::new(), stages, physics }
    }

    /// Advance one frame in whatever phase the stage is in.
    pub fn tick(&mut self, input: FrameInput) -> Vec<GameEvent> {
        if input.intent != DirectionIntent::None {
            self.state.last_intent = input.intent;
        }

        match self.state.phase {
            Phase::Loading => self.load_stage(),
            Phase::Playing => step::step(&mut self.state, input, &self.physics),
            Phase::GameOver if input.restart => self.restart(),
            Phase::GameOver => vec![],
            Phase::Cleared => self.advance(),
            Phase::Completed => vec![],
        }
    }

    /// Load the stage at `stage_index` and start playing it.
    fn load_stage(&mut self) -> Vec<GameEvent> {
        let Some(def) = self.stages.get(self.state.stage_index) else {
            self.state.phase = Phase::Completed;
            return vec![GameEvent::GameCompleted];
        };
        self.state.stage_name = def.name.clone();
        self.state.map = def.to_map();
        let map = &self.state.map;
        info!(
            stage = self.state.stage_index,
            name = %def.name,
            width = map.width,
            height = map.height,
            "stage loaded"
        );
        self.begin();
        vec![]
    }

    /// Discard everything from the failed attempt and replay the stage.
    pub fn restart(&mut self) -> Vec<GameEvent> {
        info!(stage = self.state.stage_index, "restart");
        self.begin();
        vec![GameEvent::Restarted]
    }

    fn advance(&mut self) -> Vec<GameEvent> {
        self.state.stage_index += 1;
        if self.state.stage_index < self.stages.len() {
            self.state.phase = Phase::Loading;
            vec![]
        } else {
            info!(stages = self.stages.len(), "all stages cleared");
            self.state.phase = Phase::Completed;
            vec![GameEvent::GameCompleted]
        }
    }

    /// Fresh player, camera and timer; initial scan of the first screen.
    fn begin(&mut self) {
        let screen_width = self.physics.screen_width;
        self.state.reset_runtime(screen_width);
        spawn::scan(&mut self.state, 0.0, screen_width - 1.0);
        self.state.phase = Phase::Playing;
    }
}
