/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

use crate::domain::entity::EntityKind;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    EnemyStomped { kind: EntityKind, x: f32, y: f32 },
    ShotFired { x: f32, y: f32 },
    PlayerKilled { by: EntityKind },
    PlayerFell,
    StageCleared { stage: usize },
    GameCompleted,
    Restarted,
}
