/// The step function: advances a Playing stage by one frame.
///
/// Processing order:
///   1. Player movement (input → velocity → resolve → latch/clamp/decay)
///   2. Fall check (off the bottom of the screen → GameOver)
///   3. Hostiles, in list order: lethal contact → update → stomp → bounds
///   4. Sweep dead hostiles, append bullets fired this frame
///   5. Camera advance + spawn scan over the revealed span
///   6. Frame counter
///   7. Goal check
///
/// Steps 2 and 3 end the frame early on a GameOver; nothing after them runs.

use tracing::{debug, info};

use crate::config::PhysicsConfig;
use crate::domain::ai::{SpawnRequest, UpdateCtx};
use crate::domain::collision::resolve_move;
use crate::domain::entity::{Facing, FrameInput, Hostile};
use crate::domain::tile::TileMap;
use super::event::GameEvent;
use super::spawn;
use super::world::{Phase, StageState};

/// Hostiles further than this left of the screen are dropped.
const CULL_MARGIN_LEFT: f32 = 8.0;
/// Margin past the top, right and bottom screen edges before culling.
const CULL_MARGIN_FAR: f32 = 32.0;

/// Horizontal distance under which player and hostile touch.
const CONTACT_REACH: f32 = 6.0;
/// Vertical offsets (player y minus hostile y). Stomps land in
/// `STOMP_HIGH..=STOMP_LOW`; body contact is `STOMP_LOW..BODY_LOW`, both ends open.
const STOMP_HIGH: f32 = -6.0;
const STOMP_LOW: f32 = -2.0;
const BODY_LOW: f32 = 6.0;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(state: &mut StageState, input: FrameInput, physics: &PhysicsConfig) -> Vec<GameEvent> {
    if state.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    resolve_player(state, input, physics, &mut events);
    if resolve_fall(state, physics, &mut events) { return events; }
    if resolve_hostiles(state, physics, &mut events) { return events; }
    resolve_scroll(state, physics);
    state.frame += 1;
    resolve_goal(state, physics, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(
    state: &mut StageState,
    input: FrameInput,
    physics: &PhysicsConfig,
    events: &mut Vec<GameEvent>,
) {
    let frame = state.frame;
    let p = &mut state.player;
    let last_y = p.y;

    if input.wants_left() {
        p.moving_left = true;
        p.moving_right = false;
        p.dx = -physics.walk_speed;
        p.facing = Facing::Left;
    }
    if input.wants_right() {
        p.moving_right = true;
        p.moving_left = false;
        p.dx = physics.walk_speed;
        p.facing = Facing::Right;
    }
    p.dy = (p.dy + physics.gravity).min(physics.max_fall_speed);

    if input.down {
        p.moving_left = false;
        p.moving_right = false;
        p.dx = 0.0;
    }

    if input.wants_jump() && p.can_jump(frame, physics.jump_cooldown_frames) {
        p.dy = physics.jump_impulse;
        p.last_jump = Some(frame);
        events.push(GameEvent::Jumped);
    }

    (p.x, p.y) = resolve_move(&state.map, p.x, p.y, p.dx, p.dy);

    // Latched run speed goes back in before decay, so a held direction
    // settles at trunc(run * decay) on the next frame.
    if p.moving_left {
        p.dx = -physics.run_speed;
    } else if p.moving_right {
        p.dx = physics.run_speed;
    }
    p.x = state.camera.clamp_left(p.x);
    p.y = p.y.max(0.0);
    p.dx = (p.dx * physics.velocity_decay).trunc();
    p.falling = p.y > last_y;
}

fn resolve_fall(state: &mut StageState, physics: &PhysicsConfig, events: &mut Vec<GameEvent>) -> bool {
    if state.player.y < physics.screen_height { return false; }
    info!(stage = state.stage_index, x = state.player.x, "player fell");
    state.phase = Phase::GameOver;
    events.push(GameEvent::PlayerFell);
    true
}

// ══════════════════════════════════════════════════════════════
// Hostiles: update pass, then sweep
// ══════════════════════════════════════════════════════════════

/// Body overlap that kills the player: beside the enemy, not above it.
#[inline]
fn is_lethal(dx: f32, dy: f32) -> bool {
    dx.abs() < CONTACT_REACH && dy > STOMP_LOW && dy < BODY_LOW
}

/// Player landing on top of the enemy.
#[inline]
fn is_stomp(dx: f32, dy: f32) -> bool {
    dx.abs() < CONTACT_REACH && (STOMP_HIGH..=STOMP_LOW).contains(&dy)
}

fn is_out_of_bounds(x: f32, y: f32, offset: f32, physics: &PhysicsConfig) -> bool {
    x < offset - CULL_MARGIN_LEFT
        || x > offset + physics.screen_width + CULL_MARGIN_FAR
        || y < -CULL_MARGIN_FAR
        || y > physics.screen_height + CULL_MARGIN_FAR
}

/// Returns true when the player was killed and the frame must stop.
fn resolve_hostiles(state: &mut StageState, physics: &PhysicsConfig, events: &mut Vec<GameEvent>) -> bool {
    let StageState { phase, map, camera, player, hostiles, stage_index, .. } = state;
    let map: &TileMap = map;
    let mut fired: Vec<Hostile> = Vec::new();

    for h in hostiles.iter_mut() {
        let (ex, ey) = h.pos();
        if is_lethal(player.x - ex, player.y - ey) {
            info!(stage = *stage_index, by = ?h.kind(), x = player.x, y = player.y, "player killed");
            *phase = Phase::GameOver;
            events.push(GameEvent::PlayerKilled { by: h.kind() });
            return true;
        }

        let ctx = UpdateCtx { grid: map, player_x: player.x, player_y: player.y, physics };
        if let Some(SpawnRequest::Bullet(b)) = h.update(&ctx) {
            debug!(x = b.x, y = b.y, dx = b.dx, dy = b.dy, "shot fired");
            events.push(GameEvent::ShotFired { x: b.x, y: b.y });
            fired.push(Hostile::Bullet(b));
        }

        let (ex, ey) = h.pos();
        if is_stomp(player.x - ex, player.y - ey) {
            h.kill();
            (player.x, player.y) = resolve_move(map, player.x, player.y, player.dx, physics.stomp_bounce);
            events.push(GameEvent::EnemyStomped { kind: h.kind(), x: ex, y: ey });
        }

        if is_out_of_bounds(ex, ey, camera.offset, physics) {
            h.kill();
        }
    }

    hostiles.retain(Hostile::is_alive);
    hostiles.extend(fired);
    false
}

// ══════════════════════════════════════════════════════════════
// Camera, goal
// ══════════════════════════════════════════════════════════════

fn resolve_scroll(state: &mut StageState, physics: &PhysicsConfig) {
    if let Some((old, new)) = state.camera.advance(state.player.x, physics.scroll_border) {
        spawn::scan(state, old + physics.screen_width, new + physics.screen_width - 1.0);
    }
}

fn resolve_goal(state: &mut StageState, physics: &PhysicsConfig, events: &mut Vec<GameEvent>) {
    let Some(goal) = state.goal else { return };
    if (state.player.x - goal.x).abs() < physics.goal_reach {
        info!(stage = state.stage_index, frame = state.frame, "stage cleared");
        state.phase = Phase::Cleared;
        events.push(GameEvent::StageCleared { stage: state.stage_index });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
