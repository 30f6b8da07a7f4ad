/// Hostile behavior: one update per frame per variant.
///
///   Enemy1: ground patroller. Turns at a wall directly ahead.
///   Enemy2: ledge-aware patroller. While standing, also turns when the
///           ground ahead runs out.
///   Enemy3: stationary shooter. Fires at the player when in range.
///   Bullet: straight line, ignores tiles.
///
/// Sensing happens before movement: the turn decision uses the current
/// position, and this frame's velocity is already set from the old
/// direction (the resolver refuses the step into the wall).

use crate::config::PhysicsConfig;
use super::collision::{is_wall_tile, resolve_move};
use super::entity::{Bullet, Facing, Hostile, Patroller, Shooter};
use super::tile::TileGrid;

/// What an update may see of the world.
pub struct UpdateCtx<'a> {
    pub grid: &'a dyn TileGrid,
    pub player_x: f32,
    pub player_y: f32,
    pub physics: &'a PhysicsConfig,
}

/// New entity produced during an update, appended after the sweep.
#[derive(Clone, Debug)]
pub enum SpawnRequest {
    Bullet(Bullet),
}

impl Hostile {
    pub fn update(&mut self, ctx: &UpdateCtx) -> Option<SpawnRequest> {
        match self {
            Hostile::Enemy1(p) => {
                update_patroller(p, ctx, false);
                None
            }
            Hostile::Enemy2(p) => {
                update_patroller(p, ctx, true);
                None
            }
            Hostile::Enemy3(s) => update_shooter(s, ctx),
            Hostile::Bullet(b) => {
                b.x += b.dx;
                b.y += b.dy;
                None
            }
        }
    }
}

#[inline]
fn apply_gravity(dy: f32, physics: &PhysicsConfig) -> f32 {
    (dy + physics.gravity).min(physics.max_fall_speed)
}

fn update_patroller(p: &mut Patroller, ctx: &UpdateCtx, ledge_aware: bool) {
    let grid = ctx.grid;
    p.dx = p.direction.sign() * ctx.physics.enemy_speed;
    p.dy = apply_gravity(p.dy, ctx.physics);

    let wall_left = || is_wall_tile(grid, p.x - 1.0, p.y + 4.0);
    let wall_right = || is_wall_tile(grid, p.x + 8.0, p.y + 4.0);

    let turn = if ledge_aware {
        let standing = is_wall_tile(grid, p.x, p.y + 8.0) || is_wall_tile(grid, p.x + 7.0, p.y + 8.0);
        standing && match p.direction {
            Facing::Left => wall_left() || !is_wall_tile(grid, p.x - 1.0, p.y + 8.0),
            Facing::Right => wall_right() || !is_wall_tile(grid, p.x + 7.0, p.y + 8.0),
        }
    } else {
        match p.direction {
            Facing::Left => wall_left(),
            Facing::Right => wall_right(),
        }
    };

    if turn {
        p.direction = match p.direction {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        };
    }

    (p.x, p.y) = resolve_move(grid, p.x, p.y, p.dx, p.dy);
}

fn update_shooter(s: &mut Shooter, ctx: &UpdateCtx) -> Option<SpawnRequest> {
    s.countdown -= 1;
    if s.countdown > 0 {
        return None;
    }

    let dx = ctx.player_x - s.x;
    let dy = ctx.player_y - s.y;
    let sq_dist = dx * dx + dy * dy;
    let range = ctx.physics.shooter_range;
    // Standing on the shooter gives no direction to aim in.
    if sq_dist >= range * range || sq_dist == 0.0 {
        return None;
    }

    let dist = sq_dist.sqrt();
    let speed = ctx.physics.bullet_speed;
    s.countdown = ctx.physics.shooter_cooldown;
    Some(SpawnRequest::Bullet(Bullet::new(s.x, s.y, dx / dist * speed, dy / dist * speed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EntityKind;
    use crate::domain::tile::TileMap;

    fn ctx<'a>(map: &'a TileMap, physics: &'a PhysicsConfig, px: f32, py: f32) -> UpdateCtx<'a> {
        UpdateCtx { grid: map, player_x: px, player_y: py, physics }
    }

    fn patroller(h: &Hostile) -> &Patroller {
        match h {
            Hostile::Enemy1(p) | Hostile::Enemy2(p) => p,
            _ => panic!("not a patroller"),
        }
    }

    // ── Enemy1 ──

    #[test]
    fn walker_turns_on_the_frame_it_meets_a_wall() {
        let map = TileMap::from_rows(&[
            "    #",
            "#####",
        ]);
        let physics = PhysicsConfig::default();
        let mut e = Hostile::Enemy1(Patroller::new(16.0, 0.0, Facing::Right));

        for expected_x in 17..=24 {
            e.update(&ctx(&map, &physics, 200.0, 0.0));
            assert_eq!(patroller(&e).x, expected_x as f32);
            assert_eq!(patroller(&e).direction, Facing::Right, "turned early at x={expected_x}");
        }

        // x=24: box touches column 3; column 4 is the wall.
        e.update(&ctx(&map, &physics, 200.0, 0.0));
        assert_eq!(patroller(&e).direction, Facing::Left);
        assert_eq!(patroller(&e).x, 24.0);

        e.update(&ctx(&map, &physics, 200.0, 0.0));
        assert_eq!(patroller(&e).x, 23.0);
    }

    #[test]
    fn walker_turns_at_left_wall() {
        let map = TileMap::from_rows(&[
            "#    ",
            "#####",
        ]);
        let physics = PhysicsConfig::default();
        let mut e = Hostile::from_marker(1, 10.0, 0.0).unwrap();
        e.update(&ctx(&map, &physics, 200.0, 0.0));
        assert_eq!(patroller(&e).x, 9.0);
        e.update(&ctx(&map, &physics, 200.0, 0.0));
        assert_eq!(patroller(&e).x, 8.0);
        assert_eq!(patroller(&e).direction, Facing::Left);
        e.update(&ctx(&map, &physics, 200.0, 0.0));
        assert_eq!(patroller(&e).direction, Facing::Right);
        assert_eq!(patroller(&e).x, 8.0);
    }

    #[test]
    fn walker_falls_under_gravity() {
        let map = TileMap::from_rows(&["   ", "   ", "   ", "###"]);
        let physics = PhysicsConfig::default();
        let mut e = Hostile::Enemy1(Patroller::new(8.0, 0.0, Facing::Left));
        let mut ys = vec![];
        for _ in 0..4 {
            e.update(&ctx(&map, &physics, 200.0, 0.0));
            ys.push(patroller(&e).y);
        }
        // dy: 1, 2, 3, 3 (capped)
        assert_eq!(ys, vec![1.0, 3.0, 6.0, 9.0]);
    }

    // ── Enemy2 ──

    #[test]
    fn ledge_walker_stays_on_its_platform() {
        // Platform spans x 8..40; the turn is decided before the step,
        // so each reversal lands one pixel past the turning point.
        let map = TileMap::from_rows(&[
            "        ",
            " ####   ",
        ]);
        let physics = PhysicsConfig::default();
        let mut e = Hostile::from_marker(2, 8.0, 0.0).unwrap();
        let mut turned_at = vec![];
        let mut last = patroller(&e).direction;
        for _ in 0..120 {
            e.update(&ctx(&map, &physics, 500.0, 0.0));
            let p = patroller(&e);
            assert_eq!(p.y, 0.0, "lost footing at x={}", p.x);
            assert!(p.x >= 7.0 && p.x <= 34.0, "walked off the ledge at x={}", p.x);
            if p.direction != last {
                turned_at.push((p.direction, p.x));
                last = p.direction;
            }
        }
        assert!(turned_at.len() >= 2);
        assert_eq!(turned_at[0], (Facing::Left, 34.0));
        assert_eq!(turned_at[1], (Facing::Right, 7.0));
    }

    #[test]
    fn ledge_walker_turns_at_wall() {
        let map = TileMap::from_rows(&[
            "   #",
            "####",
        ]);
        let physics = PhysicsConfig::default();
        let mut e = Hostile::Enemy2(Patroller::new(16.0, 0.0, Facing::Right));
        e.update(&ctx(&map, &physics, 500.0, 0.0));
        assert_eq!(patroller(&e).direction, Facing::Left);
        assert_eq!(patroller(&e).x, 16.0);
    }

    #[test]
    fn ledge_walker_never_turns_midair() {
        let map = TileMap::from_rows(&["    ", "    ", "    ", "    ", "####"]);
        let physics = PhysicsConfig::default();
        let mut e = Hostile::Enemy2(Patroller::new(16.0, 0.0, Facing::Left));
        e.update(&ctx(&map, &physics, 500.0, 0.0));
        assert_eq!(patroller(&e).direction, Facing::Left);
        assert_eq!(patroller(&e).x, 15.0);
    }

    // ── Enemy3 ──

    fn fire(h: &mut Hostile, map: &TileMap, physics: &PhysicsConfig, px: f32, py: f32) -> Option<Bullet> {
        match h.update(&ctx(map, physics, px, py)) {
            Some(SpawnRequest::Bullet(b)) => Some(b),
            None => None,
        }
    }

    #[test]
    fn shooter_fires_at_player_in_range() {
        let map = TileMap::default();
        let physics = PhysicsConfig::default();
        let mut s = Hostile::Enemy3(Shooter::new(40.0, 40.0));
        let b = fire(&mut s, &map, &physics, 70.0, 0.0).expect("should fire");
        assert_eq!((b.x, b.y), (40.0, 40.0));
        assert!((b.dx - 0.6).abs() < 1e-6);
        assert!((b.dy + 0.8).abs() < 1e-6);
    }

    #[test]
    fn shooter_respects_cooldown() {
        let map = TileMap::default();
        let physics = PhysicsConfig::default();
        let mut s = Hostile::Enemy3(Shooter::new(0.0, 0.0));
        assert!(fire(&mut s, &map, &physics, 10.0, 0.0).is_some());
        for i in 1..60 {
            assert!(fire(&mut s, &map, &physics, 10.0, 0.0).is_none(), "fired early on frame {i}");
        }
        assert!(fire(&mut s, &map, &physics, 10.0, 0.0).is_some());
    }

    #[test]
    fn shooter_holds_fire_out_of_range_then_fires_immediately() {
        let map = TileMap::default();
        let physics = PhysicsConfig::default();
        let mut s = Hostile::Enemy3(Shooter::new(0.0, 0.0));
        for _ in 0..5 {
            assert!(fire(&mut s, &map, &physics, 60.0, 0.0).is_none());
        }
        match &s {
            Hostile::Enemy3(sh) => assert_eq!(sh.countdown, -5),
            _ => unreachable!(),
        }
        let b = fire(&mut s, &map, &physics, -30.0, 0.0).expect("in range now");
        assert!((b.dx + 1.0).abs() < 1e-6);
        assert_eq!(b.dy, 0.0);
    }

    #[test]
    fn shooter_never_moves() {
        let map = TileMap::from_rows(&["   ", "   "]);
        let physics = PhysicsConfig::default();
        let mut s = Hostile::from_marker(3, 8.0, 0.0).unwrap();
        for _ in 0..10 {
            s.update(&ctx(&map, &physics, 100.0, 100.0));
        }
        assert_eq!(s.pos(), (8.0, 0.0));
        assert_eq!(s.kind(), EntityKind::Enemy3);
    }

    // ── Bullet ──

    #[test]
    fn bullet_flies_through_walls() {
        let map = TileMap::from_rows(&["####", "####"]);
        let physics = PhysicsConfig::default();
        let mut b = Hostile::Bullet(Bullet::new(0.0, 0.0, 1.5, 0.5));
        for _ in 0..4 {
            assert!(b.update(&ctx(&map, &physics, 0.0, 0.0)).is_none());
        }
        assert_eq!(b.pos(), (6.0, 2.0));
    }
}
