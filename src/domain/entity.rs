/// Entities: Player, the hostile variants (Enemy1/2/3, Bullet), and Goal.
/// Positions are pixel coordinates of the 8×8 box's top-left corner.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Coarse direction returned by the voice classifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DirectionIntent {
    Up,
    Left,
    Right,
    #[default]
    None,
}

impl DirectionIntent {
    pub fn label(self) -> &'static str {
        match self {
            DirectionIntent::Up => "UP",
            DirectionIntent::Left => "LEFT",
            DirectionIntent::Right => "RIGHT",
            DirectionIntent::None => "NONE",
        }
    }
}

/// Frame input: held movement plus edge-triggered actions.
/// `intent` is non-None only on the frame the classifier answered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump: bool,
    pub restart: bool,
    pub intent: DirectionIntent,
}

impl FrameInput {
    pub fn wants_left(&self) -> bool {
        self.left || self.intent == DirectionIntent::Left
    }

    pub fn wants_right(&self) -> bool {
        self.right || self.intent == DirectionIntent::Right
    }

    pub fn wants_jump(&self) -> bool {
        self.jump || self.intent == DirectionIntent::Up
    }
}

/// Tag for each hostile variant, carried by events and logs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Enemy1,
    Enemy2,
    Enemy3,
    Bullet,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub facing: Facing,
    pub last_jump: Option<u64>,  // frame of the last accepted jump
    pub moving_left: bool,       // latched run direction
    pub moving_right: bool,
    pub falling: bool,           // moved down this frame (sprite only)
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            dx: 0.0,
            dy: 0.0,
            facing: Facing::Right,
            last_jump: None,
            moving_left: false,
            moving_right: false,
            falling: false,
        }
    }

    /// May a jump start on `frame`?
    pub fn can_jump(&self, frame: u64, cooldown: u64) -> bool {
        match self.last_jump {
            None => true,
            Some(last) => frame.saturating_sub(last) >= cooldown,
        }
    }
}

/// Ground patroller shared by Enemy1 and Enemy2.
#[derive(Clone, Debug)]
pub struct Patroller {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub direction: Facing,
    pub alive: bool,
}

impl Patroller {
    pub fn new(x: f32, y: f32, direction: Facing) -> Self {
        Patroller { x, y, dx: 0.0, dy: 0.0, direction, alive: true }
    }
}

/// Stationary shooter (Enemy3).
#[derive(Clone, Debug)]
pub struct Shooter {
    pub x: f32,
    pub y: f32,
    pub countdown: i32,  // frames until next shot; keeps falling while out of range
    pub alive: bool,
}

impl Shooter {
    pub fn new(x: f32, y: f32) -> Self {
        Shooter { x, y, countdown: 0, alive: true }
    }
}

#[derive(Clone, Debug)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub alive: bool,
}

impl Bullet {
    pub fn new(x: f32, y: f32, dx: f32, dy: f32) -> Self {
        Bullet { x, y, dx, dy, alive: true }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Goal {
    pub x: f32,
    pub y: f32,
}

/// Everything that can hurt the player. Closed set, dispatched by match.
#[derive(Clone, Debug)]
pub enum Hostile {
    Enemy1(Patroller),
    Enemy2(Patroller),
    Enemy3(Shooter),
    Bullet(Bullet),
}

impl Hostile {
    /// Enemy variant for a spawn marker number. Unknown numbers spawn nothing.
    pub fn from_marker(n: u8, x: f32, y: f32) -> Option<Hostile> {
        match n {
            1 => Some(Hostile::Enemy1(Patroller::new(x, y, Facing::Left))),
            2 => Some(Hostile::Enemy2(Patroller::new(x, y, Facing::Right))),
            3 => Some(Hostile::Enemy3(Shooter::new(x, y))),
            _ => None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Hostile::Enemy1(_) => EntityKind::Enemy1,
            Hostile::Enemy2(_) => EntityKind::Enemy2,
            Hostile::Enemy3(_) => EntityKind::Enemy3,
            Hostile::Bullet(_) => EntityKind::Bullet,
        }
    }

    pub fn pos(&self) -> (f32, f32) {
        match self {
            Hostile::Enemy1(p) | Hostile::Enemy2(p) => (p.x, p.y),
            Hostile::Enemy3(s) => (s.x, s.y),
            Hostile::Bullet(b) => (b.x, b.y),
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Hostile::Enemy1(p) | Hostile::Enemy2(p) => p.alive,
            Hostile::Enemy3(s) => s.alive,
            Hostile::Bullet(b) => b.alive,
        }
    }

    pub fn kill(&mut self) {
        match self {
            Hostile::Enemy1(p) | Hostile::Enemy2(p) => p.alive = false,
            Hostile::Enemy3(s) => s.alive = false,
            Hostile::Bullet(b) => b.alive = false,
        }
    }

    /// Facing for sprite flipping. Shooters and bullets have none.
    pub fn facing(&self) -> Option<Facing> {
        match self {
            Hostile::Enemy1(p) | Hostile::Enemy2(p) => Some(p.direction),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_map_to_variants() {
        assert_eq!(Hostile::from_marker(1, 8.0, 0.0).map(|h| h.kind()), Some(EntityKind::Enemy1));
        assert_eq!(Hostile::from_marker(2, 8.0, 0.0).map(|h| h.kind()), Some(EntityKind::Enemy2));
        assert_eq!(Hostile::from_marker(3, 8.0, 0.0).map(|h| h.kind()), Some(EntityKind::Enemy3));
        assert!(Hostile::from_marker(4, 8.0, 0.0).is_none());
    }

    #[test]
    fn patrol_start_directions() {
        let e1 = Hostile::from_marker(1, 0.0, 0.0).unwrap();
        let e2 = Hostile::from_marker(2, 0.0, 0.0).unwrap();
        assert_eq!(e1.facing(), Some(Facing::Left));
        assert_eq!(e2.facing(), Some(Facing::Right));
    }

    #[test]
    fn kill_clears_alive() {
        let mut h = Hostile::Bullet(Bullet::new(1.0, 2.0, 0.5, 0.5));
        assert!(h.is_alive());
        h.kill();
        assert!(!h.is_alive());
        assert_eq!(h.pos(), (1.0, 2.0));
    }

    #[test]
    fn jump_cooldown_window() {
        let mut p = Player::new(0.0, 0.0);
        assert!(p.can_jump(0, 15));
        p.last_jump = Some(10);
        assert!(!p.can_jump(10, 15));
        assert!(!p.can_jump(24, 15));
        assert!(p.can_jump(25, 15));
    }

    #[test]
    fn intent_merges_into_input() {
        let input = FrameInput { intent: DirectionIntent::Up, ..FrameInput::default() };
        assert!(input.wants_jump());
        assert!(!input.wants_left());
        let input = FrameInput { right: true, ..FrameInput::default() };
        assert!(input.wants_right());
    }
}
