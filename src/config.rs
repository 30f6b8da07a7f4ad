/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub gamepad: GamepadConfig,
    pub voice: VoiceConfig,
    pub stages_dir: PathBuf,
}

/// Simulation tuning. Distances are pixels, speeds pixels per frame,
/// durations frames unless the name says otherwise.
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    pub tick_rate_ms: u64,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_impulse: f32,
    pub jump_cooldown_frames: u64,
    pub walk_speed: f32,
    pub run_speed: f32,        // latched speed re-applied after each move
    pub velocity_decay: f32,
    pub stomp_bounce: f32,
    pub enemy_speed: f32,
    pub shooter_range: f32,
    pub shooter_cooldown: i32,
    pub bullet_speed: f32,
    pub scroll_border: f32,
    pub screen_width: f32,
    pub screen_height: f32,
    pub goal_reach: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub record: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

/// External speech classifier. Empty `command` disables voice input.
#[derive(Clone, Debug)]
pub struct VoiceConfig {
    pub command: Vec<String>,
    /// The command is killed and the answer read as None after this long.
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig { command: vec![], timeout_secs: default_voice_timeout() }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    voice: TomlVoice,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_max_fall")]
    max_fall_speed: f32,
    #[serde(default = "default_jump_impulse")]
    jump_impulse: f32,
    #[serde(default = "default_jump_cooldown")]
    jump_cooldown_frames: u64,
    #[serde(default = "default_walk_speed")]
    walk_speed: f32,
    #[serde(default = "default_run_speed")]
    run_speed: f32,
    #[serde(default = "default_velocity_decay")]
    velocity_decay: f32,
    #[serde(default = "default_stomp_bounce")]
    stomp_bounce: f32,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: f32,
    #[serde(default = "default_shooter_range")]
    shooter_range: f32,
    #[serde(default = "default_shooter_cooldown")]
    shooter_cooldown: i32,
    #[serde(default = "default_bullet_speed")]
    bullet_speed: f32,
    #[serde(default = "default_scroll_border")]
    scroll_border: f32,
    #[serde(default = "default_screen_size")]
    screen_width: f32,
    #[serde(default = "default_screen_size")]
    screen_height: f32,
    #[serde(default = "default_goal_reach")]
    goal_reach: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump_buttons")]
    jump: Vec<String>,
    #[serde(default = "default_record_buttons")]
    record: Vec<String>,
    #[serde(default = "default_restart_buttons")]
    restart: Vec<String>,
    #[serde(default = "default_quit_buttons")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlVoice {
    #[serde(default)]
    command: Vec<String>,
    #[serde(default = "default_voice_timeout")]
    timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_stages_dir")]
    stages_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }          // ~30 fps
fn default_gravity() -> f32 { 1.0 }
fn default_max_fall() -> f32 { 3.0 }
fn default_jump_impulse() -> f32 { -9.0 }
fn default_jump_cooldown() -> u64 { 15 }       // 0.5s at 30 fps
fn default_walk_speed() -> f32 { 2.0 }
fn default_run_speed() -> f32 { 3.0 }
fn default_velocity_decay() -> f32 { 0.8 }
fn default_stomp_bounce() -> f32 { -10.0 }
fn default_enemy_speed() -> f32 { 1.0 }
fn default_shooter_range() -> f32 { 60.0 }
fn default_shooter_cooldown() -> i32 { 60 }
fn default_bullet_speed() -> f32 { 1.0 }
fn default_scroll_border() -> f32 { 80.0 }
fn default_screen_size() -> f32 { 128.0 }
fn default_goal_reach() -> f32 { 6.0 }

fn default_voice_timeout() -> u64 { 8 }

fn default_jump_buttons() -> Vec<String> { vec!["A".into()] }
fn default_record_buttons() -> Vec<String> { vec!["X".into(), "R1".into()] }
fn default_restart_buttons() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_quit_buttons() -> Vec<String> { vec!["Select".into()] }
fn default_stages_dir() -> String { "stages".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            tick_rate_ms: default_tick_rate(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall(),
            jump_impulse: default_jump_impulse(),
            jump_cooldown_frames: default_jump_cooldown(),
            walk_speed: default_walk_speed(),
            run_speed: default_run_speed(),
            velocity_decay: default_velocity_decay(),
            stomp_bounce: default_stomp_bounce(),
            enemy_speed: default_enemy_speed(),
            shooter_range: default_shooter_range(),
            shooter_cooldown: default_shooter_cooldown(),
            bullet_speed: default_bullet_speed(),
            scroll_border: default_scroll_border(),
            screen_width: default_screen_size(),
            screen_height: default_screen_size(),
            goal_reach: default_goal_reach(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump_buttons(),
            record: default_record_buttons(),
            restart: default_restart_buttons(),
            quit: default_quit_buttons(),
        }
    }
}

impl Default for TomlVoice {
    fn default() -> Self {
        TomlVoice {
            command: vec![],
            timeout_secs: default_voice_timeout(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            stages_dir: default_stages_dir(),
        }
    }
}

impl From<TomlPhysics> for PhysicsConfig {
    fn from(t: TomlPhysics) -> Self {
        PhysicsConfig {
            tick_rate_ms: t.tick_rate_ms,
            gravity: t.gravity,
            max_fall_speed: t.max_fall_speed,
            jump_impulse: t.jump_impulse,
            jump_cooldown_frames: t.jump_cooldown_frames,
            walk_speed: t.walk_speed,
            run_speed: t.run_speed,
            velocity_decay: t.velocity_decay,
            stomp_bounce: t.stomp_bounce,
            enemy_speed: t.enemy_speed,
            shooter_range: t.shooter_range,
            shooter_cooldown: t.shooter_cooldown,
            bullet_speed: t.bullet_speed,
            scroll_border: t.scroll_border,
            screen_width: t.screen_width,
            screen_height: t.screen_height,
            goal_reach: t.goal_reach,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        TomlPhysics::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let stages_dir_str = &toml_cfg.general.stages_dir;
        let stages_dir = if PathBuf::from(stages_dir_str).is_absolute() {
            PathBuf::from(stages_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(stages_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(stages_dir_str))
        };

        GameConfig {
            physics: toml_cfg.physics.into(),
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                record: toml_cfg.gamepad.record,
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
            voice: VoiceConfig {
                command: toml_cfg.voice.command,
                timeout_secs: toml_cfg.voice.timeout_secs,
            },
            stages_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds data next to the real one.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/tilejumper");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/tilejumper");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => return parse_toml(&text, &path.display().to_string()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config");
            }
        }
    }
    tracing::info!("no config.toml found, using defaults");
    TomlConfig::default()
}

fn parse_toml(text: &str, origin: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => {
            tracing::info!(path = origin, "loaded config");
            cfg
        }
        Err(e) => {
            tracing::warn!(path = origin, error = %e, "config parse error, using defaults");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse_toml("", "test");
        let physics: PhysicsConfig = cfg.physics.into();
        assert_eq!(physics.jump_impulse, -9.0);
        assert_eq!(physics.jump_cooldown_frames, 15);
        assert_eq!(physics.screen_height, 128.0);
        assert_eq!(cfg.general.stages_dir, "stages");
        assert!(cfg.voice.command.is_empty());
        assert_eq!(cfg.voice.timeout_secs, 8);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = parse_toml("[physics]\nscroll_border = 64.0\n", "test");
        let physics: PhysicsConfig = cfg.physics.into();
        assert_eq!(physics.scroll_border, 64.0);
        assert_eq!(physics.goal_reach, 6.0);
        assert_eq!(physics.shooter_cooldown, 60);
    }

    #[test]
    fn voice_command_is_read() {
        let cfg = parse_toml("[voice]\ncommand = [\"python3\", \"listen.py\"]\n", "test");
        assert_eq!(cfg.voice.command, vec!["python3".to_string(), "listen.py".to_string()]);
        assert_eq!(cfg.voice.timeout_secs, 8);
        let cfg = parse_toml("[voice]\ntimeout_secs = 3\n", "test");
        assert_eq!(cfg.voice.timeout_secs, 3);
    }

    #[test]
    fn malformed_file_falls_back() {
        let cfg = parse_toml("[physics\ngravity = ", "test");
        assert_eq!(cfg.physics.gravity, 1.0);
        assert_eq!(cfg.gamepad.jump, vec!["A".to_string()]);
    }

    #[test]
    fn absolute_stages_dir_is_kept() {
        let mut cfg = TomlConfig::default();
        cfg.general.stages_dir = "/opt/tilejumper/stages".into();
        let resolved = GameConfig::resolve(cfg, &[PathBuf::from(".")]);
        assert_eq!(resolved.stages_dir, PathBuf::from("/opt/tilejumper/stages"));
    }
}
