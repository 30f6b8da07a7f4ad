/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::entity::DirectionIntent;
use sim::controller::StageController;
use sim::level;
use ui::gamepad::GamepadState;
use ui::input::{Actions, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;
use ui::voice::{self, DirectionClassifier};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "tilejumper.log";

fn main() {
    init_tracing();

    let config = GameConfig::load();
    let stages = level::stage_list(&config);
    let mut controller = StageController::new(stages, config.physics.clone());
    let mut classifier = voice::from_config(&config.voice);
    let mut renderer = Renderer::new(config.physics.tick_rate_ms, classifier.is_enabled());

    let honor_release = match init_terminal(&mut renderer) {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e:#}");
            return;
        }
    };

    let sound = SoundEngine::new();
    if sound.is_none() {
        warn!("no audio output, playing silently");
    }

    let result = game_loop(
        &mut controller,
        &mut renderer,
        classifier.as_mut(),
        sound.as_ref(),
        &config,
        honor_release,
    );

    if honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => info!(stage = controller.state.stage_index, "quit"),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "game loop failed");
            eprintln!("Game error: {e:#}");
        }
    }
}

/// Logs go to a file because the terminal is in raw alternate-screen mode.
fn init_tracing() {
    let writer = match File::create(LOG_FILE) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(io::sink),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

/// Raw mode and alternate screen; returns whether key release events
/// will be reported.
fn init_terminal(renderer: &mut Renderer) -> Result<bool> {
    renderer.init().context("entering raw alternate screen")?;
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .context("enabling key release reporting")?;
    }
    info!(key_release = enhanced, "terminal ready");
    Ok(enhanced)
}

fn game_loop(
    controller: &mut StageController,
    renderer: &mut Renderer,
    classifier: &mut dyn DirectionClassifier,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }

    let tick_rate = Duration::from_millis(config.physics.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut pending = Actions::default();

    loop {
        kb.drain_events();
        gp.update();
        pending = pending.merge(Actions::read(&kb, &gp));

        if pending.quit {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            let actions = std::mem::take(&mut pending);

            // Blocks the loop until the classifier answers.
            let intent = if actions.record {
                classifier.classify()
            } else {
                DirectionIntent::None
            };

            let events = controller.tick(actions.frame_input(intent));
            if let Some(sfx) = sound {
                sfx.play_events(&events);
            }
            last_tick = Instant::now();
        }

        renderer.render(&controller.state).context("drawing frame")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
