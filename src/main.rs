/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::GameConfig;
use domain::controls::ControlSnapshot;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() -> Result<()> {
    let _log_guard = setup_logging()?;

    let config = GameConfig::load();
    let mut world = WorldState::new(config);

    let mut renderer = Renderer::new();
    let enhanced_keys = renderer.init().context("terminal init failed")?;

    let mut sound = SoundEngine::new(&world.config.audio);
    if let Some(s) = sound.as_mut() {
        s.start_music();
    }

    let result = game_loop(&mut world, &mut renderer, sound.as_mut(), enhanced_keys);

    if let Err(e) = renderer.cleanup() {
        tracing::error!(error = %e, "terminal cleanup failed");
        eprintln!("Terminal cleanup failed: {e}");
    }

    result?;
    tracing::info!(ticks = world.tick, "exiting");
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    enhanced_keys: bool,
) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced_keys;
    let mut gp = GamepadState::new(&world.config.gamepad);
    tracing::info!(connected = gp.connected, "gamepad");
    let frame_budget = Duration::from_secs_f64(1.0 / f64::from(world.config.frame_limit));
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        let dt = frame_start.duration_since(last_frame).as_secs_f32();
        last_frame = frame_start;

        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            tracing::info!("ctrl-c");
            return Ok(());
        }

        let mut controls = ControlSnapshot::new();
        kb.fill(&mut controls);
        gp.fill(&mut controls);

        let out = step::step(world, &controls, dt);
        if let Some(s) = sound.as_deref_mut() {
            s.process(&out.audio);
        }
        if out.quit {
            tracing::info!("exit requested");
            return Ok(());
        }

        renderer.render(&out.draws, &world.config)?;

        if let Some(rest) = frame_budget.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

/// File logging only; stdout belongs to the renderer.
/// `DUEL_LOG` sets the filter (default `info`), `DUEL_LOG_DIR` the directory.
fn setup_logging() -> Result<WorkerGuard> {
    let log_dir = std::env::var_os("DUEL_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("logs"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("could not create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "duel.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_env("DUEL_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/duel.log", log_dir.display());
    Ok(guard)
}
