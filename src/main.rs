/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LogConfig};
use sim::event::GameEvent;
use sim::level::load_room;
use sim::room::Registry;
use sim::rooms;
use sim::step;
use sim::world::WorldState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_tracing(&config.log);
    for w in &config.warnings {
        warn!(warning = %w, "config_warning");
    }

    let registry = rooms::catalog();
    if let Err(err) = registry.validate() {
        error!(error = %err, "room_catalog_invalid");
        eprintln!("Room catalog is invalid: {err}");
        std::process::exit(1);
    }

    let mut world = WorldState::new(config.play, registry.egg_total());
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut kb = InputState::new();
    // Release events only when the terminal can report them.
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false)
        && execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok();
    kb.honor_release = enhanced;
    info!(key_release = enhanced, "input_ready");

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &registry, &mut renderer, &mut kb, sound.as_ref(), &config);

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game_loop_failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Egg Room!");
    println!("Easter eggs: {}/{}", world.progress.eggs, world.egg_total);
}

/// Logs go to a file so they never tear the terminal UI.
fn init_tracing(log: &LogConfig) {
    let Some(path) = &log.file else { return };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Could not open log file {}: {e}", path.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .init();
}

fn game_loop(
    world: &mut WorldState,
    registry: &Registry,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(config.play.tick_rate_ms);

    load_room(world, registry, renderer, registry.start());
    let mut last_tick = Instant::now();

    loop {
        for (key, down) in kb.drain_events() {
            step::handle_key(world, key, down);
        }
        if kb.quit_requested() {
            info!(tick = world.tick, eggs = world.progress.eggs, "quit");
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            let events = step::step(world, registry, renderer);
            process_sound_events(sound, &events);
            renderer.canvas.fade();
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        if let GameEvent::Sound(cue) = event {
            sfx.play(cue);
        }
    }
}
