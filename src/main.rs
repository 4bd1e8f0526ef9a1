/// Entry point and frame scheduler.
///
/// One loop drives everything: drain input, dispatch on the top of the
/// mode stack, step the simulation when Playing, translate emitted
/// events into sound cues and mode transitions, render, sleep to the
/// configured tick rate. The measured frame time feeds the drag-ability
/// cooldown.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::{self, LevelData};
use sim::progress::Progress;
use sim::step;
use sim::world::{Mode, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();
    let levels = level::builtin_levels();

    let mut world = WorldState::new();
    world.physics = config.physics.clone();
    world.drag_cfg = config.drag.clone();
    world.total_levels = levels.len();
    world.level_names = levels.iter().map(|l| l.name.clone()).collect();

    let mut progress = Progress::new();
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(
        &mut world,
        &levels,
        &mut progress,
        &mut renderer,
        sound.as_ref(),
        &config,
    );

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Dragfall!");
}

fn game_loop(
    world: &mut WorldState,
    levels: &[LevelData],
    progress: &mut Progress,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    let tick = Duration::from_millis(config.general.tick_rate_ms);
    let mut last_frame = Instant::now();

    loop {
        input.drain_events();
        let frame = input.frame_input();
        if frame.quit {
            break;
        }

        let dt = last_frame.elapsed().as_secs_f64();
        last_frame = Instant::now();

        match world.mode() {
            Mode::LevelSelect => {
                if handle_level_select(world, &frame, progress, levels, sound) {
                    break;
                }
            }
            Mode::Playing => {
                if frame.cancel_pressed() {
                    world.menu_cursor = 0;
                    world.push_mode(Mode::Paused);
                } else {
                    let events = step::step(world, &frame, dt);
                    apply_events(world, &events, progress, sound);
                }
            }
            Mode::Paused | Mode::LevelComplete | Mode::GameOver { .. } => {
                if handle_menu(world, &frame, levels, sound) {
                    break;
                }
            }
            Mode::GameComplete => {
                if frame.confirm_pressed() || frame.cancel_pressed() {
                    world.select_cursor = 0;
                    world.reset_modes(Mode::LevelSelect);
                }
            }
        }

        renderer.render(world, progress)?;

        let elapsed = last_frame.elapsed();
        if elapsed < tick {
            std::thread::sleep(tick - elapsed);
        }
    }

    Ok(())
}

/// Translate step events into sound cues and mode transitions.
fn apply_events(
    world: &mut WorldState,
    events: &[GameEvent],
    progress: &mut Progress,
    sound: Option<&SoundEngine>,
) {
    for event in events {
        if let Some(sfx) = sound {
            match event {
                GameEvent::Jump => sfx.play_jump(),
                GameEvent::Land => sfx.play_land(),
                GameEvent::Crush => sfx.play_crush(),
                GameEvent::DragStarted => sfx.play_click(),
                GameEvent::DoorsOpened | GameEvent::DoorsClosed => sfx.play_click(),
                GameEvent::PlayerKilled { .. } => sfx.play_over(),
                GameEvent::LevelCleared | GameEvent::GameCompleted => sfx.play_clear(),
                GameEvent::DragEnded => {}
            }
        }

        match event {
            GameEvent::PlayerKilled { error } => {
                world.menu_cursor = 0;
                world.push_mode(Mode::GameOver { error: *error });
            }
            GameEvent::LevelCleared => {
                progress.mark_completed(world.current_level);
                world.menu_cursor = 0;
                world.push_mode(Mode::LevelComplete);
            }
            GameEvent::GameCompleted => {
                progress.mark_completed(world.current_level);
                world.reset_modes(Mode::GameComplete);
            }
            _ => {}
        }
    }
}

/// Level-select screen. Returns true to quit the game.
fn handle_level_select(
    world: &mut WorldState,
    frame: &FrameInput,
    progress: &Progress,
    levels: &[LevelData],
    sound: Option<&SoundEngine>,
) -> bool {
    if world.total_levels == 0 {
        return true;
    }

    if frame.up_pressed() && world.select_cursor > 0 {
        world.select_cursor -= 1;
        click(sound);
    } else if frame.down_pressed() && world.select_cursor + 1 < world.total_levels {
        world.select_cursor += 1;
        click(sound);
    } else if frame.confirm_pressed() {
        if progress.is_unlocked(world.select_cursor) {
            level::load_level(world, world.select_cursor, levels);
            click(sound);
        }
    } else if frame.cancel_pressed() {
        return true;
    }
    false
}

/// Overlay menus (paused / level complete / game over). Returns true
/// to quit the game.
fn handle_menu(
    world: &mut WorldState,
    frame: &FrameInput,
    levels: &[LevelData],
    sound: Option<&SoundEngine>,
) -> bool {
    let mode = world.mode();
    let options = mode.menu_options();
    if options.is_empty() {
        return false;
    }

    if frame.up_pressed() {
        world.menu_cursor = (world.menu_cursor + options.len() - 1) % options.len();
        click(sound);
    } else if frame.down_pressed() {
        world.menu_cursor = (world.menu_cursor + 1) % options.len();
        click(sound);
    } else if frame.cancel_pressed() {
        match mode {
            Mode::Paused => world.pop_mode(),
            _ => {
                world.select_cursor = world.current_level;
                world.reset_modes(Mode::LevelSelect);
            }
        }
    } else if frame.confirm_pressed() {
        match options.get(world.menu_cursor).copied().unwrap_or("") {
            "Resume Game" => world.pop_mode(),
            "Restart Level" | "Replay Level" => {
                let idx = world.current_level;
                level::load_level(world, idx, levels);
            }
            "Next Level" => {
                let next = world.current_level + 1;
                level::load_level(world, next, levels);
            }
            "Level Select" => {
                world.select_cursor = world.current_level;
                world.reset_modes(Mode::LevelSelect);
            }
            "Quit Game" => return true,
            _ => {}
        }
    }
    false
}

fn click(sound: Option<&SoundEngine>) {
    if let Some(sfx) = sound {
        sfx.play_click();
    }
}
