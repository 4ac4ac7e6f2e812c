/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Command queue (deferred despawns, then at most one room load)
///   2. Scheduler actions due this tick
///   3. Player update (buffered input, move gate, move, collisions)
///   4. Status typewriter
///
/// Collision handlers only mark and request. Nothing they queue takes
/// effect before step 1 of the next tick, so dispatch never sees a
/// half-torn-down room.

use tracing::{debug, info, trace};

use crate::domain::entity::EntityId;
use crate::domain::rules::{self, control_for, key_direction};
use crate::domain::tile::Dir;
use super::event::GameEvent;
use super::level;
use super::melody;
use super::room::Registry;
use super::stage::Stage;
use super::world::{Action, Command, EntityKind, WorldState};

/// Outcome of touching one entity.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Contact {
    Pass,
    /// Undo the move and stop.
    Bounce,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, registry: &Registry, stage: &mut dyn Stage) -> Vec<GameEvent> {
    world.tick += 1;

    drain_commands(world, registry, stage);

    for action in world.scheduler.tick() {
        run_action(world, stage, action);
    }

    update_player(world, stage);

    world.status.advance(world.play.status_chars_per_tick);

    std::mem::take(&mut world.events)
}

/// Feed one raw key transition. Key codes follow `domain::rules`.
pub fn handle_key(world: &mut WorldState, key: i32, down: bool) {
    if let Some(control) = control_for(key) {
        world.controls.set(control, down);
    }
    if !down || !world.player.slippery {
        return;
    }
    let Some(dir) = key_direction(key) else { return };
    if world.player.dir.is_zero() {
        world.player.dir = dir;
    } else {
        // Still sliding: hold the press until the player comes to rest
        world.player.buffer_key(key, world.play.input_buffer_ticks);
    }
}

// ══════════════════════════════════════════════════════════════
// Command queue
// ══════════════════════════════════════════════════════════════

fn drain_commands(world: &mut WorldState, registry: &Registry, stage: &mut dyn Stage) {
    if world.commands.is_empty() { return; }
    let commands = std::mem::take(&mut world.commands);

    for cmd in &commands {
        if let Command::Despawn(id) = cmd {
            if let Some(e) = world.entities.remove(*id) {
                stage.remove(e.sprite);
            }
        }
    }

    let load = commands.iter().rev().find_map(|c| match c {
        Command::LoadRoom(id) => Some(*id),
        Command::Despawn(_) => None,
    });
    if let Some(id) = load {
        debug!(room = id, tick = world.tick, "room_transition");
        level::load_room(world, registry, stage, id);
    }
}

fn run_action(world: &mut WorldState, stage: &mut dyn Stage, action: Action) {
    trace!(?action, tick = world.tick, "scheduled_action");
    match action {
        Action::Status(text) => world.status.set(text),
        Action::MelodyStep { melody, index } => melody::play_step(world, stage, melody, index),
        Action::MelodyFinale(melody) => melody::finish(world, stage, melody),
        Action::RestoreControl => world.player.allow_movement = true,
    }
}

// ══════════════════════════════════════════════════════════════
// Player controller
// ══════════════════════════════════════════════════════════════

fn update_player(world: &mut WorldState, stage: &mut dyn Stage) {
    resolve_buffer(world);

    let p = &mut world.player;
    p.move_counter += 1;
    if !p.allow_movement || p.move_counter < p.move_interval {
        return;
    }
    p.move_counter = 0;

    if !p.slippery {
        p.dir = world.controls.direction();
    }
    try_move(world, stage);
}

/// Apply the buffered key once the player is at rest, otherwise let it age.
fn resolve_buffer(world: &mut WorldState) {
    let p = &mut world.player;
    let Some(buffered) = p.buffer else { return };
    if p.slippery && p.dir.is_zero() {
        if let Some(dir) = key_direction(buffered.key) {
            p.dir = dir;
        }
        p.buffer = None;
    } else {
        p.age_buffer();
    }
}

/// One-cell move attempt along the player's direction.
fn try_move(world: &mut WorldState, stage: &mut dyn Stage) {
    let dir = world.player.dir;
    if dir.is_zero() { return; }

    let (ox, oy) = (world.player.x, world.player.y);
    let Some((tx, ty)) = rules::step_target(ox, oy, dir, world.width, world.height) else {
        world.player.dir = Dir::ZERO;
        return;
    };

    // Doors only fire if the player had already moved before this step
    let armed = world.player.door_collision;
    world.player.x = tx;
    world.player.y = ty;

    let mut bounced = false;
    for id in world.overlapping(tx, ty) {
        if collide(world, id, armed) == Contact::Bounce {
            bounced = true;
        }
    }

    if bounced {
        world.player.x = ox;
        world.player.y = oy;
        world.player.dir = Dir::ZERO;
        world.events.push(GameEvent::Bumped { x: tx, y: ty });
        debug!(x = tx, y = ty, "bounced");
        return;
    }

    world.player.door_collision = true;
    if let Some(sprite) = world.player_sprite {
        stage.move_to(sprite, tx, ty);
    }
}

// ══════════════════════════════════════════════════════════════
// Collision dispatch
// ══════════════════════════════════════════════════════════════

fn collide(world: &mut WorldState, id: EntityId, armed: bool) -> Contact {
    let Some(entity) = world.entities.get(id) else { return Contact::Pass };
    if !entity.active { return Contact::Pass; }
    let (x, y, kind) = (entity.x, entity.y, entity.kind);

    match kind {
        EntityKind::Wall => Contact::Bounce,
        EntityKind::Door { target } => {
            if armed {
                world.request(Command::LoadRoom(target));
                world.events.push(GameEvent::DoorTaken { target });
            }
            Contact::Pass
        }
        EntityKind::Egg(spec) => {
            world.despawn_later(id);
            if spec.counts {
                world.progress.eggs += 1;
            }
            world.progress.collected.insert(spec.id);
            if let Some(room) = world.current_room {
                (spec.pickup)(&mut world.hook_ctx(room));
            }
            world.events.push(GameEvent::EggCollected { id: spec.id, x, y });
            info!(egg = spec.id, eggs = world.progress.eggs, "egg_collected");
            Contact::Pass
        }
        EntityKind::Floor { spec, .. } => {
            if let Some(room) = world.current_room {
                (spec.on_walked)(&mut world.hook_ctx(room));
            }
            world.events.push(GameEvent::FloorWalked { x, y });
            Contact::Pass
        }
        EntityKind::LockedDoor => {
            if world.player.has_key {
                unlock(world, id);
            }
            // Bounces even when it just opened; movement is frozen anyway
            Contact::Bounce
        }
    }
}

fn unlock(world: &mut WorldState, id: EntityId) {
    world.progress.door_locked = false;
    world.despawn_later(id);
    world.player.allow_movement = false;
    let message = world.victory_message();
    world.status.set(message);
    world.events.push(GameEvent::Unlocked { eggs: world.progress.eggs });
    info!(eggs = world.progress.eggs, wester_egg = world.progress.wester_egg, "door_unlocked");
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
