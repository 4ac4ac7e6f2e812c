/// Scripted note sequence played through the tick scheduler.
///
/// Timeline, in ticks after the trigger pad is walked on:
///   lead_in                       first note
///   lead_in + note_gap * i        note i (empty notes are rests)
///   last note + outro             pads removed, reward egg spawned
///   finale + settle               player control restored
///
/// Each step schedules the next one, so the chain runs entirely off the
/// scheduler and the player stays frozen until the final step.

use tracing::{debug, info};

use crate::domain::entity::EntityId;
use super::event::GameEvent;
use super::level;
use super::room::EggSpec;
use super::stage::Stage;
use super::world::{Action, EntityKind, HookCtx, WorldState};

#[derive(Debug)]
pub struct Melody {
    /// Cue names; `""` is a rest.
    pub notes: &'static [&'static str],
    pub lead_in: u32,
    pub note_gap: u32,
    pub outro: u32,
    pub settle: u32,
    pub trigger_cue: &'static str,
    pub reward: EggSpec,
    pub reward_at: (usize, usize),
    pub reward_message: &'static str,
}

/// Start the sequence. Called from a floor trigger.
pub fn begin(ctx: &mut HookCtx<'_>, melody: &'static Melody) {
    ctx.player.allow_movement = false;
    ctx.play(melody.trigger_cue);
    ctx.scheduler.schedule(melody.lead_in, Action::MelodyStep { melody, index: 0 });
    debug!(notes = melody.notes.len(), "melody_started");
}

/// Play note `index`, flash the leftmost pad not yet flashed, and queue
/// the next step.
pub fn play_step(world: &mut WorldState, stage: &mut dyn Stage, melody: &'static Melody, index: usize) {
    let Some(&note) = melody.notes.get(index) else { return };
    if !note.is_empty() {
        world.events.push(GameEvent::Sound(note));
        if let Some((x, y)) = light_leftmost_pad(world) {
            stage.flash(x, y);
        }
    }
    if index + 1 < melody.notes.len() {
        world.scheduler.schedule(melody.note_gap, Action::MelodyStep { melody, index: index + 1 });
    } else {
        world.scheduler.schedule(melody.outro, Action::MelodyFinale(melody));
    }
}

/// Remove every pad, spawn the reward and schedule control restore.
pub fn finish(world: &mut WorldState, stage: &mut dyn Stage, melody: &'static Melody) {
    let pads: Vec<_> = world.entities.iter()
        .filter(|(_, e)| matches!(e.kind, EntityKind::Floor { .. }))
        .map(|(id, _)| id)
        .collect();
    for id in pads {
        if let Some(e) = world.entities.remove(id) {
            stage.remove(e.sprite);
        }
    }

    if !world.progress.collected.contains(melody.reward.id) {
        let (x, y) = melody.reward_at;
        level::spawn(world, stage, EntityKind::Egg(melody.reward), x, y);
    }
    world.status.set(melody.reward_message);
    world.scheduler.schedule(melody.settle, Action::RestoreControl);
    info!(reward = melody.reward.id, "melody_finished");
}

fn light_leftmost_pad(world: &mut WorldState) -> Option<(usize, usize)> {
    let mut best: Option<(EntityId, usize)> = None;
    for (id, e) in world.entities.iter() {
        if let EntityKind::Floor { lit: false, .. } = e.kind {
            if best.map_or(true, |(_, bx)| e.x < bx) {
                best = Some((id, e.x));
            }
        }
    }
    let (id, _) = best?;
    let e = world.entities.get_mut(id)?;
    if let EntityKind::Floor { lit, .. } = &mut e.kind {
        *lit = true;
    }
    Some((e.x, e.y))
}
