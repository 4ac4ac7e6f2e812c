/// WorldState: everything that changes while the game runs.
///
/// ## Ownership
///
///   - `entities`: arena of the current room's placed tiles. Drained on
///     every room load, so all live entities belong to `current_room`.
///   - `player`: singleton, survives room loads.
///   - `room_states`: one record per visited room, handed to that room's
///     hooks. Room definitions themselves never change.
///   - `progress`: playthrough-wide flags (eggs, key, door).
///
/// ## Deferred mutation
///
/// Collision handlers never tear entities down or switch rooms directly.
/// They push a [`Command`] instead; `step()` drains the queue once at the
/// start of the next tick, before anything else runs.

use std::collections::{HashMap, HashSet};

use crate::config::PlayConfig;
use crate::domain::entity::{Arena, EntityId, Player};
use crate::domain::rules::Controls;
use crate::domain::schedule::{Scheduler, WaitId};
use crate::domain::tile::{Plane, Rgb};
use super::event::GameEvent;
use super::melody::Melody;
use super::room::{EggSpec, FloorSpec, RoomId};
use super::stage::SpriteId;

/// Floor tint used by rooms that do not set their own.
pub const DEFAULT_FLOOR: Rgb = Rgb::WHITE;

// ── Entities ──

#[derive(Clone, Copy, Debug)]
pub enum EntityKind {
    Wall,
    Door { target: RoomId },
    Egg(EggSpec),
    /// `lit` marks a pad already flashed by a playing melody.
    Floor { spec: FloorSpec, lit: bool },
    LockedDoor,
}

impl EntityKind {
    pub fn plane(&self) -> Plane {
        match self {
            EntityKind::Wall => Plane::Wall,
            EntityKind::Door { .. } => Plane::Door,
            EntityKind::Egg(_) => Plane::Egg,
            EntityKind::Floor { .. } => Plane::Floor,
            EntityKind::LockedDoor => Plane::LockedDoor,
        }
    }

    /// Sprite color and alpha. Doors are invisible hit areas over the tint.
    pub fn appearance(&self) -> (Rgb, u8) {
        match self {
            EntityKind::Wall => (Rgb::BLACK, 255),
            EntityKind::Door { .. } => (Rgb::BLACK, 0),
            EntityKind::Egg(spec) => (spec.color, 255),
            EntityKind::Floor { spec, .. } => (spec.color, 255),
            EntityKind::LockedDoor => (Rgb(0x333333), 255),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub x: usize,
    pub y: usize,
    pub kind: EntityKind,
    pub sprite: SpriteId,
    /// Cleared when the entity is queued for deletion; inactive entities
    /// no longer answer overlap queries.
    pub active: bool,
}

// ── Commands and scheduled actions ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Despawn(EntityId),
    LoadRoom(RoomId),
}

/// Payloads carried by the tick scheduler.
#[derive(Clone, Copy, Debug)]
pub enum Action {
    Status(&'static str),
    MelodyStep { melody: &'static Melody, index: usize },
    MelodyFinale(&'static Melody),
    RestoreControl,
}

// ── Per-room and playthrough state ──

#[derive(Clone, Debug, Default)]
pub struct RoomState {
    /// Puzzle finished; solved key variants apply from the next load.
    pub solved: bool,
    /// Room-owned pending wait, cancelled when the room is left.
    pub wait: Option<WaitId>,
}

#[derive(Clone, Debug)]
pub struct Progress {
    /// Counting eggs picked up so far.
    pub eggs: u32,
    pub wester_egg: bool,
    pub collected: HashSet<&'static str>,
    pub door_locked: bool,
}

impl Default for Progress {
    fn default() -> Self {
        Progress { eggs: 0, wester_egg: false, collected: HashSet::new(), door_locked: true }
    }
}

/// Status message revealed a few characters per tick.
#[derive(Clone, Debug, Default)]
pub struct StatusLine {
    text: String,
    shown: usize,
}

impl StatusLine {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.shown = 0;
    }

    pub fn advance(&mut self, chars: usize) {
        self.shown = (self.shown + chars).min(self.text.chars().count());
    }

    pub fn visible(&self) -> &str {
        match self.text.char_indices().nth(self.shown) {
            Some((i, _)) => &self.text[..i],
            None => &self.text,
        }
    }

    #[allow(dead_code)]
    pub fn full(&self) -> &str {
        &self.text
    }
}

// ── Hook context ──

/// What room hooks, pickups and floor triggers may touch.
pub struct HookCtx<'a> {
    pub room: &'a mut RoomState,
    pub player: &'a mut Player,
    pub progress: &'a mut Progress,
    pub scheduler: &'a mut Scheduler<Action>,
    pub status: &'a mut StatusLine,
    pub floor_color: &'a mut Rgb,
    pub events: &'a mut Vec<GameEvent>,
}

impl HookCtx<'_> {
    pub fn say(&mut self, text: &'static str) {
        self.status.set(text);
    }

    pub fn play(&mut self, cue: &'static str) {
        self.events.push(GameEvent::Sound(cue));
    }

    /// Show `text` after `delay` ticks unless the room is left first.
    pub fn say_later(&mut self, delay: u32, text: &'static str) {
        if let Some(old) = self.room.wait.take() {
            self.scheduler.cancel(old);
        }
        self.room.wait = Some(self.scheduler.schedule(delay, Action::Status(text)));
    }

    /// Drop the room's pending wait, if any.
    pub fn cancel_wait(&mut self) {
        if let Some(id) = self.room.wait.take() {
            if self.scheduler.cancel(id) {
                tracing::debug!("room_wait_cancelled");
            }
        }
    }
}

// ── World ──

pub struct WorldState {
    pub width: usize,
    pub height: usize,
    pub entities: Arena<Entity>,
    pub player: Player,
    pub player_sprite: Option<SpriteId>,
    pub scheduler: Scheduler<Action>,
    pub commands: Vec<Command>,
    pub room_states: HashMap<RoomId, RoomState>,
    pub progress: Progress,
    /// `None` until the first room load.
    pub current_room: Option<RoomId>,
    pub floor_color: Rgb,
    pub play: PlayConfig,
    pub egg_total: u32,
    pub controls: Controls,
    pub status: StatusLine,
    /// Events produced since the last `step()` returned.
    pub events: Vec<GameEvent>,
    pub tick: u64,
}

impl WorldState {
    pub fn new(play: PlayConfig, egg_total: u32) -> Self {
        WorldState {
            width: 0,
            height: 0,
            entities: Arena::new(),
            player: Player::new(play.move_interval),
            player_sprite: None,
            scheduler: Scheduler::new(),
            commands: Vec::new(),
            room_states: HashMap::new(),
            progress: Progress::default(),
            current_room: None,
            floor_color: DEFAULT_FLOOR,
            play,
            egg_total,
            controls: Controls::default(),
            status: StatusLine::default(),
            events: Vec::new(),
            tick: 0,
        }
    }

    /// Split-borrow the world for a hook of `room`.
    pub fn hook_ctx(&mut self, room: RoomId) -> HookCtx<'_> {
        HookCtx {
            room: self.room_states.entry(room).or_default(),
            player: &mut self.player,
            progress: &mut self.progress,
            scheduler: &mut self.scheduler,
            status: &mut self.status,
            floor_color: &mut self.floor_color,
            events: &mut self.events,
        }
    }

    /// Queue a command for the start of the next tick. A newer room load
    /// replaces a pending one.
    pub fn request(&mut self, cmd: Command) {
        if let Command::LoadRoom(_) = cmd {
            self.commands.retain(|c| !matches!(c, Command::LoadRoom(_)));
        }
        self.commands.push(cmd);
    }

    /// Take an entity out of play now and delete it at the next drain.
    pub fn despawn_later(&mut self, id: EntityId) {
        if let Some(e) = self.entities.get_mut(id) {
            if e.active {
                e.active = false;
                self.request(Command::Despawn(id));
            }
        }
    }

    /// Active entities on (x, y), in placement order.
    pub fn overlapping(&self, x: usize, y: usize) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.active && e.x == x && e.y == y)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn room_state(&self, id: RoomId) -> RoomState {
        self.room_states.get(id).cloned().unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn pending_room(&self) -> Option<RoomId> {
        self.commands.iter().find_map(|c| match c {
            Command::LoadRoom(id) => Some(*id),
            Command::Despawn(_) => None,
        })
    }

    /// Victory text for the current tally.
    pub fn victory_message(&self) -> String {
        let mut msg = format!("You win! Easter eggs: {}/{}", self.progress.eggs, self.egg_total);
        if self.progress.wester_egg {
            msg.push_str(" (and a wester egg)");
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldState {
        WorldState::new(PlayConfig::default(), 3)
    }

    fn wall_at(w: &mut WorldState, x: usize, y: usize) -> EntityId {
        w.entities.insert(Entity { x, y, kind: EntityKind::Wall, sprite: SpriteId(0), active: true })
    }

    #[test]
    fn status_reveals_gradually() {
        let mut s = StatusLine::default();
        s.set("héllo");
        assert_eq!(s.visible(), "");
        s.advance(2);
        assert_eq!(s.visible(), "hé");
        s.advance(10);
        assert_eq!(s.visible(), "héllo");
        s.set("bye");
        assert_eq!(s.visible(), "");
        assert_eq!(s.full(), "bye");
    }

    #[test]
    fn newer_room_load_replaces_pending() {
        let mut w = world();
        let id = wall_at(&mut w, 0, 0);
        w.request(Command::LoadRoom("a"));
        w.despawn_later(id);
        w.request(Command::LoadRoom("b"));
        assert_eq!(w.commands, vec![Command::Despawn(id), Command::LoadRoom("b")]);
        assert_eq!(w.pending_room(), Some("b"));
    }

    #[test]
    fn despawn_later_queues_once_and_hides() {
        let mut w = world();
        let id = wall_at(&mut w, 2, 3);
        assert_eq!(w.overlapping(2, 3), vec![id]);
        w.despawn_later(id);
        w.despawn_later(id);
        assert_eq!(w.commands.len(), 1);
        assert!(w.overlapping(2, 3).is_empty());
        // Still in the arena until the queue is drained
        assert_eq!(w.entities.len(), 1);
    }

    #[test]
    fn overlap_query_keeps_placement_order() {
        let mut w = world();
        let a = wall_at(&mut w, 1, 1);
        wall_at(&mut w, 2, 1);
        let c = wall_at(&mut w, 1, 1);
        assert_eq!(w.overlapping(1, 1), vec![a, c]);
    }

    #[test]
    fn say_later_replaces_and_cancel_clears() {
        let mut w = world();
        let mut ctx = w.hook_ctx("room");
        ctx.say_later(5, "first");
        ctx.say_later(5, "second");
        assert_eq!(ctx.scheduler.len(), 1);
        ctx.cancel_wait();
        ctx.cancel_wait();
        assert_eq!(w.scheduler.len(), 0);
        assert!(w.room_state("room").wait.is_none());
    }

    #[test]
    fn victory_message_mentions_wester_egg() {
        let mut w = world();
        w.progress.eggs = 2;
        assert_eq!(w.victory_message(), "You win! Easter eggs: 2/3");
        w.progress.wester_egg = true;
        assert_eq!(w.victory_message(), "You win! Easter eggs: 2/3 (and a wester egg)");
    }

    #[test]
    fn progress_starts_locked() {
        let w = world();
        assert!(w.progress.door_locked);
        assert_eq!(w.progress.eggs, 0);
        assert!(w.current_room.is_none());
    }
}
