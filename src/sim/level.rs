/// Room loader and entity placement.
///
/// ## Load sequence
///   1. Disarm door collision (no instant re-trigger of the entry door)
///   2. Previous room's `on_exit`
///   3. Tear down every entity sprite and the player sprite
///   4. Resize the stage
///   5. New room's `pre_place`
///   6. Place every cell in row-major order
///   7. Apply the room's move interval, run `on_enter`
///   8. Record the room as current
///
/// ## Player placement
///   First load ever: at the room's player start.
///   Every later load: on the door that leads back to the room just
///   left, so the player appears where they came from.

use tracing::{debug, info};

use crate::domain::entity::EntityId;
use crate::domain::tile::{Plane, Rgb};
use super::event::GameEvent;
use super::room::{Registry, RoomDef, RoomId, TileSpec};
use super::stage::Stage;
use super::world::{Command, Entity, EntityKind, WorldState};

/// Player sprite color.
pub const PLAYER_COLOR: Rgb = Rgb(0xA1C93A);

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Switch the world to room `id`.
///
/// Panics if `id` is not registered.
pub fn load_room(world: &mut WorldState, registry: &Registry, stage: &mut dyn Stage, id: RoomId) {
    let room = registry.get(id);
    let previous = world.current_room;

    world.player.door_collision = false;

    if let Some(prev) = previous {
        if let Some(on_exit) = registry.get(prev).on_exit {
            on_exit(&mut world.hook_ctx(prev));
        }
    }

    teardown(world, stage);

    world.width = room.width;
    world.height = room.height;
    stage.resize(room.width, room.height);

    if let Some(pre_place) = room.pre_place {
        pre_place(&mut world.hook_ctx(room.id));
    }

    let placed = place_room(world, stage, room, previous);
    if !placed {
        match previous {
            Some(prev) => panic!("room '{}' has no door back to '{prev}'", room.id),
            None => panic!("room '{}' has no player start", room.id),
        }
    }

    world.player.move_interval = room.move_interval.unwrap_or(world.play.move_interval);
    world.player.move_counter = 0;

    if let Some(on_enter) = room.on_enter {
        on_enter(&mut world.hook_ctx(room.id));
    }

    world.current_room = Some(room.id);
    world.events.push(GameEvent::RoomEntered(room.id));
    info!(
        room = room.id,
        from = previous.unwrap_or("-"),
        entities = world.entities.len(),
        "room_loaded"
    );
}

/// Place one tile at (x, y). The cell is tinted with the current floor
/// color first; entities draw over it.
pub fn place(world: &mut WorldState, stage: &mut dyn Stage, tile: TileSpec, x: usize, y: usize) {
    stage.tint(x, y, world.floor_color);
    match tile {
        TileSpec::Empty => {}
        TileSpec::PlayerStart => place_player(world, stage, x, y),
        TileSpec::Wall => {
            spawn(world, stage, EntityKind::Wall, x, y);
        }
        TileSpec::Door { target, .. } => {
            spawn(world, stage, EntityKind::Door { target }, x, y);
        }
        TileSpec::LockedDoor => {
            if world.progress.door_locked {
                spawn(world, stage, EntityKind::LockedDoor, x, y);
            }
        }
        TileSpec::Egg(spec) => {
            if !world.progress.collected.contains(spec.id) {
                spawn(world, stage, EntityKind::Egg(spec), x, y);
            }
        }
        TileSpec::Floor(spec) => {
            spawn(world, stage, EntityKind::Floor { spec, lit: false }, x, y);
        }
    }
}

/// Create an entity and its sprite.
pub fn spawn(world: &mut WorldState, stage: &mut dyn Stage, kind: EntityKind, x: usize, y: usize) -> EntityId {
    let (color, alpha) = kind.appearance();
    let sprite = stage.spawn(kind.plane(), x, y, color, alpha);
    world.entities.insert(Entity { x, y, kind, sprite, active: true })
}

/// Put the player on (x, y) at rest and (re)create its sprite.
pub fn place_player(world: &mut WorldState, stage: &mut dyn Stage, x: usize, y: usize) {
    world.player.place(x, y);
    if let Some(old) = world.player_sprite.take() {
        stage.remove(old);
    }
    world.player_sprite = Some(stage.spawn(Plane::Player, x, y, PLAYER_COLOR, 255));
}

// ══════════════════════════════════════════════════════════════
// Internals
// ══════════════════════════════════════════════════════════════

fn teardown(world: &mut WorldState, stage: &mut dyn Stage) {
    if let Some(sprite) = world.player_sprite.take() {
        stage.remove(sprite);
    }
    let removed = world.entities.drain();
    for e in &removed {
        stage.remove(e.sprite);
    }
    // Queued despawns refer to the drained arena
    world.commands.retain(|c| !matches!(c, Command::Despawn(_)));
    debug!(count = removed.len(), "room_torn_down");
}

/// Place every cell. Returns whether the player was placed.
fn place_room(world: &mut WorldState, stage: &mut dyn Stage, room: &RoomDef, previous: Option<RoomId>) -> bool {
    let solved = world.room_state(room.id).solved;
    let mut player_placed = false;
    for y in 0..room.height {
        for x in 0..room.width {
            let tile = room.tile_at(x, y, solved);
            match (previous, tile) {
                (Some(_), TileSpec::PlayerStart) => {
                    stage.tint(x, y, world.floor_color);
                    continue;
                }
                (None, TileSpec::PlayerStart) => player_placed = true,
                (Some(prev), TileSpec::Door { target, .. }) if target == prev && !player_placed => {
                    place_player(world, stage, x, y);
                    player_placed = true;
                }
                _ => {}
            }
            place(world, stage, tile, x, y);
        }
    }
    player_placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayConfig;
    use crate::sim::rooms;
    use crate::sim::stage::testing::RecordingStage;
    use crate::sim::room::KeyEntry;
    use crate::sim::world::HookCtx;
    use crate::domain::tile::Dir;

    fn setup() -> (WorldState, Registry, RecordingStage) {
        let registry = rooms::catalog();
        let world = WorldState::new(PlayConfig::default(), registry.egg_total());
        (world, registry, RecordingStage::new())
    }

    /// Non-empty, non-start cells still to be placed, plus the player.
    fn expected_sprites(world: &WorldState, room: &RoomDef) -> usize {
        let solved = world.room_state(room.id).solved;
        let mut n = 1;
        for y in 0..room.height {
            for x in 0..room.width {
                n += match room.tile_at(x, y, solved) {
                    TileSpec::Empty | TileSpec::PlayerStart => 0,
                    TileSpec::Egg(spec) if world.progress.collected.contains(spec.id) => 0,
                    TileSpec::LockedDoor if !world.progress.door_locked => 0,
                    _ => 1,
                };
            }
        }
        n
    }

    #[test]
    fn first_load_places_player_start() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "start");
        assert_eq!(world.current_room, Some("start"));
        assert_eq!((world.player.x, world.player.y), (2, 1));
        assert!(stage.has(Plane::Player, 2, 1));
        assert!(stage.has(Plane::LockedDoor, 2, 0));
        assert_eq!((stage.width, stage.height), (5, 7));
        assert_eq!(world.events, vec![GameEvent::RoomEntered("start")]);
    }

    #[test]
    fn entity_count_matches_layout_for_every_room() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "start");
        // Walk the catalog along its doors so every load has a return door
        let route = ["hall", "east_nook", "hall", "west_nook", "hall", "big_room",
                     "music_room", "big_room", "slippy", "vault", "slippy"];
        for id in route {
            load_room(&mut world, &registry, &mut stage, id);
            let room = registry.get(id);
            assert_eq!(stage.sprites.len(), expected_sprites(&world, room), "room {id}");
            assert_eq!(world.entities.len() + 1, stage.sprites.len(), "room {id}");
            assert_eq!(stage.count(Plane::Player), 1);
        }
    }

    #[test]
    fn re_entry_places_player_on_return_door() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "start");
        load_room(&mut world, &registry, &mut stage, "hall");
        assert_eq!((world.player.x, world.player.y), (4, 0));
        load_room(&mut world, &registry, &mut stage, "start");
        // On start's door to the hall, not on its player start
        assert_eq!((world.player.x, world.player.y), (2, 6));
        assert!(stage.has(Plane::Door, 2, 6));
        assert!(!stage.has(Plane::Player, 2, 1));
        assert_eq!(stage.tints.get(&(2, 1)), Some(&Rgb::WHITE));
    }

    #[test]
    fn load_disarms_door_collision_and_stops_player() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "start");
        world.player.door_collision = true;
        world.player.dir = Dir::DOWN;
        load_room(&mut world, &registry, &mut stage, "hall");
        assert!(!world.player.door_collision);
        assert!(world.player.dir.is_zero());
    }

    #[test]
    fn collected_eggs_are_not_placed_again() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "start");
        load_room(&mut world, &registry, &mut stage, "hall");
        load_room(&mut world, &registry, &mut stage, "east_nook");
        assert_eq!(stage.count(Plane::Egg), 1);
        world.progress.collected.insert("easter");
        load_room(&mut world, &registry, &mut stage, "hall");
        load_room(&mut world, &registry, &mut stage, "east_nook");
        assert_eq!(stage.count(Plane::Egg), 0);
    }

    #[test]
    fn unlocked_door_is_not_placed_again() {
        let (mut world, registry, mut stage) = setup();
        world.progress.door_locked = false;
        load_room(&mut world, &registry, &mut stage, "start");
        assert_eq!(stage.count(Plane::LockedDoor), 0);
    }

    #[test]
    fn slippy_room_hooks_and_interval() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "start");
        for id in ["hall", "big_room", "slippy"] {
            load_room(&mut world, &registry, &mut stage, id);
        }
        assert!(world.player.slippery);
        assert_eq!(world.player.move_interval, 1);
        assert_eq!(stage.tints.get(&(1, 1)), Some(&Rgb(0x77EEFF)));
        // big_room's delayed message was cancelled on exit; slippy's is pending
        assert_eq!(world.scheduler.len(), 1);

        load_room(&mut world, &registry, &mut stage, "big_room");
        assert!(!world.player.slippery);
        assert_eq!(world.player.move_interval, PlayConfig::default().move_interval);
        assert_eq!(stage.tints.get(&(1, 1)), Some(&Rgb::WHITE));
        assert_eq!(world.scheduler.len(), 1);
    }

    #[test]
    fn solved_room_uses_variant_tiles() {
        let (mut world, registry, mut stage) = setup();
        world.room_states.entry("music_room").or_default().solved = true;
        load_room(&mut world, &registry, &mut stage, "start");
        for id in ["hall", "big_room", "music_room"] {
            load_room(&mut world, &registry, &mut stage, id);
        }
        let trigger = world.entities.iter()
            .find(|(_, e)| (e.x, e.y) == (7, 4))
            .map(|(_, e)| e.kind);
        match trigger {
            Some(EntityKind::Floor { spec, .. }) => assert_eq!(spec.color, Rgb(0xA1C93A)),
            other => panic!("expected a floor pad, got {other:?}"),
        }
    }

    #[test]
    fn queued_despawns_are_dropped_on_teardown() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "start");
        let (id, _) = world.entities.iter().next().expect("start has walls");
        world.despawn_later(id);
        load_room(&mut world, &registry, &mut stage, "hall");
        assert!(world.commands.is_empty());
    }

    fn mark_exit(ctx: &mut HookCtx<'_>) {
        ctx.say("left");
    }

    static HOOKED: [RoomDef; 2] = [
        RoomDef {
            id: "a", width: 3, height: 1, layout: &["@.>"],
            key: &[
                KeyEntry::new('@', TileSpec::PlayerStart),
                KeyEntry::new('.', TileSpec::Empty),
                KeyEntry::new('>', TileSpec::Door {
                    dir: Dir::RIGHT, target: "b",
                }),
            ],
            move_interval: None, pre_place: None, on_enter: None, on_exit: Some(mark_exit),
        },
        RoomDef {
            id: "b", width: 1, height: 1, layout: &["<"],
            key: &[KeyEntry::new('<', TileSpec::Door {
                dir: Dir::LEFT, target: "a",
            })],
            move_interval: Some(7), pre_place: None, on_enter: None, on_exit: None,
        },
    ];

    #[test]
    fn exit_hook_runs_before_teardown() {
        let registry = Registry::new("a", &HOOKED, 0);
        let mut world = WorldState::new(PlayConfig::default(), 0);
        let mut stage = RecordingStage::new();
        load_room(&mut world, &registry, &mut stage, "a");
        load_room(&mut world, &registry, &mut stage, "b");
        assert_eq!(world.status.full(), "left");
        assert_eq!(world.player.move_interval, 7);
        assert_eq!((world.player.x, world.player.y), (0, 0));
    }

    #[test]
    #[should_panic(expected = "unknown room")]
    fn unknown_room_is_fatal() {
        let (mut world, registry, mut stage) = setup();
        load_room(&mut world, &registry, &mut stage, "attic");
    }
}
