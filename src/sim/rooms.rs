/// The compiled-in room catalog.
///
/// ## Map
///
///   start ── hall ─┬─ east_nook   (easter egg)
///                  ├─ west_nook   (wester egg, does not count)
///                  └─ big_room ─┬─ music_room  (melody puzzle, reward egg)
///                               └─ slippy ── vault  (golden egg, holds the key)
///
/// ## Shared symbols
///   '#' = Wall        '.' = Empty       '@' = Player start
///   'n' 's' 'e' 'w'   = Doors through the north/south/east/west edge
///   'o' = Egg         'L' = Locked door
///
/// The key opens the locked door in the start room; three counting eggs
/// exist in a full playthrough.

use crate::domain::tile::{Dir, Rgb};
use super::melody::{self, Melody};
use super::room::{EggSpec, FloorSpec, Hook, KeyEntry, Registry, RoomDef, RoomId, TileSpec};
use super::world::{HookCtx, DEFAULT_FLOOR};

/// Counting eggs: easter, melody reward, golden.
pub const EGG_TOTAL: u32 = 3;

pub const SLIPPY_FLOOR: Rgb = Rgb(0x77EEFF);

pub fn catalog() -> Registry {
    Registry::new("start", &ROOMS, EGG_TOTAL)
}

const WALL: KeyEntry = KeyEntry::new('#', TileSpec::Wall);
const EMPTY: KeyEntry = KeyEntry::new('.', TileSpec::Empty);

const fn door(symbol: char, dir: Dir, target: RoomId) -> KeyEntry {
    KeyEntry::new(symbol, TileSpec::Door { dir, target })
}

const fn egg(id: &'static str, color: Rgb, counts: bool, pickup: Hook) -> EggSpec {
    EggSpec { id, color, counts, pickup }
}

const fn pad(symbol: char, color: u32, on_walked: Hook) -> KeyEntry {
    KeyEntry::new(symbol, TileSpec::Floor(FloorSpec { color: Rgb(color), on_walked }))
}

static ROOMS: [RoomDef; 8] = [
    RoomDef {
        id: "start",
        width: 5,
        height: 7,
        layout: &[
            "##L##",
            "#.@.#",
            "#...#",
            "#...#",
            "#...#",
            "#...#",
            "##s##",
        ],
        key: &[
            WALL, EMPTY,
            KeyEntry::new('@', TileSpec::PlayerStart),
            KeyEntry::new('L', TileSpec::LockedDoor),
            door('s', Dir::DOWN, "hall"),
        ],
        move_interval: None,
        pre_place: None,
        on_enter: Some(start_enter),
        on_exit: None,
    },
    RoomDef {
        id: "hall",
        width: 9,
        height: 10,
        layout: &[
            "####n####",
            "#.......#",
            "#.......#",
            "#.......#",
            "w.......#",
            "#.......#",
            "#.......#",
            "#.......e",
            "#.......#",
            "##s######",
        ],
        key: &[
            WALL, EMPTY,
            door('n', Dir::UP, "start"),
            door('e', Dir::RIGHT, "east_nook"),
            door('w', Dir::LEFT, "west_nook"),
            door('s', Dir::DOWN, "big_room"),
        ],
        move_interval: None,
        pre_place: None,
        on_enter: Some(hall_enter),
        on_exit: None,
    },
    RoomDef {
        id: "east_nook",
        width: 16,
        height: 6,
        layout: &[
            "################",
            "#..............#",
            "#.............o#",
            "#..............#",
            "w..............#",
            "################",
        ],
        key: &[
            WALL, EMPTY,
            KeyEntry::new('o', TileSpec::Egg(EASTER_EGG)),
            door('w', Dir::LEFT, "hall"),
        ],
        move_interval: None,
        pre_place: None,
        on_enter: Some(east_nook_enter),
        on_exit: None,
    },
    RoomDef {
        id: "west_nook",
        width: 16,
        height: 6,
        layout: &[
            "################",
            "#..............e",
            "#..............#",
            "#o.............#",
            "#..............#",
            "################",
        ],
        key: &[
            WALL, EMPTY,
            KeyEntry::new('o', TileSpec::Egg(WESTER_EGG)),
            door('e', Dir::RIGHT, "hall"),
        ],
        move_interval: None,
        pre_place: None,
        on_enter: Some(west_nook_enter),
        on_exit: None,
    },
    RoomDef {
        id: "big_room",
        width: 16,
        height: 16,
        layout: &[
            "##n#############",
            "#..#...........#",
            "#..#........#..#",
            "#..#........#..#",
            "#..#........#..#",
            "#..#........#..#",
            "#..#........#..#",
            "#..#........#..#",
            "#..#........#..e",
            "#..#........#..#",
            "#..#........#..#",
            "#..#........#..#",
            "#..............#",
            "#############..#",
            "#..............#",
            "#######s########",
        ],
        key: &[
            WALL, EMPTY,
            door('n', Dir::UP, "hall"),
            door('e', Dir::RIGHT, "music_room"),
            door('s', Dir::DOWN, "slippy"),
        ],
        move_interval: None,
        pre_place: None,
        on_enter: Some(big_room_enter),
        on_exit: Some(leave_cancelling_wait),
    },
    RoomDef {
        id: "music_room",
        width: 10,
        height: 10,
        layout: &[
            "##########",
            "#.a......#",
            "#........#",
            "#..f....f#",
            "#......*.#",
            "#........#",
            "#d..d.d..#",
            "#....b...#",
            "w........#",
            "##########",
        ],
        key: &[
            WALL, EMPTY,
            door('w', Dir::LEFT, "big_room"),
            pad('a', 0xEFEB42, note_a4),
            pad('b', 0x87578E, note_db4),
            pad('d', 0x6A98BA, note_d4),
            pad('f', 0xF4782B, note_f4),
            pad('*', 0xFFFFFF, start_melody).with_solved(TileSpec::Floor(FloorSpec {
                color: Rgb(0xA1C93A),
                on_walked: note_e4,
            })),
        ],
        move_interval: None,
        pre_place: None,
        on_enter: Some(music_room_enter),
        on_exit: None,
    },
    RoomDef {
        id: "slippy",
        width: 10,
        height: 10,
        layout: &[
            "###n######",
            "#.#......#",
            "#.#....#.#",
            "#......#.#",
            "#........#",
            "#........#",
            "#.......##",
            "#.....#.##",
            "#..#..#.##",
            "#######s##",
        ],
        key: &[
            WALL, EMPTY,
            door('n', Dir::UP, "big_room"),
            door('s', Dir::DOWN, "vault"),
        ],
        move_interval: Some(1),
        pre_place: Some(slippy_pre_place),
        on_enter: Some(slippy_enter),
        on_exit: Some(slippy_exit),
    },
    RoomDef {
        id: "vault",
        width: 7,
        height: 9,
        layout: &[
            "###n###",
            "#.....#",
            "#.....#",
            "#.....#",
            "#.....#",
            "#.....#",
            "#.o...#",
            "#.....#",
            "#######",
        ],
        key: &[
            WALL, EMPTY,
            KeyEntry::new('o', TileSpec::Egg(GOLDEN_EGG)),
            door('n', Dir::UP, "slippy"),
        ],
        move_interval: None,
        pre_place: None,
        on_enter: Some(vault_enter),
        on_exit: None,
    },
];

// ── Eggs ──

const EASTER_EGG: EggSpec = egg("easter", Rgb::MAGENTA, true, easter_pickup);
const WESTER_EGG: EggSpec = egg("wester", Rgb::VIOLET, false, wester_pickup);
const GOLDEN_EGG: EggSpec = egg("golden", Rgb(0xFFCC00), true, golden_pickup);
const MELODY_EGG: EggSpec = egg("melody", Rgb::CYAN, true, melody_pickup);

fn easter_pickup(ctx: &mut HookCtx<'_>) {
    ctx.say("It doesn't have the key in it, though.");
}

fn wester_pickup(ctx: &mut HookCtx<'_>) {
    ctx.say("Hmmm... Nope, that's a wester egg.");
    ctx.progress.wester_egg = true;
}

fn golden_pickup(ctx: &mut HookCtx<'_>) {
    ctx.say("You found the key!");
    ctx.player.has_key = true;
}

/// Solves the music room: its trigger becomes a plain pad on the next visit.
fn melody_pickup(ctx: &mut HookCtx<'_>) {
    ctx.room.solved = true;
}

pub static MUSIC_MELODY: Melody = Melody {
    notes: &[
        "l_hchord_d4", "", "l_hchord_a4", "", "l_hchord_f4", "", "l_hchord_d4",
        "", "l_hchord_db4", "", "hchord_d4", "hchord_e4", "l_hchord_f4",
    ],
    lead_in: 30,
    note_gap: 10,
    outro: 30,
    settle: 20,
    trigger_cue: "fx_click",
    reward: MELODY_EGG,
    reward_at: (5, 5),
    reward_message: "An easter egg appeared!",
};

// ── Hooks ──

fn start_enter(ctx: &mut HookCtx<'_>) {
    if ctx.player.has_key {
        ctx.say("Unlock the door... or maybe explore more?");
    } else {
        ctx.say("You're now locked in here. Excellent work.");
    }
}

fn hall_enter(ctx: &mut HookCtx<'_>) {
    if ctx.player.has_key {
        ctx.say("");
    } else {
        ctx.say("Maybe there's an easter egg with the key in it.");
    }
}

fn east_nook_enter(ctx: &mut HookCtx<'_>) {
    if ctx.progress.collected.contains(EASTER_EGG.id) {
        ctx.say("");
    } else {
        ctx.say("Oh look, there's an easter egg!");
    }
}

fn west_nook_enter(ctx: &mut HookCtx<'_>) {
    if ctx.progress.collected.contains(WESTER_EGG.id) {
        ctx.say("Hmmm.");
    } else if ctx.progress.collected.contains(EASTER_EGG.id) {
        ctx.say("Look, another easter egg!");
    } else {
        ctx.say("I think that's an easter egg over there.");
    }
}

fn big_room_enter(ctx: &mut HookCtx<'_>) {
    ctx.say("Woah, this is a big room...");
    ctx.say_later(60, "At least it's only 16x16.");
}

fn leave_cancelling_wait(ctx: &mut HookCtx<'_>) {
    ctx.cancel_wait();
}

fn music_room_enter(ctx: &mut HookCtx<'_>) {
    if ctx.room.solved {
        ctx.say("Ah, now the room looks better.");
    } else {
        ctx.say("What do those buttons do?");
    }
}

fn start_melody(ctx: &mut HookCtx<'_>) {
    melody::begin(ctx, &MUSIC_MELODY);
}

fn note_a4(ctx: &mut HookCtx<'_>) { ctx.play("l_hchord_a4"); }
fn note_db4(ctx: &mut HookCtx<'_>) { ctx.play("l_hchord_db4"); }
fn note_d4(ctx: &mut HookCtx<'_>) { ctx.play("l_hchord_d4"); }
fn note_e4(ctx: &mut HookCtx<'_>) { ctx.play("l_hchord_e4"); }
fn note_f4(ctx: &mut HookCtx<'_>) { ctx.play("l_hchord_f4"); }

fn slippy_pre_place(ctx: &mut HookCtx<'_>) {
    *ctx.floor_color = SLIPPY_FLOOR;
}

fn slippy_enter(ctx: &mut HookCtx<'_>) {
    ctx.say("The floor here is... uhm... what's the word...");
    ctx.say_later(60, "Oh, right! The floor here is really slippy!");
    ctx.player.slippery = true;
}

fn slippy_exit(ctx: &mut HookCtx<'_>) {
    ctx.cancel_wait();
    *ctx.floor_color = DEFAULT_FLOOR;
    ctx.player.slippery = false;
}

fn vault_enter(ctx: &mut HookCtx<'_>) {
    if ctx.progress.collected.contains(GOLDEN_EGG.id) {
        ctx.say("You found the key!");
    } else {
        ctx.say("A golden egg?!");
    }
}
