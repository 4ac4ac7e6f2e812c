/// Room definitions and the registry that serves them to the loader.
///
/// A room is a fixed-size grid of symbols plus a key that maps each symbol
/// to a [`TileSpec`]. Definitions never change after startup; whatever a
/// room needs to remember between visits lives in its `RoomState` record
/// in the world, which hooks receive through [`HookCtx`].
///
/// ## Layout format
///   One `&str` per row, one symbol per cell, `height` rows of `width`
///   symbols. Symbols are per-room: `'e'` may be a door in one room and
///   something else in another.

use std::fmt;

use thiserror::Error;

use crate::domain::tile::{Dir, Rgb};
use super::world::HookCtx;

pub type RoomId = &'static str;

/// Room-authored behavior: lifecycle hooks, pickups, floor triggers.
pub type Hook = fn(&mut HookCtx<'_>);

#[derive(Clone, Copy)]
pub struct EggSpec {
    /// Stable identity; a collected id is never placed again.
    pub id: &'static str,
    pub color: Rgb,
    /// Whether picking it up adds to the egg tally.
    pub counts: bool,
    pub pickup: Hook,
}

impl fmt::Debug for EggSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EggSpec")
            .field("id", &self.id)
            .field("color", &self.color)
            .field("counts", &self.counts)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
pub struct FloorSpec {
    pub color: Rgb,
    /// Runs every time the player steps onto the tile.
    pub on_walked: Hook,
}

impl fmt::Debug for FloorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloorSpec").field("color", &self.color).finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TileSpec {
    Empty,
    Wall,
    PlayerStart,
    Door { dir: Dir, target: RoomId },
    LockedDoor,
    Egg(EggSpec),
    Floor(FloorSpec),
}

impl TileSpec {
    /// Does placing this tile create an arena entity?
    #[allow(dead_code)]
    pub fn is_entity(&self) -> bool {
        !matches!(self, TileSpec::Empty | TileSpec::PlayerStart)
    }
}

/// One symbol of a room key.
#[derive(Clone, Copy, Debug)]
pub struct KeyEntry {
    pub symbol: char,
    pub tile: TileSpec,
    /// Replaces `tile` once the room is marked solved.
    pub solved: Option<TileSpec>,
}

impl KeyEntry {
    pub const fn new(symbol: char, tile: TileSpec) -> Self {
        KeyEntry { symbol, tile, solved: None }
    }

    pub const fn with_solved(self, tile: TileSpec) -> Self {
        KeyEntry { solved: Some(tile), ..self }
    }
}

pub struct RoomDef {
    pub id: RoomId,
    pub width: usize,
    pub height: usize,
    pub layout: &'static [&'static str],
    pub key: &'static [KeyEntry],
    /// Overrides the configured ticks-per-move while this room is loaded.
    pub move_interval: Option<u32>,
    pub pre_place: Option<Hook>,
    pub on_enter: Option<Hook>,
    pub on_exit: Option<Hook>,
}

impl RoomDef {
    pub fn symbol_at(&self, x: usize, y: usize) -> Option<char> {
        self.layout.get(y)?.chars().nth(x)
    }

    fn entry(&self, symbol: char) -> Option<&KeyEntry> {
        self.key.iter().find(|e| e.symbol == symbol)
    }

    /// Tile at (x, y), honoring solved variants.
    ///
    /// Panics when the cell is missing or its symbol has no key entry;
    /// [`Registry::validate`] rules both out for shipped data.
    pub fn tile_at(&self, x: usize, y: usize, solved: bool) -> TileSpec {
        let symbol = self.symbol_at(x, y)
            .unwrap_or_else(|| panic!("room '{}' has no cell at ({x}, {y})", self.id));
        let entry = self.entry(symbol)
            .unwrap_or_else(|| panic!("room '{}' has no key entry for '{symbol}'", self.id));
        match (solved, entry.solved) {
            (true, Some(alt)) => alt,
            _ => entry.tile,
        }
    }

    /// Cells holding a door to `target`.
    pub fn doors_to(&self, target: RoomId) -> Vec<(usize, usize)> {
        let mut cells = vec![];
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(TileSpec::Door { target: t, .. }) =
                    self.symbol_at(x, y).and_then(|s| self.entry(s)).map(|e| e.tile)
                {
                    if t == target {
                        cells.push((x, y));
                    }
                }
            }
        }
        cells
    }
}

// ══════════════════════════════════════════════════════════════
// Registry
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("start room '{0}' is not registered")]
    UnknownStart(String),
    #[error("room '{0}' is registered twice")]
    DuplicateRoom(String),
    #[error("room '{room}' has {actual} rows, expected {expected}")]
    RowCount { room: String, expected: usize, actual: usize },
    #[error("room '{room}' row {row} has {actual} cells, expected {expected}")]
    RowWidth { room: String, row: usize, expected: usize, actual: usize },
    #[error("room '{room}' uses '{symbol}' at ({x}, {y}) with no key entry")]
    UnknownSymbol { room: String, symbol: char, x: usize, y: usize },
    #[error("room '{room}' has a door to unknown room '{target}'")]
    UnknownTarget { room: String, target: String },
    #[error("door at ({x}, {y}) in room '{room}' does not face the room edge")]
    DoorFacing { room: String, x: usize, y: usize },
    #[error("room '{room}' has no door back to '{from}'")]
    NoReturnDoor { room: String, from: String },
    #[error("start room '{room}' needs exactly one player start, found {found}")]
    PlayerStart { room: String, found: usize },
}

/// Static catalog of rooms, looked up by id.
pub struct Registry {
    start: RoomId,
    rooms: &'static [RoomDef],
    egg_total: u32,
}

impl Registry {
    /// `egg_total` is the number of counting eggs a full playthrough can
    /// collect, including ones spawned at runtime.
    pub fn new(start: RoomId, rooms: &'static [RoomDef], egg_total: u32) -> Self {
        Registry { start, rooms, egg_total }
    }

    pub fn start(&self) -> RoomId {
        self.start
    }

    pub fn egg_total(&self) -> u32 {
        self.egg_total
    }

    pub fn find(&self, id: &str) -> Option<&'static RoomDef> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Look up a room by id.
    ///
    /// Panics on an unknown id: rooms are compiled in, so a miss is a data
    /// authoring bug, not a runtime condition.
    pub fn get(&self, id: &str) -> &'static RoomDef {
        self.find(id).unwrap_or_else(|| panic!("unknown room '{id}'"))
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = &'static RoomDef> {
        self.rooms.iter()
    }

    /// Check the whole catalog for authoring mistakes.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let start = self.find(self.start)
            .ok_or_else(|| RegistryError::UnknownStart(self.start.to_string()))?;

        for (i, room) in self.rooms.iter().enumerate() {
            if self.rooms[..i].iter().any(|r| r.id == room.id) {
                return Err(RegistryError::DuplicateRoom(room.id.to_string()));
            }
            validate_shape(room)?;
        }

        for room in self.rooms {
            for y in 0..room.height {
                for x in 0..room.width {
                    let entry = room.symbol_at(x, y).and_then(|s| room.entry(s));
                    let Some(entry) = entry else { continue };
                    for tile in [Some(entry.tile), entry.solved].into_iter().flatten() {
                        if let TileSpec::Door { dir, target } = tile {
                            self.validate_door(room, x, y, dir, target)?;
                        }
                    }
                }
            }
        }

        let starts = count_cells(start, |t| matches!(t, TileSpec::PlayerStart));
        if starts != 1 {
            return Err(RegistryError::PlayerStart { room: start.id.to_string(), found: starts });
        }
        Ok(())
    }

    fn validate_door(&self, room: &RoomDef, x: usize, y: usize, dir: Dir, target: RoomId) -> Result<(), RegistryError> {
        let Some(dest) = self.find(target) else {
            return Err(RegistryError::UnknownTarget {
                room: room.id.to_string(),
                target: target.to_string(),
            });
        };
        if dir.is_zero()
            || crate::domain::rules::step_target(x, y, dir, room.width, room.height).is_some()
        {
            return Err(RegistryError::DoorFacing { room: room.id.to_string(), x, y });
        }
        if dest.doors_to(room.id).is_empty() {
            return Err(RegistryError::NoReturnDoor {
                room: dest.id.to_string(),
                from: room.id.to_string(),
            });
        }
        Ok(())
    }
}

fn validate_shape(room: &RoomDef) -> Result<(), RegistryError> {
    if room.layout.len() != room.height {
        return Err(RegistryError::RowCount {
            room: room.id.to_string(),
            expected: room.height,
            actual: room.layout.len(),
        });
    }
    for (y, row) in room.layout.iter().enumerate() {
        let cells = row.chars().count();
        if cells != room.width {
            return Err(RegistryError::RowWidth {
                room: room.id.to_string(),
                row: y,
                expected: room.width,
                actual: cells,
            });
        }
        for (x, symbol) in row.chars().enumerate() {
            if room.entry(symbol).is_none() {
                return Err(RegistryError::UnknownSymbol {
                    room: room.id.to_string(),
                    symbol,
                    x,
                    y,
                });
            }
        }
    }
    Ok(())
}

fn count_cells(room: &RoomDef, pred: impl Fn(&TileSpec) -> bool) -> usize {
    let mut n = 0;
    for y in 0..room.height {
        for x in 0..room.width {
            if pred(&room.tile_at(x, y, false)) {
                n += 1;
            }
        }
    }
    n
}
