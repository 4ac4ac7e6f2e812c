/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

use super::room::RoomId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// Fire-and-forget audio cue by name.
    Sound(&'static str),
    RoomEntered(RoomId),
    DoorTaken { target: RoomId },
    EggCollected { id: &'static str, x: usize, y: usize },
    FloorWalked { x: usize, y: usize },
    Bumped { x: usize, y: usize },
    Unlocked { eggs: u32 },
}
