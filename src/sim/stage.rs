/// Host boundary: what the simulation asks of the display side.
///
/// The simulation owns every position and answers overlap queries itself
/// (all sprites are exactly one cell), so a stage only mirrors state for
/// presentation: grid size, per-cell tint, one-cell sprites by plane, and
/// short cell flashes.

use crate::domain::tile::{Plane, Rgb};

/// Host-side identity of a visual sprite.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub u32);

pub trait Stage {
    /// Resize the grid and reset grid-level visuals (tint, borders).
    fn resize(&mut self, width: usize, height: usize);
    fn tint(&mut self, x: usize, y: usize, color: Rgb);
    /// Create a one-cell solid sprite. `alpha` 0 is invisible but still
    /// occupies its plane.
    fn spawn(&mut self, plane: Plane, x: usize, y: usize, color: Rgb, alpha: u8) -> SpriteId;
    fn move_to(&mut self, sprite: SpriteId, x: usize, y: usize);
    fn remove(&mut self, sprite: SpriteId);
    /// Brief highlight of a cell that fades on its own.
    fn flash(&mut self, x: usize, y: usize);
}
