/// Grid vocabulary shared by rooms, entities and the stage:
/// colors, collision planes and unit directions.

/// 24-bit color packed as `0xRRGGBB`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x000000);
    pub const WHITE: Rgb = Rgb(0xFFFFFF);
    pub const MAGENTA: Rgb = Rgb(0xFF00FF);
    pub const VIOLET: Rgb = Rgb(0x7F00FF);
    pub const CYAN: Rgb = Rgb(0x00FFFF);

    pub fn r(self) -> u8 { (self.0 >> 16) as u8 }
    pub fn g(self) -> u8 { (self.0 >> 8) as u8 }
    pub fn b(self) -> u8 { self.0 as u8 }
}

/// Collision plane of a placed sprite.
/// The host layers sprites by plane; the simulation routes overlaps by it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum Plane {
    Floor,
    Wall,
    Door,
    Egg,
    LockedDoor,
    Player,
}

impl Plane {
    /// Draw order: higher planes cover lower ones.
    pub fn depth(self) -> u8 {
        self as u8
    }
}

/// A grid step: zero or one of the four unit vectors.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Dir {
    pub dx: i32,
    pub dy: i32,
}

impl Dir {
    pub const ZERO: Dir = Dir { dx: 0, dy: 0 };
    pub const UP: Dir = Dir { dx: 0, dy: -1 };
    pub const DOWN: Dir = Dir { dx: 0, dy: 1 };
    pub const LEFT: Dir = Dir { dx: -1, dy: 0 };
    pub const RIGHT: Dir = Dir { dx: 1, dy: 0 };

    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    #[allow(dead_code)]
    pub fn reversed(self) -> Dir {
        Dir { dx: -self.dx, dy: -self.dy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_channels() {
        let c = Rgb(0xA1C93A);
        assert_eq!((c.r(), c.g(), c.b()), (0xA1, 0xC9, 0x3A));
    }

    #[test]
    fn reversed_undoes_a_step() {
        for d in [Dir::UP, Dir::DOWN, Dir::LEFT, Dir::RIGHT] {
            let r = d.reversed();
            assert_eq!((d.dx + r.dx, d.dy + r.dy), (0, 0));
            assert!(!r.is_zero());
        }
        assert!(Dir::ZERO.reversed().is_zero());
    }

    #[test]
    fn player_draws_over_everything() {
        assert!(Plane::Player.depth() > Plane::LockedDoor.depth());
        assert!(Plane::Wall.depth() > Plane::Floor.depth());
    }
}
