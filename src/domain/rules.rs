/// Input and movement rules as pure functions.
///
/// Key codes are the host's raw integer codes: ASCII for printable keys,
/// 1005..=1008 for the arrow keys. Movement is always one cell per
/// attempt along a single axis.

use super::tile::Dir;

pub const KEY_ARROW_LEFT: i32 = 1005;
pub const KEY_ARROW_UP: i32 = 1006;
pub const KEY_ARROW_RIGHT: i32 = 1007;
pub const KEY_ARROW_DOWN: i32 = 1008;
pub const KEY_SPACE: i32 = 32;
pub const KEY_ESCAPE: i32 = 27;

/// Logical control a raw key maps to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Interact,
}

pub fn control_for(key: i32) -> Option<Control> {
    match key {
        KEY_ARROW_UP => Some(Control::Up),
        KEY_ARROW_DOWN => Some(Control::Down),
        KEY_ARROW_LEFT => Some(Control::Left),
        KEY_ARROW_RIGHT => Some(Control::Right),
        KEY_SPACE => Some(Control::Interact),
        _ => match u8::try_from(key).ok().map(|b| b.to_ascii_lowercase()) {
            Some(b'w') => Some(Control::Up),
            Some(b's') => Some(Control::Down),
            Some(b'a') => Some(Control::Left),
            Some(b'd') => Some(Control::Right),
            _ => None,
        },
    }
}

/// Direction a discrete press asks for, if it is a movement key.
pub fn key_direction(key: i32) -> Option<Dir> {
    match control_for(key)? {
        Control::Up => Some(Dir::UP),
        Control::Down => Some(Dir::DOWN),
        Control::Left => Some(Dir::LEFT),
        Control::Right => Some(Dir::RIGHT),
        Control::Interact => None,
    }
}

/// Which controls are held right now.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub interact: bool,
}

impl Controls {
    pub fn set(&mut self, control: Control, held: bool) {
        match control {
            Control::Up => self.up = held,
            Control::Down => self.down = held,
            Control::Left => self.left = held,
            Control::Right => self.right = held,
            Control::Interact => self.interact = held,
        }
    }

    /// Direction from the held keys. Opposing keys cancel on their axis;
    /// when both axes are live the horizontal one wins.
    pub fn direction(&self) -> Dir {
        let dx = self.right as i32 - self.left as i32;
        let dy = self.down as i32 - self.up as i32;
        if dx != 0 {
            Dir { dx, dy: 0 }
        } else {
            Dir { dx: 0, dy }
        }
    }
}

/// Cell reached by stepping `dir` from (x, y), or `None` if it leaves
/// the `width` x `height` grid.
pub fn step_target(x: usize, y: usize, dir: Dir, width: usize, height: usize) -> Option<(usize, usize)> {
    let tx = x as i64 + dir.dx as i64;
    let ty = y as i64 + dir.dy as i64;
    if tx < 0 || ty < 0 || tx >= width as i64 || ty >= height as i64 {
        return None;
    }
    Some((tx as usize, ty as usize))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[Control]) -> Controls {
        let mut c = Controls::default();
        for k in keys {
            c.set(*k, true);
        }
        c
    }

    // ── Key mapping ──

    #[test]
    fn wasd_and_arrows_map_alike() {
        assert_eq!(control_for(119), Some(Control::Up));
        assert_eq!(control_for(KEY_ARROW_UP), Some(Control::Up));
        assert_eq!(control_for(97), Some(Control::Left));
        assert_eq!(control_for(KEY_ARROW_LEFT), Some(Control::Left));
        assert_eq!(control_for(115), Some(Control::Down));
        assert_eq!(control_for(100), Some(Control::Right));
        assert_eq!(control_for(KEY_SPACE), Some(Control::Interact));
    }

    #[test]
    fn uppercase_letters_map() {
        assert_eq!(control_for('W' as i32), Some(Control::Up));
        assert_eq!(control_for('D' as i32), Some(Control::Right));
    }

    #[test]
    fn other_keys_ignored() {
        assert_eq!(control_for('q' as i32), None);
        assert_eq!(control_for(KEY_ESCAPE), None);
        assert_eq!(control_for(-1), None);
        assert_eq!(control_for(5000), None);
        assert_eq!(key_direction(KEY_SPACE), None);
    }

    #[test]
    fn key_direction_is_unit() {
        assert_eq!(key_direction(KEY_ARROW_RIGHT), Some(Dir::RIGHT));
        assert_eq!(key_direction('s' as i32), Some(Dir::DOWN));
    }

    // ── Held direction ──

    #[test]
    fn nothing_held_is_idle() {
        assert!(Controls::default().direction().is_zero());
    }

    #[test]
    fn single_key_direction() {
        assert_eq!(held(&[Control::Up]).direction(), Dir::UP);
        assert_eq!(held(&[Control::Left]).direction(), Dir::LEFT);
    }

    #[test]
    fn opposing_keys_cancel() {
        assert!(held(&[Control::Up, Control::Down]).direction().is_zero());
        assert!(held(&[Control::Left, Control::Right]).direction().is_zero());
        // Cancelled horizontal axis leaves the vertical one
        assert_eq!(held(&[Control::Left, Control::Right, Control::Down]).direction(), Dir::DOWN);
    }

    #[test]
    fn both_axes_prefers_horizontal() {
        assert_eq!(held(&[Control::Up, Control::Right]).direction(), Dir::RIGHT);
    }

    #[test]
    fn release_clears_control() {
        let mut c = held(&[Control::Up]);
        c.set(Control::Up, false);
        assert!(c.direction().is_zero());
    }

    // ── Bounds ──

    #[test]
    fn step_inside_grid() {
        assert_eq!(step_target(1, 1, Dir::RIGHT, 3, 3), Some((2, 1)));
        assert_eq!(step_target(1, 1, Dir::UP, 3, 3), Some((1, 0)));
    }

    #[test]
    fn step_off_each_edge_rejected() {
        assert_eq!(step_target(0, 1, Dir::LEFT, 3, 3), None);
        assert_eq!(step_target(2, 1, Dir::RIGHT, 3, 3), None);
        assert_eq!(step_target(1, 0, Dir::UP, 3, 3), None);
        assert_eq!(step_target(1, 2, Dir::DOWN, 3, 3), None);
    }

    #[test]
    fn zero_step_stays() {
        assert_eq!(step_target(2, 2, Dir::ZERO, 3, 3), Some((2, 2)));
    }
}
