/// Live entities: the player singleton and the arena that owns every
/// tile entity placed for the current room.

use super::tile::Dir;

// ── Arena ──

/// Handle into the current room's arena.
///
/// Every teardown bumps the arena epoch, so an id minted for an earlier
/// room never resolves again, even when its slot index is reused.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct EntityId {
    epoch: u32,
    index: u32,
}

pub struct Arena<T> {
    epoch: u32,
    slots: Vec<Option<T>>,
    live: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena { epoch: 0, slots: Vec::new(), live: 0 }
    }

    pub fn insert(&mut self, value: T) -> EntityId {
        let index = self.slots.len() as u32;
        self.slots.push(Some(value));
        self.live += 1;
        EntityId { epoch: self.epoch, index }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        if id.epoch != self.epoch { return None; }
        self.slots.get(id.index as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        if id.epoch != self.epoch { return None; }
        self.slots.get_mut(id.index as usize).and_then(|s| s.as_mut())
    }

    /// Take an entity out. Stale or already removed ids yield `None`.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        if id.epoch != self.epoch { return None; }
        let taken = self.slots.get_mut(id.index as usize).and_then(|s| s.take());
        if taken.is_some() {
            self.live -= 1;
        }
        taken
    }

    /// Empty the arena and invalidate every id handed out so far.
    pub fn drain(&mut self) -> Vec<T> {
        self.epoch = self.epoch.wrapping_add(1);
        self.live = 0;
        self.slots.drain(..).flatten().collect()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        let epoch = self.epoch;
        self.slots.iter().enumerate().filter_map(move |(i, s)| {
            s.as_ref().map(|v| (EntityId { epoch, index: i as u32 }, v))
        })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena::new()
    }
}

// ── Player ──

/// A key press waiting for the player to come to rest.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BufferedKey {
    pub key: i32,
    pub ticks_left: u32,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: usize,
    pub y: usize,
    pub dir: Dir,
    pub move_counter: u32,
    pub move_interval: u32,
    pub buffer: Option<BufferedKey>,
    /// Armed once the player has moved a cell since the last room load.
    pub door_collision: bool,
    pub allow_movement: bool,
    pub has_key: bool,
    pub slippery: bool,
}

impl Player {
    pub fn new(move_interval: u32) -> Self {
        Player {
            x: 0,
            y: 0,
            dir: Dir::ZERO,
            move_counter: 0,
            move_interval,
            buffer: None,
            door_collision: false,
            allow_movement: true,
            has_key: false,
            slippery: false,
        }
    }

    /// Put the player on a cell at rest.
    pub fn place(&mut self, x: usize, y: usize) {
        self.x = x;
        self.y = y;
        self.dir = Dir::ZERO;
        self.buffer = None;
    }

    /// Hold `key` for up to `ticks` ticks. A newer press replaces the older one.
    pub fn buffer_key(&mut self, key: i32, ticks: u32) {
        if ticks == 0 {
            self.buffer = None;
            return;
        }
        self.buffer = Some(BufferedKey { key, ticks_left: ticks });
    }

    /// Age the buffered key by one tick, dropping it when it runs out.
    pub fn age_buffer(&mut self) {
        if let Some(b) = &mut self.buffer {
            b.ticks_left = b.ticks_left.saturating_sub(1);
            if b.ticks_left == 0 {
                self.buffer = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_insert_get_remove() {
        let mut a = Arena::new();
        let x = a.insert("wall");
        let y = a.insert("door");
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(x), Some(&"wall"));
        assert_eq!(a.remove(x), Some("wall"));
        assert_eq!(a.remove(x), None);
        assert_eq!(a.get(x), None);
        assert_eq!(a.get(y), Some(&"door"));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn stale_ids_miss_after_drain() {
        let mut a = Arena::new();
        let old = a.insert(1);
        let drained = a.drain();
        assert_eq!(drained, vec![1]);
        assert!(a.is_empty());

        // Same slot index, new epoch: the old handle must not see it
        let new = a.insert(2);
        assert_ne!(old, new);
        assert_eq!(a.get(old), None);
        assert_eq!(a.remove(old), None);
        assert_eq!(a.get(new), Some(&2));
    }

    #[test]
    fn arena_iter_skips_holes() {
        let mut a = Arena::new();
        let first = a.insert('a');
        a.insert('b');
        a.insert('c');
        a.remove(first);
        let seen: Vec<char> = a.iter().map(|(_, c)| *c).collect();
        assert_eq!(seen, vec!['b', 'c']);
    }

    #[test]
    fn buffered_key_expires() {
        let mut p = Player::new(3);
        p.buffer_key(119, 2);
        p.age_buffer();
        assert_eq!(p.buffer, Some(BufferedKey { key: 119, ticks_left: 1 }));
        p.age_buffer();
        assert_eq!(p.buffer, None);
    }

    #[test]
    fn newer_press_replaces_buffer() {
        let mut p = Player::new(3);
        p.buffer_key(119, 2);
        p.buffer_key(115, 2);
        assert_eq!(p.buffer.map(|b| b.key), Some(115));
    }

    #[test]
    fn place_stops_the_player() {
        let mut p = Player::new(3);
        p.dir = Dir::LEFT;
        p.buffer_key(97, 2);
        p.place(4, 5);
        assert_eq!((p.x, p.y), (4, 5));
        assert!(p.dir.is_zero());
        assert!(p.buffer.is_none());
    }
}
