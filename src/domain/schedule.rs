/// Tick scheduler: hand a payload back once after N ticks.
///
/// `tick()` returns the payloads that came due instead of running them,
/// so the caller can act on them with full access to the world and
/// schedule follow-ups freely. Entries scheduled while those payloads are
/// handled start aging on the next tick, never the current one.
///
/// Payloads due on the same tick come out in ascending id order, which is
/// the order they were scheduled in.

/// Handle for cancelling a scheduled entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct WaitId(u64);

struct Pending<T> {
    id: WaitId,
    elapsed: u32,
    target: u32,
    payload: T,
}

pub struct Scheduler<T> {
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler { next_id: 0, pending: Vec::new() }
    }

    /// Deliver `payload` on the `delay`-th call to `tick()` from now.
    /// A delay of zero behaves like one.
    pub fn schedule(&mut self, delay: u32, payload: T) -> WaitId {
        let id = WaitId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { id, elapsed: 0, target: delay.max(1), payload });
        id
    }

    /// Drop a pending entry. Unknown or already delivered ids are ignored.
    /// Returns whether anything was removed.
    pub fn cancel(&mut self, id: WaitId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Age every entry by one tick and return the payloads now due.
    pub fn tick(&mut self) -> Vec<T> {
        let mut due = Vec::new();
        for mut p in std::mem::take(&mut self.pending) {
            p.elapsed += 1;
            if p.elapsed >= p.target {
                due.push(p.payload);
            } else {
                self.pending.push(p);
            }
        }
        due
    }

    #[allow(dead_code)]
    pub fn is_pending(&self, id: WaitId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler::new()
    }
}
