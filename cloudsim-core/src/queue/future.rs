//! The future event queue: a totally-ordered multiset of not-yet-processed
//! [`Event`]s.
//!
//! Order is `(time, serial)` ascending. Kept as a sorted `Vec` rather than a
//! `BinaryHeap` because the engine needs ordered *iteration* (to re-scan the
//! same-time prefix after every event it processes, per `spec.md` §4.2) and
//! identity/predicate-based removal (`cancel`/`cancelAll`), neither of which
//! a heap gives for free. Simulation workloads in this core stay small
//! enough that the O(n) insertion this implies is not worth a fancier
//! structure — see `spec.md`'s own size budget.

use crate::event::Event;

/// Ordered store of scheduled-but-not-yet-processed events.
#[derive(Default)]
pub struct FutureQueue {
    events: Vec<Event>,
    next_serial: i64,
    next_front_serial: i64,
}

impl FutureQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_serial: 0,
            next_front_serial: -1,
        }
    }

    /// Assigns the next ordinary serial and inserts in sort position.
    pub fn add_event(&mut self, mut event: Event) {
        event.serial = self.next_serial;
        self.next_serial += 1;
        self.insert_sorted(event);
    }

    /// Inserts an event that must compare less than any existing event with
    /// the same `time` ("immediate-priority send", `spec.md` §4.1).
    pub fn add_event_first(&mut self, mut event: Event) {
        event.serial = self.next_front_serial;
        self.next_front_serial -= 1;
        self.insert_sorted(event);
    }

    fn insert_sorted(&mut self, event: Event) {
        let pos = self
            .events
            .partition_point(|e| Self::order_key(e) <= Self::order_key(&event));
        self.events.insert(pos, event);
    }

    fn order_key(e: &Event) -> (u64, i64) {
        (e.time.to_bits(), e.serial)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns the time of the earliest event, if any.
    pub fn peek_time(&self) -> Option<f64> {
        self.events.first().map(|e| e.time)
    }

    /// Removes and returns the earliest event.
    pub fn pop_first(&mut self) -> Option<Event> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    /// Removes and returns the first event matching `pred`, scanning in
    /// queue order. Used by `cancel`.
    pub fn remove_first_matching(&mut self, pred: impl Fn(&Event) -> bool) -> Option<Event> {
        let pos = self.events.iter().position(pred);
        pos.map(|i| self.events.remove(i))
    }

    /// Removes all events matching `pred`, returning how many were removed.
    /// Used by `cancelAll`.
    pub fn remove_all_matching(&mut self, pred: impl Fn(&Event) -> bool) -> usize {
        let before = self.events.len();
        self.events.retain(|e| !pred(e));
        before - self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BROADCAST;
    use crate::event::{EventKind, Payload};

    fn ev(time: f64) -> Event {
        Event::new(time, 0, 0, BROADCAST, 0, Payload::none(), EventKind::Send)
    }

    #[test]
    fn orders_by_time_then_serial() {
        let mut q = FutureQueue::new();
        q.add_event(ev(3.0));
        q.add_event(ev(1.0));
        q.add_event(ev(2.0));
        q.add_event(ev(1.0));
        let times: Vec<f64> = std::iter::from_fn(|| q.pop_first()).map(|e| e.time).collect();
        assert_eq!(times, vec![1.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn add_event_first_bypasses_ordering_at_same_time() {
        let mut q = FutureQueue::new();
        q.add_event(ev(5.0));
        q.add_event_first(ev(5.0));
        let first = q.pop_first().unwrap();
        assert!(first.serial < 0);
    }

    #[test]
    fn remove_first_matching_removes_one() {
        let mut q = FutureQueue::new();
        q.add_event(ev(1.0));
        q.add_event(ev(1.0));
        let removed = q.remove_first_matching(|e| e.time == 1.0);
        assert!(removed.is_some());
        assert_eq!(q.len(), 1);
    }
}
