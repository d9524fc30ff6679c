use std::time::Instant;

/// Handle to a scheduled timer. Handles from before an [`TimerQueue::invalidate`]
/// never match anything again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId {
    id: u64,
    generation: u64,
}

impl TimerId {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct Pending<E> {
    id: TimerId,
    due: Instant,
    event: E,
}

#[derive(Debug)]
pub struct TimerQueue<E> {
    generation: u64,
    next_id: u64,
    pending: Vec<Pending<E>>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn schedule(&mut self, due: Instant, event: E) -> TimerId {
        let id = TimerId {
            id: self.next_id,
            generation: self.generation,
        };
        self.next_id += 1;
        self.pending.push(Pending { id, due, event });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|pending| pending.id != id);
        before != self.pending.len()
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&E) -> bool) {
        self.pending.retain(|pending| !predicate(&pending.event));
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|pending| pending.id == id)
    }

    pub fn invalidate(&mut self) {
        self.pending.clear();
        self.generation += 1;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|pending| pending.due).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain_due(&mut self, now: Instant) -> Vec<E> {
        self.drain_due_with_deadline(now)
            .into_iter()
            .map(|(_, event)| event)
            .collect()
    }

    pub fn drain_due_with_deadline(&mut self, now: Instant) -> Vec<(Instant, E)> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due <= now {
                due.push(self.pending.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by(|a, b| a.due.cmp(&b.due).then(a.id.id.cmp(&b.id.id)));
        due.into_iter()
            .filter(|pending| pending.id.generation == self.generation)
            .map(|pending| (pending.due, pending.event))
            .collect()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn drains_in_deadline_order() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(start + Duration::from_millis(30), "c");
        queue.schedule(start + Duration::from_millis(10), "a");
        queue.schedule(start + Duration::from_millis(20), "b");
        assert_eq!(queue.next_deadline(), Some(start + Duration::from_millis(10)));
        assert_eq!(queue.drain_due(start + Duration::from_millis(25)), vec!["a", "b"]);
        assert_eq!(queue.len(), 1);
        assert!(queue.drain_due(start).is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        let id = queue.schedule(start, 1);
        queue.schedule(start, 2);
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert_eq!(queue.drain_due(start), vec![2]);
    }

    #[test]
    fn invalidate_retires_old_handles() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        let old = queue.schedule(start, "old");
        queue.invalidate();
        assert_eq!(queue.generation(), 1);
        assert!(!queue.is_pending(old));
        let fresh = queue.schedule(start, "new");
        assert_ne!(old, fresh);
        assert!(!queue.cancel(old));
        assert_eq!(queue.drain_due(start), vec!["new"]);
    }

    #[test]
    fn cancel_where_filters_by_event() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(start, 1);
        queue.schedule(start, 2);
        queue.schedule(start, 3);
        queue.cancel_where(|event| event % 2 == 1);
        assert_eq!(queue.drain_due(start), vec![2]);
    }

    #[test]
    fn drained_timers_keep_their_deadlines() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(start + Duration::from_millis(5), "late");
        queue.schedule(start, "early");
        assert_eq!(
            queue.drain_due_with_deadline(start + Duration::from_secs(1)),
            vec![(start, "early"), (start + Duration::from_millis(5), "late")]
        );
    }
}
