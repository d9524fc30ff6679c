use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timer::TimerQueue;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Neutral,
    Success,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: u64,
    pub midi: u8,
    pub display_name: String,
    pub status: EntryStatus,
    pub is_fading: bool,
    pub is_released: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LedgerTimer {
    Fade(u64),
    Remove(u64),
}

impl LedgerTimer {
    fn entry(self) -> u64 {
        match self {
            LedgerTimer::Fade(id) | LedgerTimer::Remove(id) => id,
        }
    }
}

#[derive(Debug)]
pub struct HistoryLedger {
    capacity: usize,
    fade: Duration,
    next_id: u64,
    entries: VecDeque<HistoryEntry>,
    timers: TimerQueue<LedgerTimer>,
}

impl HistoryLedger {
    pub fn new(capacity: usize, fade: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            fade,
            next_id: 0,
            entries: VecDeque::with_capacity(capacity),
            timers: TimerQueue::new(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, midi: u8, display_name: impl Into<String>, status: EntryStatus) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(HistoryEntry {
            id,
            midi,
            display_name: display_name.into(),
            status,
            is_fading: false,
            is_released: false,
        });
        while self.entries.len() > self.capacity {
            if let Some(dropped) = self.entries.pop_front() {
                self.timers.cancel_where(|timer| timer.entry() == dropped.id);
            }
        }
        id
    }

    pub fn mark_success(&mut self, predicate: impl Fn(&HistoryEntry) -> bool, now: Instant) {
        let mut faded = Vec::new();
        for entry in self.entries.iter_mut() {
            if predicate(entry) {
                entry.status = EntryStatus::Success;
            } else if !entry.is_fading {
                entry.is_fading = true;
                faded.push(entry.id);
            }
        }
        for id in faded {
            self.timers.schedule(now + self.fade, LedgerTimer::Remove(id));
        }
    }

    pub fn schedule_eviction(&mut self, id: u64, after: Duration, now: Instant) {
        if self.get(id).is_some() {
            self.timers.schedule(now + after, LedgerTimer::Fade(id));
        }
    }

    pub fn release(&mut self, midi: u8, hold: Duration, now: Instant) -> Option<u64> {
        let entry = self
            .entries
            .iter_mut()
            .rev()
            .find(|entry| entry.midi == midi && !entry.is_released)?;
        entry.is_released = true;
        let id = entry.id;
        self.schedule_eviction(id, hold, now);
        Some(id)
    }

    pub fn schedule_reset(&mut self, delay: Duration, now: Instant) {
        let ids: Vec<u64> = self.entries.iter().map(|entry| entry.id).collect();
        debug!(entries = ids.len(), "scheduling history reset");
        for id in ids {
            self.schedule_eviction(id, delay, now);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.timers.invalidate();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Applies due fades and removals. A fade that was due in the past is
    /// removed relative to its own deadline, so a late tick does not stretch it.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        loop {
            let due = self.timers.drain_due_with_deadline(now);
            if due.is_empty() {
                return changed;
            }
            for (deadline, timer) in due {
                match timer {
                    LedgerTimer::Fade(id) => {
                        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id)
                        else {
                            continue;
                        };
                        if entry.is_fading {
                            continue;
                        }
                        entry.is_fading = true;
                        changed = true;
                        self.timers
                            .schedule(deadline + self.fade, LedgerTimer::Remove(id));
                    }
                    LedgerTimer::Remove(id) => {
                        let before = self.entries.len();
                        self.entries.retain(|entry| entry.id != id);
                        changed |= before != self.entries.len();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> HistoryLedger {
        HistoryLedger::new(10, Duration::from_millis(500))
    }

    #[test]
    fn append_keeps_the_newest_ten() {
        let mut ledger = ledger();
        for midi in 0..25u8 {
            ledger.append(60 + midi, "n", EntryStatus::Neutral);
            assert!(ledger.len() <= 10);
        }
        let first = ledger.entries().next().unwrap();
        assert_eq!(first.midi, 75);
    }

    #[test]
    fn release_fades_then_removes() {
        let start = Instant::now();
        let mut ledger = ledger();
        let id = ledger.append(60, "C4", EntryStatus::Neutral);
        assert_eq!(ledger.release(60, Duration::from_millis(4000), start), Some(id));
        assert!(ledger.get(id).unwrap().is_released);

        assert!(!ledger.tick(start + Duration::from_millis(3999)));
        assert!(ledger.tick(start + Duration::from_millis(4000)));
        assert!(ledger.get(id).unwrap().is_fading);
        assert!(ledger.tick(start + Duration::from_millis(4500)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn release_picks_the_newest_repeat() {
        let start = Instant::now();
        let mut ledger = ledger();
        let first = ledger.append(60, "C4", EntryStatus::Neutral);
        let second = ledger.append(60, "C4", EntryStatus::Neutral);
        assert_eq!(ledger.release(60, Duration::ZERO, start), Some(second));
        assert_eq!(ledger.release(60, Duration::ZERO, start), Some(first));
        assert_eq!(ledger.release(60, Duration::ZERO, start), None);
    }

    #[test]
    fn mark_success_fades_the_rest() {
        let start = Instant::now();
        let mut ledger = ledger();
        let kept = ledger.append(60, "C4", EntryStatus::Neutral);
        let stray = ledger.append(61, "C#4", EntryStatus::Neutral);
        ledger.mark_success(|entry| entry.midi == 60, start);
        assert_eq!(ledger.get(kept).unwrap().status, EntryStatus::Success);
        assert!(ledger.get(stray).unwrap().is_fading);
        ledger.tick(start + Duration::from_millis(500));
        assert!(ledger.get(stray).is_none());
        assert!(ledger.get(kept).is_some());
    }

    #[test]
    fn reset_clears_after_delay_and_fade() {
        let start = Instant::now();
        let mut ledger = ledger();
        ledger.append(60, "C4", EntryStatus::Neutral);
        ledger.append(65, "F4", EntryStatus::Neutral);
        ledger.schedule_reset(Duration::from_millis(500), start);
        ledger.tick(start + Duration::from_millis(500));
        assert!(ledger.entries().all(|entry| entry.is_fading));
        ledger.tick(start + Duration::from_millis(1000));
        assert!(ledger.is_empty());
    }

    #[test]
    fn clear_discards_pending_evictions() {
        let start = Instant::now();
        let mut ledger = ledger();
        ledger.append(60, "C4", EntryStatus::Neutral);
        ledger.release(60, Duration::from_millis(100), start);
        ledger.clear();
        let fresh = ledger.append(60, "C4", EntryStatus::Neutral);
        assert!(!ledger.tick(start + Duration::from_secs(10)));
        assert!(!ledger.get(fresh).unwrap().is_fading);
        assert_eq!(ledger.next_deadline(), None);
    }

    #[test]
    fn late_tick_does_not_stretch_the_fade() {
        let start = Instant::now();
        let mut ledger = ledger();
        let early = ledger.append(60, "C4", EntryStatus::Neutral);
        let late = ledger.append(62, "D4", EntryStatus::Neutral);
        ledger.release(60, Duration::from_millis(4000), start);
        ledger.release(62, Duration::from_millis(4400), start);

        // first tick arrives well after the first fade began
        assert!(ledger.tick(start + Duration::from_millis(4600)));
        assert!(ledger.get(early).is_none());
        assert!(ledger.get(late).unwrap().is_fading);
        assert_eq!(
            ledger.next_deadline(),
            Some(start + Duration::from_millis(4900))
        );
    }
}
