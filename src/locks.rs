//! Per-room lock registry.
//!
//! A mutating operation holds the locks of every room it touches for its
//! whole critical section, so operations against the same room serialize
//! while operations against disjoint rooms proceed in parallel. Locks are
//! always acquired in sorted id order, which rules out lock-order
//! inversion between operations spanning the same pair of rooms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Registry of one mutex per room id. Handles are created on first use and
/// retained for the life of the registry.
#[derive(Default)]
pub struct RoomLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, room_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the locks for every listed room. Ids are
    /// sorted and deduplicated before acquisition.
    pub fn with_rooms_locked<R>(&self, room_ids: &[&str], f: impl FnOnce() -> R) -> R {
        let mut ids: Vec<&str> = room_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let handles: Vec<Arc<Mutex<()>>> = ids.iter().map(|id| self.handle(id)).collect();
        let _guards: Vec<_> = handles
            .iter()
            .map(|h| h.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    #[test]
    fn same_room_operations_serialize() {
        let locks = Arc::new(RoomLocks::new());
        let counter = Arc::new(AtomicU32::new(0));
        let high_water = Arc::new(AtomicU32::new(0));

        let mut threads = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let counter = Arc::clone(&counter);
            let high_water = Arc::clone(&high_water);
            threads.push(thread::spawn(move || {
                for _ in 0..50 {
                    locks.with_rooms_locked(&["cold_stone_room"], || {
                        let inside = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        high_water.fetch_max(inside, Ordering::SeqCst);
                        counter.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            }));
        }
        for t in threads {
            t.join().expect("thread");
        }
        assert_eq!(high_water.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_and_unsorted_ids_do_not_deadlock() {
        let locks = RoomLocks::new();
        let ran = locks.with_rooms_locked(&["b_room", "a_room", "b_room"], || true);
        assert!(ran);
    }
}
