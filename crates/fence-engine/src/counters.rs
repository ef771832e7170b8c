//! Per-(vehicle, zone) visit tallies.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fence_core::entities::Counter;
use fence_core::epoch::EpochStamp;
use fence_core::ids::{EntityId, ZoneId};

use crate::error::CounterError;

#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u64,
    last_counted: DateTime<Utc>,
    /// Epoch that last incremented this pair; `None` for seeded tallies.
    last_seq: Option<u64>,
}

/// Sharded counter map. Increments of different pairs never contend on a
/// shared lock; increments of one pair serialize on its shard.
#[derive(Debug, Default)]
pub struct CounterStore {
    tallies: DashMap<(EntityId, ZoneId), Tally>,
}

impl CounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one confirmed visit of `vehicle_id` in `zone_id` during `epoch`.
    ///
    /// Creates the counter at 1 or adds 1, and stamps `last_counted` with the
    /// epoch time.
    ///
    /// # Errors
    ///
    /// Returns `CounterError::DuplicateIncrement` if this pair was already
    /// counted in `epoch`; the tally is left unchanged.
    pub fn increment(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        epoch: EpochStamp,
    ) -> Result<Counter, CounterError> {
        let tally = match self.tallies.entry((vehicle_id.clone(), zone_id)) {
            Entry::Occupied(mut entry) => {
                let tally = entry.get_mut();
                if tally.last_seq == Some(epoch.seq) {
                    return Err(CounterError::DuplicateIncrement {
                        vehicle_id: vehicle_id.clone(),
                        zone_id,
                        seq: epoch.seq,
                    });
                }
                tally.count += 1;
                tally.last_counted = epoch.at;
                tally.last_seq = Some(epoch.seq);
                *tally
            }
            Entry::Vacant(entry) => *entry.insert(Tally {
                count: 1,
                last_counted: epoch.at,
                last_seq: Some(epoch.seq),
            }),
        };

        Ok(Counter {
            vehicle_id: vehicle_id.clone(),
            zone_id,
            count: tally.count,
            last_counted: tally.last_counted,
        })
    }

    #[must_use]
    pub fn get(&self, vehicle_id: &EntityId, zone_id: ZoneId) -> Option<Counter> {
        self.tallies
            .get(&(vehicle_id.clone(), zone_id))
            .map(|tally| Counter {
                vehicle_id: vehicle_id.clone(),
                zone_id,
                count: tally.count,
                last_counted: tally.last_counted,
            })
    }

    /// Install persisted counters, overwriting any in-memory tally for the
    /// same pair. Returns how many were installed.
    pub fn seed(&self, counters: impl IntoIterator<Item = Counter>) -> usize {
        let mut seeded = 0;
        for counter in counters {
            self.tallies.insert(
                (counter.vehicle_id, counter.zone_id),
                Tally {
                    count: counter.count,
                    last_counted: counter.last_counted,
                    last_seq: None,
                },
            );
            seeded += 1;
        }
        seeded
    }

    /// Catch up with counters persisted by another runner over the same store.
    ///
    /// A persisted count above the in-memory tally replaces it; a lower or
    /// equal one is ignored, so unflushed local increments are never lost.
    /// The epoch stamp of the local tally is kept. Returns how many pairs
    /// were created or raised.
    pub fn reconcile(&self, persisted: impl IntoIterator<Item = Counter>) -> usize {
        let mut adopted = 0;
        for counter in persisted {
            match self.tallies.entry((counter.vehicle_id, counter.zone_id)) {
                Entry::Occupied(mut entry) => {
                    let tally = entry.get_mut();
                    if counter.count > tally.count {
                        tally.count = counter.count;
                        tally.last_counted = counter.last_counted;
                        adopted += 1;
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(Tally {
                        count: counter.count,
                        last_counted: counter.last_counted,
                        last_seq: None,
                    });
                    adopted += 1;
                }
            }
        }
        adopted
    }

    /// Every counter, ordered by (vehicle, zone).
    #[must_use]
    pub fn all(&self) -> Vec<Counter> {
        let mut out: Vec<Counter> = self
            .tallies
            .iter()
            .map(|entry| {
                let (vehicle_id, zone_id) = entry.key().clone();
                Counter {
                    vehicle_id,
                    zone_id,
                    count: entry.count,
                    last_counted: entry.last_counted,
                }
            })
            .collect();
        out.sort_by(|a, b| (&a.vehicle_id, a.zone_id).cmp(&(&b.vehicle_id, b.zone_id)));
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;

    fn stamp(seq: u64) -> EpochStamp {
        EpochStamp {
            seq,
            at: DateTime::UNIX_EPOCH + Duration::minutes(i64::try_from(seq).unwrap() * 5),
        }
    }

    #[test]
    fn first_increment_creates_at_one() {
        let store = CounterStore::new();
        let counter = store.increment(&"taxi".into(), ZoneId(1), stamp(1)).unwrap();
        assert_eq!(counter.count, 1);
        assert_eq!(counter.last_counted, stamp(1).at);
    }

    #[test]
    fn each_epoch_adds_exactly_one() {
        let store = CounterStore::new();
        let id = EntityId::new("taxi");
        for seq in 1..=5 {
            store.increment(&id, ZoneId(1), stamp(seq)).unwrap();
        }
        let counter = store.get(&id, ZoneId(1)).unwrap();
        assert_eq!(counter.count, 5);
        assert_eq!(counter.last_counted, stamp(5).at);
    }

    #[test]
    fn duplicate_increment_in_one_epoch_is_rejected() {
        let store = CounterStore::new();
        let id = EntityId::new("taxi");
        store.increment(&id, ZoneId(7), stamp(2)).unwrap();
        let err = store.increment(&id, ZoneId(7), stamp(2)).unwrap_err();
        assert_eq!(
            err,
            CounterError::DuplicateIncrement {
                vehicle_id: id.clone(),
                zone_id: ZoneId(7),
                seq: 2
            }
        );
        assert_eq!(store.get(&id, ZoneId(7)).unwrap().count, 1);
    }

    #[test]
    fn seeded_counter_continues_from_persisted_count() {
        let store = CounterStore::new();
        let id = EntityId::new("taxi");
        store.seed([Counter {
            vehicle_id: id.clone(),
            zone_id: ZoneId(3),
            count: 41,
            last_counted: stamp(0).at,
        }]);
        assert_eq!(store.increment(&id, ZoneId(3), stamp(1)).unwrap().count, 42);
    }

    #[test]
    fn reconcile_raises_but_never_lowers() {
        let store = CounterStore::new();
        let id = EntityId::new("taxi");
        for seq in 1..=3 {
            store.increment(&id, ZoneId(1), stamp(seq)).unwrap();
        }
        let persisted = |zone_id, count| Counter {
            vehicle_id: id.clone(),
            zone_id,
            count,
            last_counted: stamp(9).at,
        };

        let adopted = store.reconcile([persisted(ZoneId(1), 2), persisted(ZoneId(2), 7)]);
        assert_eq!(adopted, 1);
        assert_eq!(store.get(&id, ZoneId(1)).unwrap().count, 3);
        assert_eq!(store.get(&id, ZoneId(2)).unwrap().count, 7);

        assert_eq!(store.reconcile([persisted(ZoneId(1), 5)]), 1);
        assert_eq!(store.increment(&id, ZoneId(1), stamp(4)).unwrap().count, 6);
    }

    #[test]
    fn reconcile_keeps_the_epoch_guard() {
        let store = CounterStore::new();
        let id = EntityId::new("taxi");
        store.increment(&id, ZoneId(1), stamp(1)).unwrap();
        store.reconcile([Counter {
            vehicle_id: id.clone(),
            zone_id: ZoneId(1),
            count: 10,
            last_counted: stamp(1).at,
        }]);
        assert!(store.increment(&id, ZoneId(1), stamp(1)).is_err());
        assert_eq!(store.get(&id, ZoneId(1)).unwrap().count, 10);
    }

    #[test]
    fn concurrent_increments_of_distinct_pairs() {
        let store = CounterStore::new();
        thread::scope(|scope| {
            for worker in 0..8_i64 {
                let store = &store;
                scope.spawn(move || {
                    let id = EntityId::new(format!("v{worker}"));
                    for seq in 1..=50 {
                        store.increment(&id, ZoneId(worker), stamp(seq)).unwrap();
                    }
                });
            }
        });
        assert_eq!(store.len(), 8);
        assert!(store.all().iter().all(|c| c.count == 50));
    }
}
