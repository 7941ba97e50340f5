//! Shared access to one generator from several viewers
//!
//! One writer calls [`SharedStream::advance`] on the tick timer; any number
//! of readers take snapshots concurrently. A reader always sees a buffer
//! either before or after a whole tick, never halfway through.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StreamError;
use crate::generator::StreamGenerator;
use crate::reading::Reading;
use crate::sensors::SensorId;

/// Cloneable handle to a [`StreamGenerator`] behind a read/write lock.
#[derive(Clone)]
pub struct SharedStream {
    inner: Arc<RwLock<StreamGenerator>>,
}

impl SharedStream {
    pub fn new(generator: StreamGenerator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(generator)),
        }
    }

    // Generation never panics halfway through a tick, so a poisoned lock
    // still guards consistent buffers.
    fn read(&self) -> RwLockReadGuard<'_, StreamGenerator> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StreamGenerator> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`StreamGenerator::advance`].
    pub fn advance(&self, now_ms: u64) -> BTreeMap<SensorId, Reading> {
        self.write().advance(now_ms)
    }

    /// See [`StreamGenerator::warm_up`].
    pub fn warm_up(&self, ticks: usize, end_ms: u64) {
        self.write().warm_up(ticks, end_ms);
    }

    pub fn snapshot(&self, sensor_id: &str) -> Result<Vec<Reading>, StreamError> {
        self.read().snapshot(sensor_id)
    }

    pub fn snapshot_all(&self) -> BTreeMap<SensorId, Vec<Reading>> {
        self.read().snapshot_all()
    }

    pub fn latest(&self, sensor_id: &str) -> Result<Option<Reading>, StreamError> {
        self.read().latest(sensor_id)
    }

    pub fn tick_count(&self) -> u64 {
        self.read().tick_count()
    }

    /// Run `f` with read access to the whole generator.
    pub fn with<R>(&self, f: impl FnOnce(&StreamGenerator) -> R) -> R {
        f(&self.read())
    }
}

impl From<StreamGenerator> for SharedStream {
    fn from(generator: StreamGenerator) -> Self {
        Self::new(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;

    const START_MS: u64 = 1_704_067_200_000;

    fn shared(capacity: usize) -> SharedStream {
        let config = StreamConfig {
            buffer_capacity: capacity,
            ..StreamConfig::default()
        };
        StreamGenerator::new(config, 11).unwrap().into()
    }

    #[test]
    fn test_clones_share_buffers() {
        let writer = shared(10);
        let reader = writer.clone();

        writer.advance(START_MS);
        writer.advance(START_MS + 5_000);

        assert_eq!(reader.tick_count(), 2);
        assert_eq!(reader.snapshot("downtown").unwrap().len(), 2);
        assert_eq!(
            reader.latest("downtown").unwrap().map(|r| r.timestamp_ms),
            Some(START_MS + 5_000)
        );
        assert_eq!(reader.with(|g| g.sensors().count()), 8);
    }

    #[test]
    fn test_readers_see_whole_ticks() {
        let stream = shared(64);
        let writer = stream.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..200 {
                writer.advance(START_MS + i * 5_000);
            }
        });

        for _ in 0..200 {
            let snapshots = stream.snapshot_all();
            let lengths: Vec<_> = snapshots.values().map(Vec::len).collect();
            // Every sensor is appended within the same write lock
            assert!(lengths.windows(2).all(|w| w[0] == w[1]));
            for readings in snapshots.values() {
                assert!(readings.windows(2).all(|w| w[0].sequence + 1 == w[1].sequence));
            }
        }

        handle.join().unwrap();
        assert_eq!(stream.tick_count(), 200);
        assert_eq!(stream.snapshot("airport").unwrap().len(), 64);
    }

    #[test]
    fn test_poisoned_lock_still_serves_reads() {
        let stream = shared(5);
        stream.advance(START_MS);

        let poisoner = stream.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.write();
            panic!("viewer crashed while holding the lock");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(stream.snapshot("stadium").unwrap().len(), 1);
        stream.advance(START_MS + 5_000);
        assert_eq!(stream.tick_count(), 2);
    }
}
