/*
 * A single value handed from one task to another.
 *
 * The value sits behind an async mutex, so readers only ever copy out a
 * completely written value. Each write also releases one permit on a counting
 * semaphore; the consuming task waits on that to learn a new value is there.
 * Permits accumulate when nobody is waiting, so a consumer that falls behind
 * still sees one wake-up per write.
 */

use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    mutex::Mutex,
    semaphore::{GreedySemaphore, Semaphore},
};

pub struct SharedCell<M: RawMutex, T> {
    value: Mutex<M, T>,
    changed: GreedySemaphore<M>,
}

impl<M: RawMutex, T: Copy> SharedCell<M, T> {
    pub const fn new(initial: T) -> Self {
        SharedCell {
            value: Mutex::new(initial),
            changed: GreedySemaphore::new(0),
        }
    }

    pub async fn read(&self) -> T {
        *self.value.lock().await
    }

    /// Stores `value` and wakes at most one task waiting for a change.
    pub async fn write(&self, value: T) {
        *self.value.lock().await = value;
        self.changed.release(1);
    }

    /// Waits for the next write and returns the value current at that point.
    pub async fn wait_changed(&self) -> T {
        match self.changed.acquire(1).await {
            Ok(permit) => {
                permit.disarm();
            }
            Err(never) => match never {},
        }
        self.read().await
    }

    /// Like `wait_changed`, but returns `None` instead of waiting when there
    /// has been no write since the last one was consumed.
    pub async fn try_changed(&self) -> Option<T> {
        self.changed.try_acquire(1)?.disarm();
        Some(self.read().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::{
        block_on,
        select::{Either, select},
        yield_now,
    };
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type Cell<T> = SharedCell<CriticalSectionRawMutex, T>;

    #[test]
    fn starts_with_initial_value_and_no_change() {
        let cell: Cell<u16> = Cell::new(0x00FF);
        block_on(async {
            assert_eq!(cell.read().await, 0x00FF);
            assert_eq!(cell.try_changed().await, None);
        });
    }

    #[test]
    fn each_write_is_one_change() {
        let cell: Cell<u8> = Cell::new(0);
        block_on(async {
            cell.write(1).await;
            cell.write(2).await;
            assert_eq!(cell.wait_changed().await, 2);
            assert_eq!(cell.try_changed().await, Some(2));
            assert_eq!(cell.try_changed().await, None);
        });
    }

    #[test]
    fn waiter_blocks_until_written() {
        let cell: Cell<u8> = Cell::new(0);
        block_on(async {
            match select(cell.wait_changed(), yield_now()).await {
                Either::First(_) => panic!("woke without a write"),
                Either::Second(()) => {}
            }
            cell.write(42).await;
            assert_eq!(cell.wait_changed().await, 42);
        });
    }

    #[test]
    fn concurrent_readers_never_see_torn_values() {
        const WRITERS: u32 = 4;
        const WRITES: u32 = 500;

        let cell: Cell<[u32; 8]> = Cell::new([0; 8]);

        std::thread::scope(|s| {
            for writer in 1..=WRITERS {
                let cell = &cell;
                s.spawn(move || {
                    for n in 0..WRITES {
                        block_on(cell.write([writer * 10_000 + n; 8]));
                    }
                });
            }
            for _ in 0..4 {
                let cell = &cell;
                s.spawn(move || {
                    for _ in 0..WRITES {
                        let seen = block_on(cell.read());
                        assert!(seen.iter().all(|v| *v == seen[0]), "torn read {seen:?}");
                        let writer = seen[0] / 10_000;
                        assert!(writer <= WRITERS && seen[0] % 10_000 < WRITES);
                    }
                });
            }
        });

        let mut changes = 0;
        while block_on(cell.try_changed()).is_some() {
            changes += 1;
        }
        assert_eq!(changes, WRITERS * WRITES);
    }
}
