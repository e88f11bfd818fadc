use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared count of finished downloads across the worker threads.
/// Counts completion, not success: a failed clip still moves the counter.
#[derive(Debug)]
pub struct Progress {
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one finished download and return the updated count
    pub fn finish_one(&self) -> usize {
        self.done.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_from_zero() {
        let progress = Progress::new(3);
        assert_eq!(progress.done(), 0);
        assert_eq!(progress.finish_one(), 1);
        assert_eq!(progress.finish_one(), 2);
        assert_eq!(progress.done(), 2);
        assert_eq!(progress.total(), 3);
    }

    #[test]
    fn concurrent_updates_lose_nothing() {
        let progress = Progress::new(400);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        progress.finish_one();
                    }
                });
            }
        });

        assert_eq!(progress.done(), 400);
    }

    #[test]
    fn each_update_sees_a_distinct_count() {
        let progress = Progress::new(100);
        let mut seen: Vec<usize> = Vec::new();

        std::thread::scope(|scope| {
            let (tx, rx) = crossbeam_channel::unbounded();
            let progress = &progress;
            for _ in 0..4 {
                let tx = tx.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        tx.send(progress.finish_one()).unwrap();
                    }
                });
            }
            drop(tx);
            seen.extend(rx.iter());
        });

        seen.sort_unstable();
        assert_eq!(seen, (1..=100).collect::<Vec<_>>());
    }
}
