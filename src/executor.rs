// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Task scheduling (C7, spec §4.7): a work-stealing pool for the
//! candidate-pair workload produced by pair enumeration, plus a simpler
//! atomic-counter "brute-force" mode for the all-pairs fallback (spec's
//! `CounterSource`, grounded in `original_source/sandbox/brute_force.cc`'s
//! inverse-2-combination task id decoding).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_deque::{Injector, Steal, Stealer, Worker};

/// One unit of work: align sequence `a` against sequence `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub a: usize,
    pub b: usize,
}

/// A work-stealing pool over a fixed task list: each worker pulls from
/// its own local deque first, falls back to the shared injector, then
/// steals from a sibling. Termination is detected once the injector and
/// every local/stealer queue are empty.
pub struct WorkStealingPool {
    injector: Arc<Injector<TaskDescriptor>>,
    stealers: Vec<Stealer<TaskDescriptor>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkStealingPool {
    pub fn new(tasks: Vec<TaskDescriptor>, num_workers: usize) -> (Self, Vec<Worker<TaskDescriptor>>) {
        let injector = Arc::new(Injector::new());
        for t in tasks {
            injector.push(t);
        }
        let workers: Vec<Worker<TaskDescriptor>> = (0..num_workers).map(|_| Worker::new_fifo()).collect();
        let stealers = workers.iter().map(Worker::stealer).collect();
        (
            WorkStealingPool {
                injector,
                stealers,
                shutdown: Arc::new(AtomicBool::new(false)),
            },
            workers,
        )
    }

    /// Run `f` on every task across `num_workers` OS threads, cooperative
    /// shutdown available via `shutdown_flag()`.
    pub fn run<F>(mut self, workers: Vec<Worker<TaskDescriptor>>, f: F)
    where
        F: Fn(TaskDescriptor) + Send + Sync,
    {
        let f = Arc::new(f);
        thread::scope(|scope| {
            for (idx, local) in workers.into_iter().enumerate() {
                let injector = Arc::clone(&self.injector);
                let stealers: Vec<Stealer<TaskDescriptor>> = self
                    .stealers
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != idx)
                    .map(|(_, s)| s.clone())
                    .collect();
                let shutdown = Arc::clone(&self.shutdown);
                let f = Arc::clone(&f);
                scope.spawn(move || worker_loop(local, injector, stealers, shutdown, f.as_ref()));
            }
        });
        self.stealers.clear();
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}

fn worker_loop<F: Fn(TaskDescriptor)>(
    local: Worker<TaskDescriptor>,
    injector: Arc<Injector<TaskDescriptor>>,
    stealers: Vec<Stealer<TaskDescriptor>>,
    shutdown: Arc<AtomicBool>,
    f: &F,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let task = local.pop().or_else(|| {
            std::iter::repeat_with(|| {
                injector
                    .steal_batch_and_pop(&local)
                    .or_else(|| stealers.iter().map(Stealer::steal).collect())
            })
            .find(|s| !s.is_retry())
            .and_then(|s| s.success())
        });

        match task {
            Some(t) => f(t),
            None => return,
        }
    }
}

/// All-pairs fallback over `n` sequences without ever materializing the
/// `n*(n-1)/2` pair list: `task_id -> (i, j)` via the inverse of the
/// triangular-number formula, distributed by a single shared counter
/// (spec's simpler `CounterSource`, used when selectivity is high enough
/// that candidate pruning saves little).
pub struct CounterSource {
    next: AtomicUsize,
    total: usize,
    n: usize,
}

impl CounterSource {
    pub fn new(n: usize) -> Self {
        Self::with_selectivity(n, 1.0)
    }

    /// Cap the number of alignments performed to
    /// `round(selectivity * C(n, 2))` (spec §6's `selectivity` CLI
    /// argument, exercised by spec §8 scenario 5). `selectivity` outside
    /// `(0, 1]` is clamped into range; `1.0` performs every pair.
    pub fn with_selectivity(n: usize, selectivity: f64) -> Self {
        let full = n.saturating_sub(1).saturating_mul(n) / 2;
        let selectivity = selectivity.clamp(0.0, 1.0);
        let total = ((selectivity * full as f64).round() as usize).min(full);
        CounterSource {
            next: AtomicUsize::new(0),
            total,
            n,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Claim the next task id and decode it to a pair, or `None` once
    /// every pair has been claimed.
    pub fn next_task(&self) -> Option<TaskDescriptor> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if id >= self.total {
            return None;
        }
        Some(decode_pair(id, self.n))
    }
}

/// Inverse of `k = i*n - i*(i+1)/2 + (j - i - 1)` (the standard linear
/// index into an upper-triangular pair enumeration): recovers `i` by
/// solving the quadratic boundary, then `j` by subtracting the offset.
fn decode_pair(task_id: usize, n: usize) -> TaskDescriptor {
    // offset(i) = number of pairs (i', j') enumerated with i' < i, i.e.
    // the task id of the first pair whose first index is i: each first
    // index k < i contributes (n - 1 - k) pairs.
    let offset = |i: usize| i * (n - 1) - i * i.saturating_sub(1) / 2;

    // Binary search for the largest i with offset(i) <= task_id.
    let mut lo = 0usize;
    let mut hi = n - 1;
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if offset(mid) <= task_id {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    let i = lo;
    let j = task_id - offset(i) + i + 1;
    TaskDescriptor { a: i, b: j }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn counter_source_enumerates_every_pair_exactly_once() {
        let n = 6;
        let source = CounterSource::new(n);
        let mut seen = HashSet::new();
        while let Some(t) = source.next_task() {
            assert!(t.a < t.b);
            assert!(t.b < n);
            assert!(seen.insert((t.a, t.b)));
        }
        assert_eq!(seen.len(), n * (n - 1) / 2);
    }

    #[test]
    fn selectivity_caps_the_alignment_count() {
        let n = 5;
        let source = CounterSource::with_selectivity(n, 0.5);
        assert_eq!(source.total(), 5);
        let mut seen = HashSet::new();
        while let Some(t) = source.next_task() {
            seen.insert((t.a, t.b));
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn work_stealing_pool_visits_every_task() {
        let tasks: Vec<TaskDescriptor> = (0..50).map(|i| TaskDescriptor { a: i, b: i + 1 }).collect();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (pool, workers) = WorkStealingPool::new(tasks.clone(), 4);
        let seen_clone = Arc::clone(&seen);
        pool.run(workers, move |t| {
            seen_clone.lock().unwrap().push(t);
        });
        let mut observed = seen.lock().unwrap().clone();
        observed.sort_by_key(|t| t.a);
        let mut expected = tasks;
        expected.sort_by_key(|t| t.a);
        assert_eq!(observed, expected);
    }
}
