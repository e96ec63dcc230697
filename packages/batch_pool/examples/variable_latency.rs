//! Example running a batch whose tasks take variable time and sometimes fail.
//!
//! Task failures travel inside the processing function's return type; a failed
//! task is an ordinary result, never a fault of the pool.

use std::num::NonZero;
use std::thread;
use std::time::Duration;

use batch_pool::BatchPool;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn main() {
    println!("=== Variable Latency Batch ===");

    // Pre-roll each task's latency so the batch is reproducible.
    let mut rng = SmallRng::seed_from_u64(7);
    let tasks: Vec<(usize, u64)> = (0..20)
        .map(|index| (index, rng.random_range(0..50)))
        .collect();

    let pool = BatchPool::new(NonZero::new(4).unwrap());

    let results = pool.execute(tasks, |(index, delay_ms)| {
        thread::sleep(Duration::from_millis(delay_ms));

        if delay_ms % 2 == 0 {
            Err(format!("task {index} drew an unlucky even delay"))
        } else {
            Ok(index)
        }
    });

    let outcomes: Vec<_> = results.into_iter().map(Result::unwrap).collect();

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    let failed = outcomes.len() - succeeded;

    println!("{} tasks completed: {succeeded} succeeded, {failed} failed", outcomes.len());

    for outcome in outcomes.iter().filter(|o| o.is_err()) {
        if let Err(reason) = outcome {
            println!("  failure: {reason}");
        }
    }
}
