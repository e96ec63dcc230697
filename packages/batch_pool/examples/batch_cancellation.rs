//! Example canceling a long batch from a deadline thread.
//!
//! The deadline thread shares a `CancellationToken` with the pool; when it fires,
//! task distribution and result delivery stop at the next blocking point and the
//! caller receives the results collected so far.

use std::num::NonZero;
use std::thread;
use std::time::Duration;

use batch_pool::{BatchPool, CancellationToken};

const TASK_COUNT: usize = 1000;

fn main() {
    println!("=== Batch Cancellation ===");

    let token = CancellationToken::new();

    // A deadline of 100 ms for a batch that would otherwise run for seconds.
    let deadline = thread::spawn({
        let token = token.clone();
        move || {
            thread::sleep(Duration::from_millis(100));
            token.cancel();
            println!("deadline reached, batch canceled");
        }
    });

    let pool = BatchPool::builder()
        .worker_count(NonZero::new(4).unwrap())
        .cancellation(token)
        .build();

    let results = pool.execute((0..TASK_COUNT).collect(), |index: usize| {
        thread::sleep(Duration::from_millis(10));
        index
    });

    deadline.join().unwrap();

    println!("collected {} of {TASK_COUNT} results before cancellation", results.len());
    assert!(results.len() < TASK_COUNT);
}
