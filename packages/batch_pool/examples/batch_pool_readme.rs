//! Example that demonstrates the exact usage shown in the README.md file.

use std::num::NonZero;

use batch_pool::BatchPool;

fn main() {
    println!("=== Batch Pool README Example ===");

    let pool = BatchPool::new(NonZero::new(4).unwrap());

    let results = pool.execute((1..=10).collect(), |x: u64| x * x);

    // Results arrive in completion order, not submission order.
    assert_eq!(results.len(), 10);

    let total: u64 = results.into_iter().map(Result::unwrap).sum();
    assert_eq!(total, 385);

    println!("Sum of squares 1..=10: {total}");
    println!("README example completed successfully!");
}
