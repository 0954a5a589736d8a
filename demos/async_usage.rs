//! Async usage examples

use esox_resourcepool::{PoolError, ResourcePool, Slot};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.ResourcePool - Async Examples ===\n");

    // Example 1: Async take
    async_take().await;

    // Example 2: Waiters served in order
    fair_waiting().await;

    // Example 3: Waiters failed by full reservation
    fully_reserved().await;
}

async fn async_take() {
    println!("1. Async Take:");
    let pool = ResourcePool::<u32>::new(2).unwrap();

    {
        let slot = pool.take().await.unwrap();
        println!("   Got slot {} asynchronously", Slot::id(&slot));
    }

    println!();
}

async fn fair_waiting() {
    println!("2. Fair Waiting:");
    let pool = ResourcePool::<u32>::new(2).unwrap();

    let mut handles = vec![];

    for task in 0..6 {
        let pool = pool.clone();
        let handle = tokio::spawn(async move {
            match pool.take().await {
                Ok(slot) => {
                    println!("   Task {} got slot {}", task, Slot::id(&slot));
                    sleep(Duration::from_millis(20)).await;
                }
                Err(e) => println!("   Task {} failed: {}", task, e),
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Final free: {}\n", pool.free_count());
}

async fn fully_reserved() {
    println!("3. Fully Reserved:");
    let pool = ResourcePool::<u32>::new(1).unwrap();
    let only = pool.take().await.unwrap();

    let waiter = tokio::spawn({
        let pool = pool.clone();
        async move { pool.take().await.map(|slot| Slot::id(&slot)) }
    });

    while pool.waiting_count() == 0 {
        tokio::task::yield_now().await;
    }

    Slot::reserve(only);
    match waiter.await.unwrap() {
        Err(PoolError::PoolFullyReserved) => println!("   Waiter failed: pool fully reserved"),
        other => println!("   Unexpected: {:?}", other),
    }
}
