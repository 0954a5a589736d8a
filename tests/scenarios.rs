use esox_resourcepool::{PoolConfiguration, PoolError, PoolResult, ResourcePool, Slot};
use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinHandle;

async fn wait_for_waiters<T: Send + 'static>(pool: &ResourcePool<T>, count: usize) {
    while pool.waiting_count() < count {
        tokio::task::yield_now().await;
    }
}

/// Spawns a take and waits until it is queued, so spawn order is queue order.
async fn queue_take(pool: &ResourcePool<u32>) -> JoinHandle<PoolResult<Slot<u32>>> {
    let queued = pool.waiting_count();
    let handle = tokio::spawn({
        let pool = pool.clone();
        async move { pool.take().await }
    });
    wait_for_waiters(pool, queued + 1).await;
    handle
}

fn numbered_pool(capacity: usize) -> ResourcePool<u32> {
    let mut next = 0;
    ResourcePool::with_factory(
        PoolConfiguration::new().with_capacity(capacity),
        || {
            next += 1;
            next
        },
    )
    .unwrap()
}

#[tokio::test]
async fn capacity_takes_succeed_then_next_take_waits() {
    for capacity in [1, 2, 5] {
        let pool = numbered_pool(capacity);
        let mut held = Vec::new();
        for _ in 0..capacity {
            held.push(pool.take().await.unwrap());
        }

        let ids: HashSet<_> = held.iter().map(|slot| Slot::id(slot)).collect();
        assert_eq!(ids.len(), capacity);

        let extra = tokio::time::timeout(Duration::from_millis(20), pool.take()).await;
        assert!(extra.is_err(), "take past capacity must wait");
    }
}

#[tokio::test]
async fn release_serves_exactly_one_take() {
    let pool = numbered_pool(1);
    let held = pool.take().await.unwrap();

    let first = queue_take(&pool).await;
    let second = queue_take(&pool).await;

    drop(held);
    let served = first.await.unwrap().unwrap();
    assert_eq!(*served, 1);

    tokio::task::yield_now().await;
    assert!(!second.is_finished());
    assert_eq!(pool.waiting_count(), 1);

    drop(served);
    assert_eq!(*second.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn reaching_capacity_fails_all_waiters() {
    let pool = numbered_pool(2);
    let first = pool.take().await.unwrap();
    let second = pool.take().await.unwrap();

    let mut waiters = Vec::new();
    for _ in 0..3 {
        waiters.push(queue_take(&pool).await);
    }

    Slot::reserve(first);
    assert_eq!(pool.waiting_count(), 3);
    Slot::reserve(second);

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().unwrap_err(), PoolError::PoolFullyReserved);
    }
    assert!(pool.is_fully_reserved());
    assert_eq!(pool.free_count(), 0);
    assert_eq!(pool.checked_out_count(), 0);
    assert_eq!(pool.get_metrics().fully_reserved_failures, 3);
}

#[tokio::test]
async fn waiters_are_served_in_arrival_order() {
    let pool = numbered_pool(1);
    let held = pool.take().await.unwrap();

    let a = queue_take(&pool).await;
    let b = queue_take(&pool).await;

    drop(held);
    tokio::task::yield_now().await;

    let a_slot = a.await.unwrap().unwrap();
    assert!(!b.is_finished());
    assert_eq!(pool.waiting_count(), 1);

    drop(a_slot);
    assert!(b.await.unwrap().is_ok());
}

#[tokio::test]
async fn fully_reserved_take_fails_immediately() {
    let pool = numbered_pool(3);
    for _ in 0..3 {
        Slot::reserve(pool.take().await.unwrap());
    }

    for _ in 0..2 {
        let result = tokio::time::timeout(Duration::from_secs(1), pool.take())
            .await
            .expect("take on a fully reserved pool must not wait");
        assert_eq!(result.unwrap_err(), PoolError::PoolFullyReserved);
    }
}

#[tokio::test]
async fn scenario_release_hands_same_instance_to_waiter() {
    let pool = numbered_pool(2);
    let s1 = pool.take().await.unwrap();
    let _s2 = pool.take().await.unwrap();
    assert_eq!(pool.free_count(), 0);

    let s1_id = Slot::id(&s1);
    let s1_value = *s1;
    let r3 = queue_take(&pool).await;

    drop(s1);
    let received = r3.await.unwrap().unwrap();
    assert_eq!(Slot::id(&received), s1_id);
    assert_eq!(*received, s1_value);
}

#[tokio::test]
async fn scenario_single_slot_reserved() {
    let pool = numbered_pool(1);
    let s1 = pool.take().await.unwrap();
    Slot::reserve(s1);

    assert_eq!(pool.reserved_count(), 1);
    assert_eq!(pool.take().await.unwrap_err(), PoolError::PoolFullyReserved);
}

#[tokio::test]
async fn scenario_partial_reservation_leaves_waiters_queued() {
    let pool = numbered_pool(3);
    let s1 = pool.take().await.unwrap();
    let s2 = pool.take().await.unwrap();
    let s3 = pool.take().await.unwrap();
    assert_eq!((pool.free_count(), pool.reserved_count()), (0, 0));

    let r4 = queue_take(&pool).await;
    let r5 = queue_take(&pool).await;

    Slot::reserve(s1);
    assert_eq!(pool.reserved_count(), 1);
    tokio::task::yield_now().await;
    assert!(!r4.is_finished());
    assert!(!r5.is_finished());
    assert_eq!(pool.waiting_count(), 2);

    let s2_id = Slot::id(&s2);
    let s3_id = Slot::id(&s3);

    drop(s2);
    let r4_slot = r4.await.unwrap().unwrap();
    assert_eq!(Slot::id(&r4_slot), s2_id);

    drop(s3);
    let r5_slot = r5.await.unwrap().unwrap();
    assert_eq!(Slot::id(&r5_slot), s3_id);

    assert_eq!(pool.checked_out_count() + pool.reserved_count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_takes_never_share_a_slot() {
    let pool = ResourcePool::<u32>::new(3).unwrap();
    let mut handles = Vec::new();

    for _ in 0..24 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..20 {
                let mut slot = pool.take().await.unwrap();
                // Nobody else may touch this resource while we hold it.
                let before = *slot;
                *slot += 1;
                tokio::task::yield_now().await;
                assert_eq!(*slot, before + 1);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(pool.free_count(), 3);
    assert_eq!(pool.get_metrics().total_taken, 24 * 20);

    let mut total = 0;
    let held: Vec<_> = (0..3).map(|_| pool.try_take().unwrap()).collect();
    for slot in &held {
        total += **slot;
    }
    assert_eq!(total, 24 * 20);
}
