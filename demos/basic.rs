//! Basic usage examples for ResourcePool

use esox_resourcepool::{PoolConfiguration, PoolError, ResourcePool, Slot};

fn main() {
    println!("=== EsoxSolutions.ResourcePool - Basic Examples ===\n");

    // Example 1: Simple pool of buffers
    simple_pool();

    // Example 2: Pool with a factory and configuration
    factory_pool();

    // Example 3: Reserving slots
    reserving_slots();

    // Example 4: Metrics and health
    metrics_and_health();
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = ResourcePool::<Vec<u8>>::new(3).unwrap();

    {
        let mut buffer = pool.try_take().unwrap();
        buffer.extend_from_slice(b"payload");
        println!("   Got slot {} with {} bytes", Slot::id(&buffer), buffer.len());
        // Slot automatically returned when dropped
    }

    println!("   Free after return: {}\n", pool.free_count());
}

fn factory_pool() {
    println!("2. Factory Pool:");

    let config = PoolConfiguration::new()
        .with_capacity(4)
        .with_name("connections");

    let mut next = 0;
    let pool = ResourcePool::with_factory(config, || {
        next += 1;
        format!("connection-{}", next)
    })
    .unwrap();

    {
        let first = pool.try_take().unwrap();
        let second = pool.try_take().unwrap();
        println!("   Holding {} and {}", *first, *second);
        println!("   Checked out: {}", pool.checked_out_count());
        println!("   Free: {}", pool.free_count());
    }

    println!();
}

fn reserving_slots() {
    println!("3. Reserving Slots:");
    let pool = ResourcePool::<u64>::new(2).unwrap();

    let kept = Slot::reserve(pool.try_take().unwrap());
    println!("   Reserved one slot, kept value {}", kept);
    println!("   Reserved: {} of {}", pool.reserved_count(), pool.capacity());

    Slot::reserve(pool.try_take().unwrap());
    match pool.try_take() {
        Err(PoolError::PoolFullyReserved) => println!("   Pool is now fully reserved"),
        other => println!("   Unexpected: {:?}", other.map(|slot| Slot::id(&slot))),
    }

    println!();
}

fn metrics_and_health() {
    println!("4. Metrics and Health:");
    let pool = ResourcePool::<u8>::new(4).unwrap();

    let _held = pool.try_take().unwrap();
    let _reserved = Slot::reserve(pool.try_take().unwrap());

    let health = pool.get_health_status();
    println!("   Healthy: {}", health.is_healthy());
    println!("   Utilization: {:.0}%", health.utilization * 100.0);

    let mut metrics: Vec<_> = pool.export_metrics().into_iter().collect();
    metrics.sort();
    for (key, value) in metrics {
        println!("   {}: {}", key, value);
    }
}
