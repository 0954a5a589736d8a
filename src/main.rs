// EsoxSolutions.ResourcePool
// Fixed-capacity resource pool with FIFO waiting and permanent reservation

// This is just a binary wrapper - the actual library is in lib.rs
// Run demos with: cargo run --example basic

use esox_resourcepool::{ResourcePool, Slot};

fn main() {
    println!("=== EsoxSolutions.ResourcePool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    println!("Quick Demo:");
    let pool = match ResourcePool::<Vec<u8>>::new(3) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("  Error: {}", e);
            return;
        }
    };

    if let Ok(mut slot) = pool.try_take() {
        slot.extend_from_slice(b"demo");
        println!("  Got slot {} holding {} bytes", Slot::id(&slot), slot.len());
    }

    println!("  Free after return: {}", pool.free_count());
}
