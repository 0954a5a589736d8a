//! # EsoxSolutions.ResourcePool
//!
//! Fixed-capacity, thread-safe pool of reusable resource slots with async
//! waiting, FIFO fairness and permanent slot reservation.
//!
//! ## Features
//!
//! - All slots created eagerly from a factory or `Default`
//! - Automatic return of slots via RAII (Drop trait)
//! - Async, blocking and non-waiting takes
//! - Waiting takes served strictly in arrival order
//! - Permanent withdrawal of slots, with a terminal fully-reserved state
//! - Health monitoring and metrics
//! - Prometheus metrics export
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_resourcepool::{ResourcePool, Slot};
//!
//! let pool = ResourcePool::<Vec<u8>>::new(2).unwrap();
//! {
//!     let mut buffer = pool.try_take().unwrap();
//!     buffer.extend_from_slice(b"hello");
//!     // Slot automatically returned when `buffer` goes out of scope
//! }
//!
//! // Keep a slot forever
//! let kept = Slot::reserve(pool.try_take().unwrap());
//! assert_eq!(kept, b"hello");
//! assert_eq!(pool.reserved_count(), 1);
//! ```

mod pool;
mod config;
mod metrics;
mod health;
mod errors;

pub use pool::{ResourcePool, Slot};
pub use config::{PoolConfiguration, DEFAULT_CAPACITY, DEFAULT_POOL_NAME};
pub use metrics::{PoolMetrics, MetricsExporter};
pub use health::HealthStatus;
pub use errors::{PoolError, PoolResult};
