//! Core resource pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::health::HealthStatus;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics, SlotCounts};

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::oneshot;

/// A resource together with the stable id of the slot that owns it
struct SlotEntry<T> {
    id: usize,
    resource: T,
}

type Delivery<T> = PoolResult<SlotEntry<T>>;
type Waiter<T> = oneshot::Sender<Delivery<T>>;

struct PoolState<T> {
    /// LIFO stack of free slots
    free: Vec<SlotEntry<T>>,
    /// Ids of permanently withdrawn slots
    reserved: Vec<usize>,
    /// Pending takes, oldest first
    waiting: VecDeque<Waiter<T>>,
    checked_out: usize,
}

impl<T> PoolState<T> {
    fn counts(&self) -> SlotCounts {
        SlotCounts {
            free: self.free.len(),
            reserved: self.reserved.len(),
            checked_out: self.checked_out,
            waiting: self.live_waiters(),
        }
    }

    fn live_waiters(&self) -> usize {
        self.waiting.iter().filter(|waiter| !waiter.is_closed()).count()
    }
}

enum Ticket<T> {
    Ready(SlotEntry<T>),
    Queued(oneshot::Receiver<Delivery<T>>),
}

struct PoolInner<T> {
    capacity: usize,
    name: String,
    state: Mutex<PoolState<T>>,
    metrics: MetricsTracker,
}

impl<T> PoolInner<T> {
    /// Applies the immediate take rules; `Ok(None)` means the caller has to queue.
    fn take_now(&self, state: &mut PoolState<T>) -> PoolResult<Option<SlotEntry<T>>> {
        if state.reserved.len() >= self.capacity {
            MetricsTracker::record(&self.metrics.fully_reserved_failures);
            return Err(PoolError::PoolFullyReserved);
        }

        // Abandoned takes must not hold up new callers.
        state.waiting.retain(|waiter| !waiter.is_closed());
        if !state.waiting.is_empty() {
            return Ok(None);
        }

        match state.free.pop() {
            Some(entry) => {
                state.checked_out += 1;
                MetricsTracker::record(&self.metrics.total_taken);
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn begin_take(&self) -> PoolResult<Ticket<T>> {
        let mut state = self.state.lock();
        if let Some(entry) = self.take_now(&mut state)? {
            return Ok(Ticket::Ready(entry));
        }

        let (sender, receiver) = oneshot::channel();
        state.waiting.push_back(sender);
        MetricsTracker::record(&self.metrics.total_waits);
        tracing::trace!(pool = %self.name, waiting = state.live_waiters(), "take queued");
        Ok(Ticket::Queued(receiver))
    }

    fn release(&self, mut entry: SlotEntry<T>) {
        let mut state = self.state.lock();
        state.checked_out -= 1;
        MetricsTracker::record(&self.metrics.total_released);

        while let Some(waiter) = state.waiting.pop_front() {
            let id = entry.id;
            match waiter.send(Ok(entry)) {
                Ok(()) => {
                    state.checked_out += 1;
                    MetricsTracker::record(&self.metrics.total_taken);
                    tracing::trace!(
                        pool = %self.name,
                        slot = id,
                        waiting = state.live_waiters(),
                        "slot handed to waiter"
                    );
                    return;
                }
                Err(Ok(unclaimed)) => entry = unclaimed,
                Err(Err(_)) => unreachable!("release only delivers slots"),
            }
        }

        state.free.push(entry);
    }

    fn reserve(&self, id: usize) {
        let mut state = self.state.lock();
        state.checked_out -= 1;
        state.reserved.push(id);
        MetricsTracker::record(&self.metrics.total_reserved);
        tracing::debug!(
            pool = %self.name,
            slot = id,
            reserved = state.reserved.len(),
            capacity = self.capacity,
            "slot reserved"
        );

        if state.reserved.len() >= self.capacity {
            let failed = state
                .waiting
                .drain(..)
                .filter_map(|waiter| waiter.send(Err(PoolError::PoolFullyReserved)).ok())
                .count();
            MetricsTracker::record_many(&self.metrics.fully_reserved_failures, failed);
            tracing::warn!(pool = %self.name, failed_waiters = failed, "pool fully reserved");
        }
    }

    fn counts(&self) -> SlotCounts {
        self.state.lock().counts()
    }
}

/// A take that is waiting in the queue.
///
/// If it is dropped after a slot was already delivered, the slot is released
/// again so it reaches the next waiter or the free stack.
struct PendingTake<'a, T> {
    receiver: oneshot::Receiver<Delivery<T>>,
    pool: &'a PoolInner<T>,
}

impl<T> PendingTake<'_, T> {
    async fn wait(&mut self) -> PoolResult<SlotEntry<T>> {
        // A waiter is only dropped unsent once the pool can never serve it.
        (&mut self.receiver)
            .await
            .unwrap_or(Err(PoolError::PoolFullyReserved))
    }
}

impl<T> Drop for PendingTake<'_, T> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Ok(Ok(entry)) = self.receiver.try_recv() {
            tracing::trace!(pool = %self.pool.name, slot = entry.id, "abandoned take returned its slot");
            self.pool.release(entry);
        }
    }
}

/// A borrowed slot that returns to the pool when dropped
///
/// Methods are associated functions (`Slot::reserve(slot)`) so they never
/// shadow methods of the wrapped resource reached through `Deref`.
#[must_use = "dropping a slot immediately returns it to the pool"]
pub struct Slot<T> {
    entry: Option<SlotEntry<T>>,
    pool: Arc<PoolInner<T>>,
}

impl<T> Slot<T> {
    fn new(entry: SlotEntry<T>, pool: Arc<PoolInner<T>>) -> Self {
        Self {
            entry: Some(entry),
            pool,
        }
    }

    fn entry(&self) -> &SlotEntry<T> {
        self.entry.as_ref().expect("Slot already consumed")
    }

    /// Stable id of the underlying slot, in `0..capacity`
    pub fn id(this: &Self) -> usize {
        this.entry().id
    }

    /// Read access to the wrapped resource
    pub fn resource(this: &Self) -> &T {
        &this.entry().resource
    }

    /// Write access to the wrapped resource
    pub fn resource_mut(this: &mut Self) -> &mut T {
        &mut this.entry.as_mut().expect("Slot already consumed").resource
    }

    /// Permanently withdraw this slot from the pool.
    ///
    /// The caller keeps the resource; the slot never becomes free again. When
    /// this reserves the last unreserved slot, every queued take fails with
    /// [`PoolError::PoolFullyReserved`].
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::{PoolError, ResourcePool, Slot};
    ///
    /// let pool = ResourcePool::<Vec<u8>>::new(1).unwrap();
    /// let slot = pool.try_take().unwrap();
    /// let buffer: Vec<u8> = Slot::reserve(slot);
    /// assert!(buffer.is_empty());
    ///
    /// assert_eq!(pool.try_take().unwrap_err(), PoolError::PoolFullyReserved);
    /// ```
    pub fn reserve(mut this: Self) -> T {
        let entry = this.entry.take().expect("Slot already consumed");
        this.pool.reserve(entry.id);
        entry.resource
    }
}

impl<T> Deref for Slot<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        Slot::resource(self)
    }
}

impl<T> DerefMut for Slot<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        Slot::resource_mut(self)
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.pool.release(entry);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Slot");
        if let Some(entry) = &self.entry {
            debug.field("id", &entry.id).field("resource", &entry.resource);
        }
        debug.finish()
    }
}

/// Thread-safe pool with a fixed number of eagerly created slots
///
/// Cloning the pool is cheap; all clones share the same slots.
pub struct ResourcePool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.inner.counts();
        f.debug_struct("ResourcePool")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("free", &counts.free)
            .field("reserved", &counts.reserved)
            .field("checked_out", &counts.checked_out)
            .field("waiting", &counts.waiting)
            .finish()
    }
}

impl<T: Default + Send + 'static> ResourcePool<T> {
    /// Create a pool of `capacity` default-constructed resources
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::{PoolError, ResourcePool};
    ///
    /// let pool = ResourcePool::<String>::new(2).unwrap();
    /// assert_eq!(pool.free_count(), 2);
    ///
    /// assert_eq!(ResourcePool::<String>::new(0).unwrap_err(), PoolError::InvalidCapacity(0));
    /// ```
    pub fn new(capacity: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfiguration::new().with_capacity(capacity))
    }

    /// Create a pool of default-constructed resources from a configuration
    pub fn with_config(config: PoolConfiguration) -> PoolResult<Self> {
        Self::with_factory(config, T::default)
    }
}

impl<T: Send + 'static> ResourcePool<T> {
    /// Create a pool, calling `factory` exactly `config.capacity` times up front
    pub fn with_factory<F>(config: PoolConfiguration, mut factory: F) -> PoolResult<Self>
    where
        F: FnMut() -> T,
    {
        if config.capacity == 0 {
            return Err(PoolError::InvalidCapacity(config.capacity));
        }

        let mut free: Vec<_> = (0..config.capacity)
            .map(|id| SlotEntry {
                id,
                resource: factory(),
            })
            .collect();
        // Slot 0 sits on top of the stack.
        free.reverse();

        tracing::debug!(pool = %config.pool_name, capacity = config.capacity, "resource pool created");

        Ok(Self {
            inner: Arc::new(PoolInner {
                capacity: config.capacity,
                name: config.pool_name,
                state: Mutex::new(PoolState {
                    free,
                    reserved: Vec::with_capacity(config.capacity),
                    waiting: VecDeque::new(),
                    checked_out: 0,
                }),
                metrics: MetricsTracker::new(),
            }),
        })
    }

    /// Take a slot, waiting in FIFO order when none is free
    ///
    /// Fails with [`PoolError::PoolFullyReserved`] once every slot has been
    /// reserved, including for takes that were already waiting. There is no
    /// timeout.
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::{ResourcePool, Slot};
    ///
    /// # tokio_test_block_on(async {
    /// let pool = ResourcePool::<u32>::new(1).unwrap();
    /// {
    ///     let mut slot = pool.take().await.unwrap();
    ///     *slot += 1;
    /// }
    /// let slot = pool.take().await.unwrap();
    /// assert_eq!(*slot, 1);
    /// assert_eq!(Slot::id(&slot), 0);
    /// # });
    /// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
    /// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
    /// # }
    /// ```
    pub async fn take(&self) -> PoolResult<Slot<T>> {
        let receiver = match self.inner.begin_take()? {
            Ticket::Ready(entry) => return Ok(self.wrap(entry)),
            Ticket::Queued(receiver) => receiver,
        };

        let mut pending = PendingTake {
            receiver,
            pool: &self.inner,
        };
        let entry = pending.wait().await?;
        Ok(self.wrap(entry))
    }

    /// Take a slot, blocking the current thread while waiting
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn take_blocking(&self) -> PoolResult<Slot<T>> {
        let receiver = match self.inner.begin_take()? {
            Ticket::Ready(entry) => return Ok(self.wrap(entry)),
            Ticket::Queued(receiver) => receiver,
        };

        let entry = receiver
            .blocking_recv()
            .unwrap_or(Err(PoolError::PoolFullyReserved))?;
        Ok(self.wrap(entry))
    }

    /// Take a slot only if one is free right now and nobody is waiting
    pub fn try_take(&self) -> PoolResult<Slot<T>> {
        let entry = {
            let mut state = self.inner.state.lock();
            self.inner.take_now(&mut state)?
        };
        entry.map(|entry| self.wrap(entry)).ok_or(PoolError::PoolEmpty)
    }

    fn wrap(&self, entry: SlotEntry<T>) -> Slot<T> {
        Slot::new(entry, Arc::clone(&self.inner))
    }

    /// Get health status
    pub fn get_health_status(&self) -> HealthStatus {
        let counts = self.inner.counts();
        HealthStatus::new(
            counts.free,
            counts.checked_out,
            counts.reserved,
            counts.waiting,
            self.inner.capacity,
        )
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format, labelled with the pool name
    pub fn export_metrics_prometheus(&self, tags: Option<&HashMap<String, String>>) -> String {
        MetricsExporter::export_prometheus(&self.get_metrics(), &self.inner.name, tags)
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.inner
            .metrics
            .get_metrics(self.inner.counts(), self.inner.capacity)
    }

    /// Fixed number of slots
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Name used in logs and metrics
    pub fn pool_name(&self) -> &str {
        &self.inner.name
    }

    pub fn free_count(&self) -> usize {
        self.inner.counts().free
    }

    pub fn reserved_count(&self) -> usize {
        self.inner.counts().reserved
    }

    pub fn checked_out_count(&self) -> usize {
        self.inner.counts().checked_out
    }

    /// Takes currently queued for a slot
    pub fn waiting_count(&self) -> usize {
        self.inner.counts().waiting
    }

    /// Whether every slot has been reserved
    pub fn is_fully_reserved(&self) -> bool {
        self.inner.counts().reserved >= self.inner.capacity
    }
}
