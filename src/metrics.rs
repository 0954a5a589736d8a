//! Metrics collection and export for resource pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::ResourcePool;
///
/// let pool = ResourcePool::<String>::new(3).unwrap();
///
/// {
///     let _slot = pool.try_take().unwrap();
///     let metrics = pool.get_metrics();
///     assert_eq!(metrics.total_taken, 1);
///     assert_eq!(metrics.checked_out_slots, 1);
///     assert_eq!(metrics.free_slots, 2);
/// }
///
/// assert_eq!(pool.get_metrics().total_released, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Total slots handed out, directly or through a waiter
    pub total_taken: usize,

    /// Total slots returned by dropping a handle
    pub total_released: usize,

    /// Total slots permanently withdrawn
    pub total_reserved: usize,

    /// Number of takes that had to queue
    pub total_waits: usize,

    /// Takes failed because the pool is fully reserved
    pub fully_reserved_failures: usize,

    /// Slots currently free
    pub free_slots: usize,

    /// Slots currently reserved
    pub reserved_slots: usize,

    /// Slots currently held by callers
    pub checked_out_slots: usize,

    /// Takes currently queued
    pub waiting_requests: usize,

    /// Checked-out share of capacity (0.0 to 1.0)
    pub utilization: f64,

    /// Fixed pool capacity
    pub capacity: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_taken".to_string(), self.total_taken.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_reserved".to_string(), self.total_reserved.to_string());
        metrics.insert("total_waits".to_string(), self.total_waits.to_string());
        metrics.insert(
            "fully_reserved_failures".to_string(),
            self.fully_reserved_failures.to_string(),
        );
        metrics.insert("free_slots".to_string(), self.free_slots.to_string());
        metrics.insert("reserved_slots".to_string(), self.reserved_slots.to_string());
        metrics.insert("checked_out_slots".to_string(), self.checked_out_slots.to_string());
        metrics.insert("waiting_requests".to_string(), self.waiting_requests.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("capacity".to_string(), self.capacity.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::{PoolConfiguration, ResourcePool};
    /// use std::collections::HashMap;
    ///
    /// let config = PoolConfiguration::new().with_capacity(2).with_name("buffers");
    /// let pool = ResourcePool::<Vec<u8>>::with_config(config).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus(Some(&tags));
    /// assert!(output.contains("resourcepool_slots_free{pool=\"buffers\""));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let labels = Self::format_labels(pool_name, tags);
        let mut output = String::new();

        let gauges = [
            ("resourcepool_slots_free", "Slots currently free", metrics.free_slots),
            ("resourcepool_slots_reserved", "Slots permanently reserved", metrics.reserved_slots),
            ("resourcepool_slots_checked_out", "Slots held by callers", metrics.checked_out_slots),
            ("resourcepool_waiters", "Takes waiting for a slot", metrics.waiting_requests),
            ("resourcepool_capacity", "Fixed pool capacity", metrics.capacity),
        ];
        for (name, help, value) in gauges {
            Self::push_metric(&mut output, name, help, "gauge", &labels, &value.to_string());
        }

        Self::push_metric(
            &mut output,
            "resourcepool_utilization",
            "Checked-out share of capacity",
            "gauge",
            &labels,
            &format!("{:.2}", metrics.utilization),
        );

        let counters = [
            ("resourcepool_takes_total", "Total slots taken", metrics.total_taken),
            ("resourcepool_releases_total", "Total slots released", metrics.total_released),
            ("resourcepool_reservations_total", "Total slots reserved", metrics.total_reserved),
            ("resourcepool_waits_total", "Takes that had to wait", metrics.total_waits),
            (
                "resourcepool_fully_reserved_failures_total",
                "Takes failed on a fully reserved pool",
                metrics.fully_reserved_failures,
            ),
        ];
        for (name, help, value) in counters {
            Self::push_metric(&mut output, name, help, "counter", &labels, &value.to_string());
        }

        output
    }

    fn push_metric(output: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: &str) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", Self::escape_label_value(pool_name))];

        if let Some(tags) = tags {
            let mut extra: Vec<_> = tags.iter().collect();
            extra.sort();
            for (key, value) in extra {
                labels.push(format!("{}=\"{}\"", key, Self::escape_label_value(value)));
            }
        }

        labels.join(",")
    }

    /// Escapes `\\`, `"` and newlines as the exposition format requires
    fn escape_label_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}

/// Slot counts read under the pool lock
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SlotCounts {
    pub free: usize,
    pub reserved: usize,
    pub checked_out: usize,
    pub waiting: usize,
}

/// Internal metrics tracker
pub(crate) struct MetricsTracker {
    pub total_taken: AtomicUsize,
    pub total_released: AtomicUsize,
    pub total_reserved: AtomicUsize,
    pub total_waits: AtomicUsize,
    pub fully_reserved_failures: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            total_taken: AtomicUsize::new(0),
            total_released: AtomicUsize::new(0),
            total_reserved: AtomicUsize::new(0),
            total_waits: AtomicUsize::new(0),
            fully_reserved_failures: AtomicUsize::new(0),
        }
    }

    pub fn record(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_many(counter: &AtomicUsize, count: usize) {
        counter.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, counts: SlotCounts, capacity: usize) -> PoolMetrics {
        let utilization = if capacity > 0 {
            counts.checked_out as f64 / capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_taken: self.total_taken.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_reserved: self.total_reserved.load(Ordering::Relaxed),
            total_waits: self.total_waits.load(Ordering::Relaxed),
            fully_reserved_failures: self.fully_reserved_failures.load(Ordering::Relaxed),
            free_slots: counts.free,
            reserved_slots: counts.reserved,
            checked_out_slots: counts.checked_out,
            waiting_requests: counts.waiting,
            utilization,
            capacity,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}
