//! Health monitoring for resource pools

/// Health status of a resource pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::ResourcePool;
///
/// let pool = ResourcePool::<u64>::new(3).unwrap();
///
/// let health = pool.get_health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.free_slots, 3);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Checked-out share of capacity (0.0 to 1.0)
    pub utilization: f64,

    /// Free slots
    pub free_slots: usize,

    /// Slots held by callers
    pub checked_out_slots: usize,

    /// Slots permanently reserved
    pub reserved_slots: usize,

    /// Takes waiting for a slot
    pub waiting_requests: usize,

    /// Total capacity
    pub total_capacity: usize,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Create a new health status
    pub fn new(
        free: usize,
        checked_out: usize,
        reserved: usize,
        waiting: usize,
        capacity: usize,
    ) -> Self {
        let utilization = if capacity > 0 {
            checked_out as f64 / capacity as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if capacity > 0 && reserved >= capacity {
            warnings.push("Pool is fully reserved".to_string());
            is_healthy = false;
        } else if reserved * 2 > capacity {
            warnings.push(format!("{} of {} slots reserved", reserved, capacity));
        }

        if utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        if free == 0 && reserved < capacity {
            warnings.push("No free slots".to_string());
        }

        if waiting > 0 {
            warnings.push(format!("{} takes waiting for a slot", waiting));
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization,
            free_slots: free,
            checked_out_slots: checked_out,
            reserved_slots: reserved,
            waiting_requests: waiting,
            total_capacity: capacity,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_reserved_is_unhealthy() {
        let health = HealthStatus::new(0, 0, 2, 0, 2);
        assert!(!health.is_healthy());
        assert_eq!(health.warnings, vec!["Pool is fully reserved".to_string()]);
    }

    #[test]
    fn test_saturated_pool_with_waiters() {
        let health = HealthStatus::new(0, 4, 0, 3, 4);
        assert!(!health.is_healthy());
        assert_eq!(health.warning_count, 3);
        assert!(health.warnings.contains(&"3 takes waiting for a slot".to_string()));
    }

    #[test]
    fn test_reservation_erosion_warns_but_stays_healthy() {
        let health = HealthStatus::new(1, 0, 3, 0, 4);
        assert!(health.is_healthy());
        assert_eq!(health.warnings, vec!["3 of 4 slots reserved".to_string()]);
    }
}
