//! Pool configuration options

/// Default number of slots when none is configured
pub const DEFAULT_CAPACITY: usize = 100;

/// Default pool label used in logs and metrics
pub const DEFAULT_POOL_NAME: &str = "resource_pool";

/// Configuration for resource pool construction
///
/// # Examples
///
/// ```
/// use esox_resourcepool::PoolConfiguration;
///
/// let config = PoolConfiguration::new()
///     .with_capacity(8)
///     .with_name("db_connections");
///
/// assert_eq!(config.capacity, 8);
/// assert_eq!(config.pool_name, "db_connections");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfiguration {
    /// Number of slots, all created eagerly when the pool is built
    pub capacity: usize,

    /// Label attached to log events and metrics exports
    pub pool_name: String,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            pool_name: DEFAULT_POOL_NAME.to_string(),
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of slots
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_capacity(3);
    /// assert_eq!(config.capacity, 3);
    /// ```
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.pool_name = name.into();
        self
    }
}
