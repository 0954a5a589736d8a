//! Error types for the resource pool

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot has been permanently reserved; no take can ever succeed again.
    #[error("Pool is fully reserved - every slot has been permanently withdrawn")]
    PoolFullyReserved,

    #[error("Pool is empty - no slot is immediately available")]
    PoolEmpty,

    #[error("Invalid pool capacity {0} - capacity must be at least 1")]
    InvalidCapacity(usize),
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PoolError::InvalidCapacity(0).to_string(),
            "Invalid pool capacity 0 - capacity must be at least 1"
        );
        assert!(PoolError::PoolFullyReserved.to_string().contains("fully reserved"));
    }
}
