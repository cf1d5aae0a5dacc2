use crate::error::{Result, StoreError};
use crate::signature::MAX_COMPONENTS;

/// Capacities and tuning parameters of an [`EntityStore`](crate::EntityStore).
///
/// # Examples
/// ```
/// use archetype_store::{EntityStore, StoreConfig};
///
/// let config = StoreConfig::default()
///     .with_max_components(64)
///     .with_result_buckets(256);
/// let store = EntityStore::with_config(config).unwrap();
/// assert_eq!(store.config().max_components, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Upper bound (exclusive) of component identifiers. At most [`MAX_COMPONENTS`].
    pub max_components: usize,
    /// Maximum number of entities that can ever be created.
    pub max_entities: u64,
    /// Maximum number of live instances of a single component type.
    pub component_capacity: usize,
    /// Maximum number of distinct archetypes.
    pub archetype_capacity: usize,
    /// Number of instances a column allocates the first time it grows.
    pub min_column_capacity: usize,
    /// Number of hash buckets in a query result set.
    pub result_buckets: usize,
}

impl StoreConfig {
    pub const DEFAULT_COMPONENT_CAPACITY: usize = 1 << 20;
    pub const DEFAULT_ARCHETYPE_CAPACITY: usize = 8192;
    pub const DEFAULT_MIN_COLUMN_CAPACITY: usize = 64;
    pub const DEFAULT_RESULT_BUCKETS: usize = 4096;

    pub fn with_max_components(mut self, max_components: usize) -> Self {
        self.max_components = max_components;
        self
    }

    pub fn with_max_entities(mut self, max_entities: u64) -> Self {
        self.max_entities = max_entities;
        self
    }

    pub fn with_component_capacity(mut self, component_capacity: usize) -> Self {
        self.component_capacity = component_capacity;
        self
    }

    pub fn with_archetype_capacity(mut self, archetype_capacity: usize) -> Self {
        self.archetype_capacity = archetype_capacity;
        self
    }

    pub fn with_min_column_capacity(mut self, min_column_capacity: usize) -> Self {
        self.min_column_capacity = min_column_capacity;
        self
    }

    pub fn with_result_buckets(mut self, result_buckets: usize) -> Self {
        self.result_buckets = result_buckets;
        self
    }

    /// Checks that the configuration describes a usable store.
    pub fn validate(&self) -> Result<()> {
        if self.max_components < 2 || self.max_components > MAX_COMPONENTS {
            return Err(StoreError::InvalidConfig(
                "max_components must be within 2..=1024",
            ));
        }
        if self.max_entities == 0 || self.max_entities == u64::MAX {
            return Err(StoreError::InvalidConfig(
                "max_entities must be within 1..u64::MAX",
            ));
        }
        if self.component_capacity == 0 {
            return Err(StoreError::InvalidConfig("component_capacity must not be zero"));
        }
        if self.archetype_capacity == 0 || self.archetype_capacity > u32::MAX as usize {
            return Err(StoreError::InvalidConfig(
                "archetype_capacity must be within 1..=u32::MAX",
            ));
        }
        if self.min_column_capacity == 0 {
            return Err(StoreError::InvalidConfig("min_column_capacity must not be zero"));
        }
        if self.result_buckets == 0 {
            return Err(StoreError::InvalidConfig("result_buckets must not be zero"));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            max_components: MAX_COMPONENTS,
            max_entities: u64::MAX - 1,
            component_capacity: Self::DEFAULT_COMPONENT_CAPACITY,
            archetype_capacity: Self::DEFAULT_ARCHETYPE_CAPACITY,
            min_column_capacity: Self::DEFAULT_MIN_COLUMN_CAPACITY,
            result_buckets: Self::DEFAULT_RESULT_BUCKETS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(StoreConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_unusable_values() {
        let cases = [
            StoreConfig::default().with_max_components(1),
            StoreConfig::default().with_max_components(MAX_COMPONENTS + 1),
            StoreConfig::default().with_max_entities(0),
            StoreConfig::default().with_component_capacity(0),
            StoreConfig::default().with_archetype_capacity(0),
            StoreConfig::default().with_min_column_capacity(0),
            StoreConfig::default().with_result_buckets(0),
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(StoreError::InvalidConfig(_))));
        }
    }
}
