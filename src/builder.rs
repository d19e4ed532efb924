//! Index builder for collecting boxes before construction
//!
//! The octree is built in one pass over the whole batch, so boxes are
//! gathered here first and the tree is created by [`IndexBuilder::build`].

use crate::config::Config;
use crate::error::{MobilityError, Result};
use crate::index::BoxOctree;
use crate::temporal::Temporal;
use mobility_types::bbox::BoundingBox;

/// Builder gathering keyed boxes and the configuration for a [`BoxOctree`].
#[derive(Debug)]
pub struct IndexBuilder<K> {
    entries: Vec<(K, BoundingBox)>,
    config: Config,
}

impl<K> IndexBuilder<K> {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            config: Config::default(),
        }
    }

    /// Set the configuration (depth and leaf limits).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn insert(mut self, key: K, bbox: BoundingBox) -> Self {
        self.entries.push((key, bbox));
        self
    }

    /// Index a temporal value by its cached bounding volume.
    pub fn insert_temporal(self, key: K, temporal: &Temporal) -> Self {
        let bbox = *temporal.bbox();
        self.insert(key, bbox)
    }

    pub fn extend(mut self, entries: impl IntoIterator<Item = (K, BoundingBox)>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate the configuration and build the tree.
    pub fn build(self) -> Result<BoxOctree<K>> {
        self.config.validate().map_err(MobilityError::InvalidConfig)?;
        BoxOctree::build(self.entries, &self.config.index)
    }
}

impl<K> Default for IndexBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}
