//! Process-wide catalog of temporal types and the network topology.
//!
//! The catalog is created lazily on first use and pre-populated with every
//! combination of value kind and duration. Decoders and casts consult it
//! before producing a container; the network topology registered here
//! resolves route geometry for network positions.

use crate::error::{MobilityError, Result};
use crate::network::NetworkTopology;
use crate::temporal::DurationKind;
use mobility_types::value::ValueKind;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A registered temporal type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub id: u16,
    pub name: String,
    pub kind: ValueKind,
    pub duration: DurationKind,
}

pub struct Catalog {
    types: RwLock<FxHashMap<(ValueKind, DurationKind), TypeEntry>>,
    network: RwLock<Option<Arc<dyn NetworkTopology>>>,
}

static GLOBAL: Lazy<Catalog> = Lazy::new(Catalog::with_builtin_types);

impl Catalog {
    /// Empty catalog, with no types and no network.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(FxHashMap::default()),
            network: RwLock::new(None),
        }
    }

    /// Catalog holding the sixteen built-in types.
    pub fn with_builtin_types() -> Self {
        let catalog = Self::new();
        for kind in ValueKind::ALL {
            for duration in DurationKind::ALL {
                catalog.register(kind, duration);
            }
        }
        catalog
    }

    /// The shared catalog used by constructors and codecs.
    pub fn global() -> &'static Catalog {
        &GLOBAL
    }

    /// Register a type and return its id. Registering twice keeps the
    /// original entry.
    pub fn register(&self, kind: ValueKind, duration: DurationKind) -> u16 {
        let mut types = self.types.write();
        if let Some(entry) = types.get(&(kind, duration)) {
            return entry.id;
        }
        let id = ((kind.tag() as u16) << 8) | duration.tag() as u16;
        let entry = TypeEntry {
            id,
            name: format!("{}{}", kind.name(), duration.suffix()),
            kind,
            duration,
        };
        log::debug!("Registered temporal type {} ({:#06x})", entry.name, id);
        types.insert((kind, duration), entry);
        id
    }

    pub fn unregister(&self, kind: ValueKind, duration: DurationKind) -> Option<TypeEntry> {
        self.types.write().remove(&(kind, duration))
    }

    pub fn lookup(&self, kind: ValueKind, duration: DurationKind) -> Option<TypeEntry> {
        self.types.read().get(&(kind, duration)).cloned()
    }

    pub fn lookup_name(&self, name: &str) -> Option<TypeEntry> {
        self.types
            .read()
            .values()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Entry for a type, or `UnregisteredType` when it is missing.
    pub fn ensure_registered(&self, kind: ValueKind, duration: DurationKind) -> Result<TypeEntry> {
        self.lookup(kind, duration)
            .ok_or_else(|| MobilityError::UnregisteredType {
                kind,
                duration: duration.to_string(),
            })
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Install the topology used to resolve network positions.
    pub fn set_network(&self, network: Arc<dyn NetworkTopology>) {
        *self.network.write() = Some(network);
    }

    pub fn clear_network(&self) -> Option<Arc<dyn NetworkTopology>> {
        self.network.write().take()
    }

    pub fn network(&self) -> Option<Arc<dyn NetworkTopology>> {
        self.network.read().clone()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("types", &self.len())
            .field("network", &self.network.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InMemoryNetwork;
    use geo::line_string;

    #[test]
    fn test_builtin_types() {
        let catalog = Catalog::with_builtin_types();
        assert_eq!(catalog.len(), 16);

        let entry = catalog
            .ensure_registered(ValueKind::GeomPoint, DurationKind::Sequence)
            .unwrap();
        assert_eq!(entry.name, "tgeompointseq");
        assert_eq!(
            catalog.lookup_name("TFLOATINST").map(|e| e.duration),
            Some(DurationKind::Instant)
        );
    }

    #[test]
    fn test_unregistered_type() {
        let catalog = Catalog::with_builtin_types();
        catalog.unregister(ValueKind::NetworkPoint, DurationKind::SequenceSet);
        let err = catalog
            .ensure_registered(ValueKind::NetworkPoint, DurationKind::SequenceSet)
            .unwrap_err();
        assert!(matches!(err, MobilityError::UnregisteredType { .. }));

        let id = catalog.register(ValueKind::NetworkPoint, DurationKind::SequenceSet);
        assert_eq!(catalog.register(ValueKind::NetworkPoint, DurationKind::SequenceSet), id);
    }

    #[test]
    fn test_network_slot() {
        let catalog = Catalog::new();
        assert!(catalog.network().is_none());

        let network = InMemoryNetwork::new(0)
            .with_route(5, line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)])
            .unwrap();
        catalog.set_network(Arc::new(network));
        assert_eq!(catalog.network().unwrap().route_length(5), Some(1.0));
        assert!(catalog.clear_network().is_some());
        assert!(catalog.network().is_none());
    }
}
