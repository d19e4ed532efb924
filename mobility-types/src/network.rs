use serde::{Deserialize, Serialize};

/// A location constrained to a transportation network: a route identifier and
/// a fraction of the route length in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkPosition {
    pub route: u64,
    pub fraction: f64,
}

impl NetworkPosition {
    pub fn new(route: u64, fraction: f64) -> Self {
        Self { route, fraction }
    }

    pub fn route(&self) -> u64 {
        self.route
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn same_route(&self, other: &NetworkPosition) -> bool {
        self.route == other.route
    }
}
