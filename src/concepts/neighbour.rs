use std::collections::BTreeMap;

use educe::Educe;

use crate::framework::RoutingSystem;

/// What a distance-vector node remembers about one active neighbour: the
/// direct link cost plus the last advertisement it accepted from it.
#[derive(Educe)]
#[educe(Clone(bound()))]
pub struct Neighbour<T: RoutingSystem + ?Sized> {
    /// direct link cost to this neighbour
    pub link_cost: u32,
    /// last accepted advertised distances, empty until the first accepted
    /// advertisement arrives
    pub distances: BTreeMap<T::NodeId, u32>,
    /// last accepted advertised paths, keyed like `distances`
    pub paths: BTreeMap<T::NodeId, Vec<T::NodeId>>,
    /// timestamp of the last accepted advertisement; only replaced by a
    /// strictly greater one
    pub last_accepted: Option<u64>,
}

impl<T: RoutingSystem + ?Sized> Neighbour<T> {
    pub fn with_cost(link_cost: u32) -> Self {
        Self {
            link_cost,
            distances: BTreeMap::new(),
            paths: BTreeMap::new(),
            last_accepted: None,
        }
    }
}
