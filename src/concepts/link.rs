use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::framework::RoutingSystem;

/// A link event delivered by the substrate. Costs are latencies, always
/// non-negative; removal is its own variant rather than a sentinel value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LinkUpdate {
    /// the link is up, with this cost (a fresh link or a cost change)
    Up(u32),
    /// the link has been torn down
    Down,
}

impl LinkUpdate {
    pub fn cost(&self) -> Option<u32> {
        match self {
            LinkUpdate::Up(cost) => Some(*cost),
            LinkUpdate::Down => None,
        }
    }
}

/// An unordered pair of endpoints identifying one bidirectional link.
/// Normalized on construction, so {a, b} and {b, a} compare equal and a
/// link-cost graph keyed by it stays symmetric.
#[derive(Educe, Serialize, Deserialize)]
#[educe(
    Clone(bound()),
    PartialEq(bound()),
    Eq,
    PartialOrd,
    Ord(bound())
)]
#[serde(bound = "")]
pub struct LinkKey<T: RoutingSystem + ?Sized> {
    lo: T::NodeId,
    hi: T::NodeId,
}

impl<T: RoutingSystem + ?Sized> LinkKey<T> {
    pub fn new(a: T::NodeId, b: T::NodeId) -> Self {
        if b < a {
            Self { lo: b, hi: a }
        } else {
            Self { lo: a, hi: b }
        }
    }

    pub fn endpoints(&self) -> (&T::NodeId, &T::NodeId) {
        (&self.lo, &self.hi)
    }
}
