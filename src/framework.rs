use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::concepts::envelope::OutboundEnvelope;
use crate::concepts::link::LinkUpdate;
use crate::feedback::EnvelopeError;

pub trait RoutingSystem {
    /// Identifier of a node on the routing network, MUST be globally unique
    type NodeId: Ord + PartialOrd + RootData + RootKey + Debug + Display;
}

pub trait RootData: Clone + Serialize + DeserializeOwned + Sized {}
pub trait RootKey: Eq + PartialEq + Hash {}
impl<T: Eq + PartialEq + Hash> RootKey for T {}
impl<T: Clone + Serialize + DeserializeOwned + Sized> RootData for T {}

/// The contract every routing engine offers to the substrate. The substrate
/// drives an engine one event at a time and drains whatever it queued in
/// response; the engine itself never performs I/O.
///
/// `now` is the substrate's clock, passed in on every event. Identical event
/// sequences (with identical `now` values) must produce identical state.
pub trait RoutingEngine<T: RoutingSystem + ?Sized> {
    fn new(address: T::NodeId) -> Self
    where
        Self: Sized;

    fn address(&self) -> &T::NodeId;

    /// The link to `neighbour` came up, changed cost, or went down.
    fn update_link(&mut self, neighbour: T::NodeId, update: LinkUpdate, now: u64);

    /// A wire envelope arrived from a neighbour. Adverse input (stale,
    /// duplicate, or from a removed neighbour) is dropped silently; only a
    /// payload this engine cannot parse at all is an error.
    fn handle_message(&mut self, bytes: &[u8], now: u64) -> Result<(), EnvelopeError>;

    /// The neighbour traffic for `dest` should be forwarded to, if any.
    fn next_hop(&self, dest: &T::NodeId) -> Option<T::NodeId>;

    /// Takes the envelopes queued since the last drain.
    fn drain_outbound(&mut self) -> Vec<OutboundEnvelope<T>>;

    /// Human-readable forwarding table; identical state yields identical text.
    fn dump(&self) -> String;
}
