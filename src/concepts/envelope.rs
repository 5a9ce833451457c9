use std::collections::BTreeMap;

use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::concepts::link::LinkKey;
use crate::feedback::EnvelopeError;
use crate::framework::RoutingSystem;

/// Tagged wire envelope exchanged between neighbours. Engines only ever emit
/// their own variant; the other one is rejected on receive.
#[derive(Educe, Serialize, Deserialize)]
#[educe(Clone(bound()))]
#[serde(bound = "")]
pub enum Envelope<T: RoutingSystem + ?Sized> {
    DistanceVector(DvAdvertisement<T>),
    LinkState(Lsa<T>),
}

impl<T: RoutingSystem + ?Sized> Envelope<T> {
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A full-table advertisement from a distance-vector neighbour: its entire
/// distance vector and path table, stamped with the sender's clock.
#[serde_as]
#[derive(Educe, Serialize, Deserialize)]
#[educe(Clone(bound()))]
#[serde(bound = "")]
pub struct DvAdvertisement<T: RoutingSystem + ?Sized> {
    #[serde_as(as = "Vec<(_, _)>")]
    pub distances: BTreeMap<T::NodeId, u32>,
    /// hops strictly after the sender; the sender itself is excluded
    #[serde_as(as = "Vec<(_, _)>")]
    pub paths: BTreeMap<T::NodeId, Vec<T::NodeId>>,
    pub sent_at: u64,
    pub sender: T::NodeId,
}

/// A flooded link-state advertisement describing one link's current cost.
#[derive(Educe, Serialize, Deserialize)]
#[educe(Clone(bound()))]
#[serde(bound = "")]
pub struct Lsa<T: RoutingSystem + ?Sized> {
    pub link: LinkKey<T>,
    /// `None` retracts the link
    pub cost: Option<u32>,
    pub seqno: u64,
    /// rewritten at every hop, so a corrective resend can be unicast back to
    /// the immediate sender
    pub relayer: T::NodeId,
}

/// An envelope queued by an engine, waiting for the substrate to drain and
/// deliver it.
#[derive(Educe)]
#[educe(Clone(bound()))]
pub struct OutboundEnvelope<T: RoutingSystem + ?Sized> {
    pub to: Recipient<T>,
    pub envelope: Envelope<T>,
}

#[derive(Educe)]
#[educe(Clone(bound()))]
pub enum Recipient<T: RoutingSystem + ?Sized> {
    Neighbour(T::NodeId),
    AllNeighbours,
}
