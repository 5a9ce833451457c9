use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use log::{debug, trace};

use crate::concepts::envelope::{DvAdvertisement, Envelope, OutboundEnvelope, Recipient};
use crate::concepts::link::LinkUpdate;
use crate::concepts::neighbour::Neighbour;
use crate::feedback::EnvelopeError;
use crate::framework::{RoutingEngine, RoutingSystem};

/// Path-vector distance-vector engine. Every route carries its full hop
/// sequence, and a candidate whose advertised path already contains this node
/// is discarded outright, so count-to-infinity cannot occur.
pub struct DistanceVectorRouter<T: RoutingSystem + ?Sized> {
    pub address: T::NodeId,
    pub neighbours: BTreeMap<T::NodeId, Neighbour<T>>,
    /// destination to cost of the selected route; the self entry is always 0
    pub distances: BTreeMap<T::NodeId, u32>,
    /// destination to hop sequence of the selected route, this node excluded;
    /// the self entry is always empty
    pub paths: BTreeMap<T::NodeId, Vec<T::NodeId>>,
    pub outbound: Vec<OutboundEnvelope<T>>,
}

impl<T: RoutingSystem + ?Sized> DistanceVectorRouter<T> {
    pub fn new(address: T::NodeId) -> Self {
        let mut distances = BTreeMap::new();
        let mut paths = BTreeMap::new();
        distances.insert(address.clone(), 0);
        paths.insert(address.clone(), Vec::new());
        Self {
            address,
            neighbours: BTreeMap::new(),
            distances,
            paths,
            outbound: Vec::new(),
        }
    }

    pub fn update_link(&mut self, neighbour: T::NodeId, update: LinkUpdate, now: u64) {
        match update {
            LinkUpdate::Up(cost) => {
                self.neighbours
                    .entry(neighbour)
                    .and_modify(|n| n.link_cost = cost)
                    .or_insert_with(|| Neighbour::with_cost(cost));
            }
            LinkUpdate::Down => {
                // forget the neighbour entirely, cached advertisement included
                self.neighbours.remove(&neighbour);
            }
        }
        if self.recompute() {
            self.broadcast(now);
        }
    }

    pub fn handle_advertisement(&mut self, adv: DvAdvertisement<T>, now: u64) {
        let Some(neigh) = self.neighbours.get_mut(&adv.sender) else {
            // a message that outlived its link
            debug!("{}: dropping advertisement from non-neighbour {}", self.address, adv.sender);
            return;
        };
        if let Some(last) = neigh.last_accepted {
            if adv.sent_at <= last {
                trace!(
                    "{}: dropping stale advertisement from {} (sent_at {} <= {})",
                    self.address, adv.sender, adv.sent_at, last
                );
                return;
            }
        }
        neigh.last_accepted = Some(adv.sent_at);
        neigh.distances = adv.distances;
        neigh.paths = adv.paths;
        if self.recompute() {
            self.broadcast(now);
        }
    }

    /// Rebuilds the distance vector and path table from the cached neighbour
    /// advertisements, returning whether either changed.
    ///
    /// Equal-cost candidates are broken by ascending neighbour id: the scan
    /// runs in id order and only a strictly cheaper candidate replaces the
    /// current best.
    pub fn recompute(&mut self) -> bool {
        let mut distances = BTreeMap::new();
        let mut paths = BTreeMap::new();
        distances.insert(self.address.clone(), 0);
        paths.insert(self.address.clone(), Vec::new());

        let mut destinations: BTreeSet<T::NodeId> = BTreeSet::new();
        for neigh in self.neighbours.values() {
            destinations.extend(neigh.distances.keys().cloned());
        }

        for dest in &destinations {
            if *dest == self.address {
                continue;
            }
            let mut best: Option<(u32, Vec<T::NodeId>)> = None;
            for (addr, neigh) in &self.neighbours {
                let Some(&advertised) = neigh.distances.get(dest) else {
                    continue;
                };
                let Some(path) = neigh.paths.get(dest) else {
                    continue;
                };
                if path.contains(&self.address) {
                    // routing through ourselves would loop
                    continue;
                }
                let cost = neigh.link_cost.saturating_add(advertised);
                let better = match &best {
                    None => true,
                    Some((selected, _)) => cost < *selected,
                };
                if better {
                    let mut full = Vec::with_capacity(path.len() + 1);
                    full.push(addr.clone());
                    full.extend(path.iter().cloned());
                    best = Some((cost, full));
                }
            }
            if let Some((cost, path)) = best {
                distances.insert(dest.clone(), cost);
                paths.insert(dest.clone(), path);
            }
        }

        // a direct link beats (or bootstraps) anything learned second-hand
        for (addr, neigh) in &self.neighbours {
            let direct_wins = match distances.get(addr) {
                Some(&selected) => neigh.link_cost < selected,
                None => true,
            };
            if direct_wins {
                distances.insert(addr.clone(), neigh.link_cost);
                paths.insert(addr.clone(), vec![addr.clone()]);
            }
        }

        debug_assert!(paths
            .iter()
            .all(|(dest, path)| *dest == self.address || !path.contains(&self.address)));

        let changed = distances != self.distances || paths != self.paths;
        self.distances = distances;
        self.paths = paths;
        changed
    }

    fn broadcast(&mut self, now: u64) {
        trace!("{}: tables changed, broadcasting at {}", self.address, now);
        let adv = DvAdvertisement {
            distances: self.distances.clone(),
            paths: self.paths.clone(),
            sent_at: now,
            sender: self.address.clone(),
        };
        self.outbound.push(OutboundEnvelope {
            to: Recipient::AllNeighbours,
            envelope: Envelope::DistanceVector(adv),
        });
    }
}

impl<T: RoutingSystem + ?Sized> RoutingEngine<T> for DistanceVectorRouter<T> {
    fn new(address: T::NodeId) -> Self {
        Self::new(address)
    }

    fn address(&self) -> &T::NodeId {
        &self.address
    }

    fn update_link(&mut self, neighbour: T::NodeId, update: LinkUpdate, now: u64) {
        Self::update_link(self, neighbour, update, now)
    }

    fn handle_message(&mut self, bytes: &[u8], now: u64) -> Result<(), EnvelopeError> {
        match Envelope::decode(bytes)? {
            Envelope::DistanceVector(adv) => {
                self.handle_advertisement(adv, now);
                Ok(())
            }
            Envelope::LinkState(_) => Err(EnvelopeError::WrongProtocol {
                engine: "distance-vector",
            }),
        }
    }

    fn next_hop(&self, dest: &T::NodeId) -> Option<T::NodeId> {
        self.paths.get(dest).and_then(|path| path.first().cloned())
    }

    fn drain_outbound(&mut self) -> Vec<OutboundEnvelope<T>> {
        std::mem::take(&mut self.outbound)
    }

    fn dump(&self) -> String {
        self.to_string()
    }
}

impl<T: RoutingSystem + ?Sized> Display for DistanceVectorRouter<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "node {}", self.address)?;
        for (dest, path) in &self.paths {
            let Some(hop) = path.first() else {
                continue; // self entry
            };
            if let Some(cost) = self.distances.get(dest) {
                writeln!(f, "  {dest}: via {hop}, cost {cost}")?;
            }
        }
        Ok(())
    }
}
