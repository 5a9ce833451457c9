use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use log::{debug, trace};

use crate::concepts::envelope::{Envelope, Lsa, OutboundEnvelope, Recipient};
use crate::concepts::link::{LinkKey, LinkUpdate};
use crate::feedback::EnvelopeError;
use crate::framework::{RoutingEngine, RoutingSystem};

/// Link-state engine. Every node floods sequence-numbered per-link
/// advertisements, retains the highest seqno seen per link, and derives next
/// hops from the resulting global link-cost graph with Dijkstra. Flood
/// termination comes entirely from the seqno dedup.
pub struct LinkStateRouter<T: RoutingSystem + ?Sized> {
    pub address: T::NodeId,
    /// symmetric adjacency: both directions are inserted and removed together
    pub topology: BTreeMap<T::NodeId, BTreeMap<T::NodeId, u32>>,
    /// highest-seqno advertisement accepted per link
    pub retained: BTreeMap<LinkKey<T>, Lsa<T>>,
    pub next_hops: BTreeMap<T::NodeId, T::NodeId>,
    pub outbound: Vec<OutboundEnvelope<T>>,
}

impl<T: RoutingSystem + ?Sized> LinkStateRouter<T> {
    pub fn new(address: T::NodeId) -> Self {
        Self {
            address,
            topology: BTreeMap::new(),
            retained: BTreeMap::new(),
            next_hops: BTreeMap::new(),
            outbound: Vec::new(),
        }
    }

    pub fn update_link(&mut self, neighbour: T::NodeId, update: LinkUpdate) {
        match update {
            LinkUpdate::Up(cost) => {
                self.insert_edge(self.address.clone(), neighbour.clone(), cost);
            }
            LinkUpdate::Down => {
                self.remove_edge(&self.address.clone(), &neighbour);
            }
        }

        let key = LinkKey::new(self.address.clone(), neighbour.clone());
        let seqno = match self.retained.get(&key) {
            Some(prev) => prev.seqno + 1,
            None => {
                // brand-new neighbour: it knows nothing of the graph yet, so
                // replay everything we retain before announcing the new link
                let replay: Vec<Lsa<T>> = self.retained.values().cloned().collect();
                for lsa in replay {
                    self.send(Recipient::Neighbour(neighbour.clone()), lsa);
                }
                0
            }
        };
        let lsa = Lsa {
            link: key,
            cost: update.cost(),
            seqno,
            relayer: self.address.clone(),
        };
        self.retained.insert(lsa.link.clone(), lsa.clone());
        self.send(Recipient::AllNeighbours, lsa);

        self.recompute();
    }

    pub fn handle_lsa(&mut self, lsa: Lsa<T>) {
        if let Some(retained) = self.retained.get(&lsa.link) {
            if retained.seqno > lsa.seqno {
                // the relayer is behind; push the newer advertisement back
                debug!(
                    "{}: correcting {} (has seqno {}, we retain {})",
                    self.address, lsa.relayer, lsa.seqno, retained.seqno
                );
                let newer = retained.clone();
                self.send(Recipient::Neighbour(lsa.relayer), newer);
                return;
            }
            if retained.seqno == lsa.seqno {
                trace!("{}: duplicate seqno {}, flood converged", self.address, lsa.seqno);
                return;
            }
        }

        let (a, b) = lsa.link.endpoints();
        match lsa.cost {
            Some(cost) => self.insert_edge(a.clone(), b.clone(), cost),
            None => {
                let (a, b) = (a.clone(), b.clone());
                self.remove_edge(&a, &b);
            }
        }
        self.retained.insert(lsa.link.clone(), lsa.clone());
        self.recompute();
        self.send(Recipient::AllNeighbours, lsa);
    }

    fn insert_edge(&mut self, a: T::NodeId, b: T::NodeId, cost: u32) {
        self.topology
            .entry(a.clone())
            .or_default()
            .insert(b.clone(), cost);
        self.topology.entry(b).or_default().insert(a, cost);
    }

    fn remove_edge(&mut self, a: &T::NodeId, b: &T::NodeId) {
        for (x, y) in [(a, b), (b, a)] {
            if let Some(adj) = self.topology.get_mut(x) {
                adj.remove(y);
                if adj.is_empty() {
                    self.topology.remove(x);
                }
            }
        }
    }

    fn send(&mut self, to: Recipient<T>, mut lsa: Lsa<T>) {
        lsa.relayer = self.address.clone();
        self.outbound.push(OutboundEnvelope {
            to,
            envelope: Envelope::LinkState(lsa),
        });
    }

    /// Dijkstra over the link-cost graph, linear-scan minimum selection. The
    /// next visited node is the unvisited one with the smallest tentative
    /// cost, smallest id on ties. Unreachable nodes simply get no entry.
    pub fn recompute(&mut self) {
        let mut unvisited: BTreeMap<&T::NodeId, u64> =
            self.topology.keys().map(|n| (n, u64::MAX)).collect();
        unvisited.insert(&self.address, 0);
        let mut prev: BTreeMap<&T::NodeId, &T::NodeId> = BTreeMap::new();

        loop {
            let Some((node, cost)) = unvisited
                .iter()
                .map(|(n, c)| (*n, *c))
                .min_by_key(|&(n, c)| (c, n))
            else {
                break;
            };
            if cost == u64::MAX {
                break; // the rest is disconnected
            }
            unvisited.remove(node);
            let Some(adj) = self.topology.get(node) else {
                continue;
            };
            for (next, &edge) in adj {
                if let Some(tentative) = unvisited.get_mut(next) {
                    let candidate = cost + edge as u64;
                    if candidate < *tentative {
                        *tentative = candidate;
                        prev.insert(next, node);
                    }
                }
            }
        }

        // backtrack each reachable node to the direct neighbour it is
        // reached through
        let mut next_hops = BTreeMap::new();
        for &node in prev.keys() {
            let mut cur = node;
            let hop = loop {
                match prev.get(cur) {
                    Some(&p) if *p == self.address => break Some(cur),
                    Some(&p) => cur = p,
                    None => break None,
                }
            };
            if let Some(hop) = hop {
                next_hops.insert(node.clone(), hop.clone());
            }
        }
        self.next_hops = next_hops;
    }
}

impl<T: RoutingSystem + ?Sized> RoutingEngine<T> for LinkStateRouter<T> {
    fn new(address: T::NodeId) -> Self {
        Self::new(address)
    }

    fn address(&self) -> &T::NodeId {
        &self.address
    }

    fn update_link(&mut self, neighbour: T::NodeId, update: LinkUpdate, _now: u64) {
        Self::update_link(self, neighbour, update)
    }

    fn handle_message(&mut self, bytes: &[u8], _now: u64) -> Result<(), EnvelopeError> {
        match Envelope::decode(bytes)? {
            Envelope::LinkState(lsa) => {
                self.handle_lsa(lsa);
                Ok(())
            }
            Envelope::DistanceVector(_) => Err(EnvelopeError::WrongProtocol {
                engine: "link-state",
            }),
        }
    }

    fn next_hop(&self, dest: &T::NodeId) -> Option<T::NodeId> {
        self.next_hops.get(dest).cloned()
    }

    fn drain_outbound(&mut self) -> Vec<OutboundEnvelope<T>> {
        std::mem::take(&mut self.outbound)
    }

    fn dump(&self) -> String {
        self.to_string()
    }
}

impl<T: RoutingSystem + ?Sized> Display for LinkStateRouter<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "node {}", self.address)?;
        for (dest, hop) in &self.next_hops {
            writeln!(f, "  {dest}: via {hop}")?;
        }
        Ok(())
    }
}
