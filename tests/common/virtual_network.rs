use std::collections::BTreeMap;

use nexthop::concepts::envelope::Recipient;
use nexthop::concepts::link::LinkUpdate;
use nexthop::framework::{RoutingEngine, RoutingSystem};

pub struct VirtualSystem;

impl RoutingSystem for VirtualSystem {
    type NodeId = String;
}

/// In-memory substrate: owns the nodes, applies link events to both
/// endpoints, and shuttles encoded envelopes between neighbours. The clock is
/// a counter bumped before every event, so timestamps are strictly
/// increasing and every run is reproducible.
pub struct VirtualNetwork<E: RoutingEngine<VirtualSystem>> {
    pub nodes: BTreeMap<String, E>,
    pub links: BTreeMap<(String, String), u32>,
    pub in_flight: Vec<(String, Vec<u8>)>,
    pub clock: u64,
}

impl<E: RoutingEngine<VirtualSystem>> VirtualNetwork<E> {
    pub fn create(nodes: &[&str], links: &[(&str, &str, u32)]) -> Self {
        let mut net = Self {
            nodes: nodes
                .iter()
                .map(|id| (id.to_string(), E::new(id.to_string())))
                .collect(),
            links: BTreeMap::new(),
            in_flight: Vec::new(),
            clock: 0,
        };
        for (a, b, cost) in links {
            net.set_link(a, b, *cost);
        }
        net
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a < b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn set_link(&mut self, a: &str, b: &str, cost: u32) {
        self.links.insert(Self::key(a, b), cost);
        self.apply(a, b, LinkUpdate::Up(cost));
    }

    pub fn drop_link(&mut self, a: &str, b: &str) {
        self.links.remove(&Self::key(a, b));
        self.apply(a, b, LinkUpdate::Down);
    }

    fn apply(&mut self, a: &str, b: &str, update: LinkUpdate) {
        for (at, other) in [(a, b), (b, a)] {
            self.clock += 1;
            let now = self.clock;
            if let Some(node) = self.nodes.get_mut(at) {
                node.update_link(other.to_string(), update, now);
            }
        }
        self.flush_outbound();
    }

    pub fn neighbours_of(&self, id: &str) -> Vec<String> {
        self.links
            .keys()
            .filter_map(|(a, b)| {
                if a == id {
                    Some(b.clone())
                } else if b == id {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn flush_outbound(&mut self) {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        for id in ids {
            let outbound = self.nodes.get_mut(&id).unwrap().drain_outbound();
            for out in outbound {
                let bytes = out.envelope.encode().unwrap();
                match out.to {
                    Recipient::Neighbour(n) => {
                        // only deliverable while the link is still up
                        if self.links.contains_key(&Self::key(&id, &n)) {
                            self.in_flight.push((n, bytes));
                        }
                    }
                    Recipient::AllNeighbours => {
                        for n in self.neighbours_of(&id) {
                            self.in_flight.push((n, bytes.clone()));
                        }
                    }
                }
            }
        }
    }

    /// Delivers everything currently in flight, then collects whatever that
    /// produced.
    pub fn tick(&mut self) {
        let pending = std::mem::take(&mut self.in_flight);
        for (to, bytes) in pending {
            self.clock += 1;
            let now = self.clock;
            if let Some(node) = self.nodes.get_mut(&to) {
                node.handle_message(&bytes, now).unwrap();
            }
        }
        self.flush_outbound();
    }

    /// Ticks until no messages remain in flight.
    pub fn converge(&mut self) {
        for _ in 0..1000 {
            if self.in_flight.is_empty() {
                return;
            }
            self.tick();
        }
        panic!("network failed to converge");
    }

    pub fn idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn next_hop(&self, at: &str, dest: &str) -> Option<String> {
        self.nodes.get(at).unwrap().next_hop(&dest.to_string())
    }

    /// Cost of the path implied by chaining forwarding tables from `from` to
    /// `to`, summing real link costs. `None` if any node has no route.
    pub fn forward_cost(&self, from: &str, to: &str) -> Option<u32> {
        let mut cur = from.to_string();
        let mut total = 0;
        for _ in 0..self.nodes.len() {
            if cur == to {
                return Some(total);
            }
            let hop = self.next_hop(&cur, to)?;
            total += self.links.get(&Self::key(&cur, &hop))?;
            cur = hop;
        }
        if cur == to {
            Some(total)
        } else {
            None // forwarding loop
        }
    }
}
