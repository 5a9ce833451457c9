//! nexthop is an I/O-free routing library: each node owns its own tables,
//! consumes link/message events from an external substrate, and queues
//! outbound envelopes for the substrate to deliver.

pub mod concepts;
pub mod distance_vector;
pub mod feedback;
pub mod framework;
pub mod link_state;
