pub mod envelope;
pub mod link;
pub mod neighbour;
