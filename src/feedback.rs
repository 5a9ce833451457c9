use thiserror::Error;

/// Faults in the wire envelope itself. Everything the protocols are designed
/// to absorb (stale timestamps, duplicate seqnos, senders that are no longer
/// neighbours) is rejected silently and never surfaces here.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("malformed wire envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The substrate delivered an envelope from the other protocol family.
    #[error("envelope is not understood by the {engine} engine")]
    WrongProtocol { engine: &'static str },
}
