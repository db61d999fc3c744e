//! Errors returned by the replimend-events crate.

/// Errors dealing with audit events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unable to decode event payload into the specified type.
    #[error("unable to decode event payload into the specified type")]
    PayloadDecode,

    /// Unable to encode the payload attached to the event.
    #[error("unable to encode the payload attached to the event")]
    PayloadEncode,
}
