//! Errors from and for store backends.
use replimend_models::InstanceKey;

/// The store has no record of the expected instance.
#[derive(Debug, thiserror::Error)]
#[error("the store has no record of instance '{key}'")]
pub struct InstanceNotFound {
    pub key: InstanceKey,
}

impl InstanceNotFound {
    pub fn new(key: InstanceKey) -> InstanceNotFound {
        InstanceNotFound { key }
    }
}

/// No active recovery exists for the instance being resolved.
#[derive(Debug, thiserror::Error)]
#[error("no active recovery exists for instance '{key}'")]
pub struct RecoveryNotActive {
    pub key: InstanceKey,
}

impl RecoveryNotActive {
    pub fn new(key: InstanceKey) -> RecoveryNotActive {
        RecoveryNotActive { key }
    }
}
