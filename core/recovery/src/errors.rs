//! Errors from and for the recovery core.
use replimend_models::InstanceKey;

/// No replica could be promoted in place of the failed instance.
#[derive(Debug, thiserror::Error)]
#[error("recovery of '{failed}' could not promote a successor: {reason}")]
pub struct PromotionFailure {
    pub failed: InstanceKey,
    pub reason: String,
}

impl PromotionFailure {
    pub fn new<R>(failed: InstanceKey, reason: R) -> PromotionFailure
    where
        R: Into<String>,
    {
        PromotionFailure {
            failed,
            reason: reason.into(),
        }
    }
}
