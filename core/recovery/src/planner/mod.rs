//! Promotion planning: choose successors and re-parent orphaned replicas.
use anyhow::Result;

use replimend_context::Context;
use replimend_events::Audit;
use replimend_events::Event;
use replimend_models::InstanceKey;

use crate::events;

pub(crate) mod intermediate;
pub(crate) mod primary;

/// Audit per-replica errors from a promotion that still took action.
pub(crate) async fn audit_partial_errors(
    context: &Context,
    audit: &Audit,
    failed: &InstanceKey,
    errors: &[String],
) -> Result<()> {
    let event = Event::new_with_payload(
        events::PROMOTION_PARTIAL_ERRORS,
        events::PromotionPartialErrors {
            failed: failed.clone(),
            errors: errors.to_vec(),
        },
    )?;
    audit.audit(context, event).await
}
