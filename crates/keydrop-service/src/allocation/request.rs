//! Validated claim requests.

use keydrop_core::config::allocation::MAX_CLAIM_QUANTITY;
use keydrop_core::types::id::UserId;
use keydrop_entity::record::RecordKind;

use super::error::AllocationError;

/// A claim that has passed boundary validation.
///
/// The only way to build one is [`ClaimRequest::new`], so every request the
/// engine sees has a known kind and a quantity in `1..=50`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    kind: RecordKind,
    quantity: u32,
    requester: UserId,
    requester_tag: Option<String>,
}

impl ClaimRequest {
    /// Validate raw command options.
    ///
    /// Unknown kinds are rejected. Quantities are clamped, never rejected:
    /// a missing count means one.
    pub fn new(
        service: &str,
        count: Option<i64>,
        requester: UserId,
    ) -> Result<Self, AllocationError> {
        let kind = service
            .parse::<RecordKind>()
            .map_err(|e| AllocationError::Validation(e.to_string()))?;

        Ok(Self {
            kind,
            quantity: clamp_quantity(count),
            requester,
            requester_tag: None,
        })
    }

    /// Attach the requester's display tag for audit messages.
    pub fn with_requester_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.requester_tag = (!tag.trim().is_empty()).then_some(tag);
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn requester(&self) -> UserId {
        self.requester
    }

    pub fn requester_tag(&self) -> Option<&str> {
        self.requester_tag.as_deref()
    }
}

/// Clamp a requested count into `1..=MAX_CLAIM_QUANTITY`.
pub fn clamp_quantity(count: Option<i64>) -> u32 {
    let wanted = count.unwrap_or(1).clamp(1, i64::from(MAX_CLAIM_QUANTITY));
    u32::try_from(wanted).unwrap_or(1)
}
