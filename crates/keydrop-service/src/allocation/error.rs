//! Allocation outcome errors.

use thiserror::Error;

use keydrop_core::error::AppError;
use keydrop_core::types::id::UserId;
use keydrop_entity::record::RecordKind;

/// Why a claim did not hand out any records.
///
/// Every variant leaves the pool untouched.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The request could not be turned into a [`super::ClaimRequest`].
    #[error("invalid claim: {0}")]
    Validation(String),

    /// No unused records of the kind are left.
    #[error("no unused {kind} records left")]
    EmptyInventory {
        /// The requested kind.
        kind: RecordKind,
    },

    /// Private delivery failed or timed out; the claim was rolled back.
    #[error("delivery to {requester} failed: {reason}")]
    DeliveryFailure {
        /// The requester who could not be reached.
        requester: UserId,
        /// What went wrong.
        reason: String,
    },

    /// The record store failed.
    #[error("storage failure: {0}")]
    Storage(#[from] AppError),
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::Validation(message) => AppError::validation(message),
            AllocationError::EmptyInventory { kind } => {
                AppError::empty_inventory(format!("No unused **{}** records left.", kind.label()))
            }
            AllocationError::DeliveryFailure { .. } => AppError::delivery(
                "I can't send you private messages. Enable them and try again.",
            ),
            AllocationError::Storage(inner) => inner,
        }
    }
}
