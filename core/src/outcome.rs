//! Outcome vocabularies.
//!
//! [`PurchaseOutcome`] is what the backend reports. [`PurchaseResult`] and
//! [`RestoreResult`] are the closed sets callers of the session see.

use crate::product::ProductId;
use serde::{Deserialize, Serialize};

/// Raw purchase outcome reported by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// Transaction completed and verified
    Purchased,
    /// User backed out of the payment sheet
    Cancelled,
    /// Awaiting external approval (e.g. parental consent)
    Pending,
    /// Another transaction for this product is still running
    InProgress,
    /// The backend never got as far as starting the transaction
    NotStarted,
    /// The backend could not determine what happened
    Unknown,
    /// The product was not purchased
    NotPurchased,
    /// Payments are disabled for this account or device
    CannotPay,
    /// The payment system rejected the transaction
    Failed,
    /// The transaction completed but failed signature verification
    FailedVerification,
}

impl PurchaseOutcome {
    /// Stable label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchased => "purchased",
            Self::Cancelled => "cancelled",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::NotStarted => "not_started",
            Self::Unknown => "unknown",
            Self::NotPurchased => "not_purchased",
            Self::CannotPay => "cannot_pay",
            Self::Failed => "failed",
            Self::FailedVerification => "failed_verification",
        }
    }
}

impl std::fmt::Display for PurchaseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-visible result of a purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseResult {
    /// The product was purchased
    Success(ProductId),
    /// Nothing happened (user cancelled, or the backend gave up)
    UserCancelled,
    /// The purchase awaits approval
    Pending,
}

impl PurchaseResult {
    /// Folds a backend outcome into the caller-visible vocabulary
    ///
    /// Every outcome other than `Purchased` and `Pending` becomes
    /// `UserCancelled`.
    #[must_use]
    pub fn from_outcome(product_id: ProductId, outcome: PurchaseOutcome) -> Self {
        match outcome {
            PurchaseOutcome::Purchased => Self::Success(product_id),
            PurchaseOutcome::Pending => Self::Pending,
            PurchaseOutcome::Cancelled
            | PurchaseOutcome::InProgress
            | PurchaseOutcome::NotStarted
            | PurchaseOutcome::Unknown
            | PurchaseOutcome::NotPurchased
            | PurchaseOutcome::CannotPay
            | PurchaseOutcome::Failed
            | PurchaseOutcome::FailedVerification => Self::UserCancelled,
        }
    }

    /// Returns true for `Success`
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Stable label used in logs and metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::UserCancelled => "user_cancelled",
            Self::Pending => "pending",
        }
    }
}

/// Result of a user-initiated restore
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreResult {
    /// The backend reports at least one purchased product
    Success,
    /// The sync itself failed
    Failure,
    /// The sync succeeded but nothing has been purchased
    NothingToRestore,
}

impl RestoreResult {
    /// Classifies a successful sync
    #[must_use]
    pub const fn from_sync(has_purchases: bool) -> Self {
        if has_purchases {
            Self::Success
        } else {
            Self::NothingToRestore
        }
    }

    /// Stable label used in logs and metrics
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::NothingToRestore => "nothing_to_restore",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOLDED: [PurchaseOutcome; 8] = [
        PurchaseOutcome::Cancelled,
        PurchaseOutcome::InProgress,
        PurchaseOutcome::NotStarted,
        PurchaseOutcome::Unknown,
        PurchaseOutcome::NotPurchased,
        PurchaseOutcome::CannotPay,
        PurchaseOutcome::Failed,
        PurchaseOutcome::FailedVerification,
    ];

    #[test]
    fn purchased_maps_to_success_with_id() {
        let result = PurchaseResult::from_outcome(ProductId::from("tip.large"), PurchaseOutcome::Purchased);
        assert_eq!(result, PurchaseResult::Success(ProductId::from("tip.large")));
        assert!(result.is_success());
    }

    #[test]
    fn pending_stays_pending() {
        let result = PurchaseResult::from_outcome(ProductId::from("tip.large"), PurchaseOutcome::Pending);
        assert_eq!(result, PurchaseResult::Pending);
    }

    #[test]
    fn failure_states_fold_into_user_cancelled() {
        for outcome in FOLDED {
            let result = PurchaseResult::from_outcome(ProductId::from("x"), outcome);
            assert_eq!(result, PurchaseResult::UserCancelled, "outcome {outcome}");
        }
    }

    #[test]
    fn restore_classification() {
        assert_eq!(RestoreResult::from_sync(true), RestoreResult::Success);
        assert_eq!(RestoreResult::from_sync(false), RestoreResult::NothingToRestore);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_outcome() -> impl Strategy<Value = PurchaseOutcome> {
            prop::sample::select(
                [PurchaseOutcome::Purchased, PurchaseOutcome::Pending]
                    .into_iter()
                    .chain(FOLDED)
                    .collect::<Vec<_>>(),
            )
        }

        proptest! {
            #[test]
            fn only_purchased_is_success(id in "[a-z]{1,8}\\.[a-z]{1,8}", outcome in arb_outcome()) {
                let result = PurchaseResult::from_outcome(ProductId::new(id.clone()), outcome);
                prop_assert_eq!(result.is_success(), outcome == PurchaseOutcome::Purchased);
                if let PurchaseResult::Success(carried) = result {
                    prop_assert_eq!(carried.as_str(), id.as_str());
                }
            }
        }
    }
}
