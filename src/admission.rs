// 🚦 Withdrawal Admission Policy - soft governance
//
//   projected_total = Σ partner's current withdrawals + requested amount
//   projected_total >  entitled_share  → NeedsConfirmation (never refused)
//   projected_total <= entitled_share  → Admitted
//
// Two-phase: `evaluate` only decides. Committing the pending withdrawal (or
// dropping it) is the caller's explicit choice, independent of any UI.

use crate::allocation::Allocation;
use crate::entities::{Partner, Withdrawal, WithdrawalDraft};
use crate::ledger::WithdrawalLedger;
use crate::money::{format_amount, format_percentage};
use serde::{Deserialize, Serialize};

// ============================================================================
// PENDING WITHDRAWAL
// ============================================================================

/// A proposed withdrawal stamped with its partner, not yet in the ledger
///
/// Only the admission policy hands these out; callers can inspect one and
/// pass it back, not build or edit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingWithdrawal {
    partner_id: String,
    partner_name: String,
    draft: WithdrawalDraft,
}

impl PendingWithdrawal {
    pub(crate) fn new(partner: &Partner, draft: WithdrawalDraft) -> Self {
        PendingWithdrawal {
            partner_id: partner.id.clone(),
            partner_name: partner.name.clone(),
            draft,
        }
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    pub fn partner_name(&self) -> &str {
        &self.partner_name
    }

    pub fn draft(&self) -> &WithdrawalDraft {
        &self.draft
    }

    pub fn amount(&self) -> f64 {
        self.draft.amount
    }

    /// Turn into a ledger row with a fresh identity
    pub(crate) fn into_withdrawal(self) -> Withdrawal {
        Withdrawal {
            id: uuid::Uuid::new_v4().to_string(),
            partner_id: self.partner_id,
            partner_name: self.partner_name,
            amount: self.draft.amount,
            receipt_number: self.draft.receipt_number,
            date: self.draft.date,
            recipient_name: self.draft.recipient_name,
            receipt_image: self.draft.receipt_image,
        }
    }
}

// ============================================================================
// OVERDRAW DETAILS
// ============================================================================

/// What the person confirming an over-share withdrawal needs to see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdrawDetails {
    pub partner_id: String,
    pub partner_name: String,
    pub effective_percentage: f64,
    pub entitled_share: f64,
    pub existing_total: f64,
    pub requested_amount: f64,
    pub projected_total: f64,
    /// projected_total - entitled_share (always > 0)
    pub excess: f64,
}

impl OverdrawDetails {
    /// e.g. "effective 60.00%, entitled 90,000.00, projected 95,000.00"
    pub fn basis(&self) -> String {
        format!(
            "effective {}, entitled {}, projected {}",
            format_percentage(self.effective_percentage),
            format_amount(self.entitled_share),
            format_amount(self.projected_total)
        )
    }

    pub fn message(&self, currency: &str) -> String {
        format!(
            "Warning: this withdrawal exceeds {}'s current profit share of {} {} (effective ownership {}). Total withdrawals would become {} {}, {} {} over the share.",
            self.partner_name,
            format_amount(self.entitled_share),
            currency,
            format_percentage(self.effective_percentage),
            format_amount(self.projected_total),
            currency,
            format_amount(self.excess),
            currency
        )
    }
}

// ============================================================================
// DECISION
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    /// Within the entitled share - admit without asking
    Admitted(PendingWithdrawal),

    /// Over the entitled share - admit only after explicit confirmation
    NeedsConfirmation {
        pending: PendingWithdrawal,
        details: OverdrawDetails,
    },
}

impl AdmissionDecision {
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, AdmissionDecision::NeedsConfirmation { .. })
    }

    pub fn pending(&self) -> &PendingWithdrawal {
        match self {
            AdmissionDecision::Admitted(pending) => pending,
            AdmissionDecision::NeedsConfirmation { pending, .. } => pending,
        }
    }

    pub fn details(&self) -> Option<&OverdrawDetails> {
        match self {
            AdmissionDecision::Admitted(_) => None,
            AdmissionDecision::NeedsConfirmation { details, .. } => Some(details),
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionPolicy;

impl AdmissionPolicy {
    pub fn new() -> Self {
        AdmissionPolicy
    }

    /// Decide whether `draft` fits within the partner's entitled share
    ///
    /// Only the ledger's current rows count; deleted withdrawals are gone.
    /// A partner missing from `allocation` is treated as entitled to nothing.
    pub fn evaluate(
        &self,
        partner: &Partner,
        draft: WithdrawalDraft,
        ledger: &WithdrawalLedger,
        allocation: &Allocation,
    ) -> AdmissionDecision {
        let (effective_percentage, entitled_share) = allocation
            .for_partner(&partner.id)
            .map(|a| (a.effective_percentage, a.share))
            .unwrap_or((0.0, 0.0));

        let existing_total = ledger.total_for(&partner.id);
        let requested_amount = draft.amount;
        let projected_total = existing_total + requested_amount;

        tracing::debug!(
            partner_id = %partner.id,
            existing_total,
            requested_amount,
            projected_total,
            entitled_share,
            "evaluating withdrawal"
        );

        let pending = PendingWithdrawal::new(partner, draft);

        if projected_total > entitled_share {
            AdmissionDecision::NeedsConfirmation {
                details: OverdrawDetails {
                    partner_id: partner.id.clone(),
                    partner_name: partner.name.clone(),
                    effective_percentage,
                    entitled_share,
                    existing_total,
                    requested_amount,
                    projected_total,
                    excess: projected_total - entitled_share,
                },
                pending,
            }
        } else {
            AdmissionDecision::Admitted(pending)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::ProfitAllocationEngine;
    use crate::entities::{Expense, PartnerInput, Reservation};

    fn roster() -> Vec<Partner> {
        vec![
            Partner::with_id("a".to_string(), PartnerInput::percentage("A", "Manager", 60.0, 60_000.0)),
            Partner::with_id("b".to_string(), PartnerInput::shares("B", "Investor", 400, 100.0)),
        ]
    }

    fn allocation_for(roster: &[Partner], revenue: f64, costs: f64) -> Allocation {
        ProfitAllocationEngine::new().allocate(
            roster,
            &[Reservation::with_amount("Renter", revenue)],
            &[Expense::new("Costs", costs, "2024-01-01", "ops")],
        )
    }

    fn prior(partner: &Partner, amount: f64) -> Withdrawal {
        PendingWithdrawal::new(partner, WithdrawalDraft::new(amount, "R", "Cashier")).into_withdrawal()
    }

    #[test]
    fn test_within_share_is_admitted() {
        let roster = roster();
        let allocation = allocation_for(&roster, 200_000.0, 50_000.0);
        let ledger = WithdrawalLedger::default();

        let decision = AdmissionPolicy::new().evaluate(
            &roster[0],
            WithdrawalDraft::new(10_000.0, "R-1", "A"),
            &ledger,
            &allocation,
        );

        assert!(!decision.needs_confirmation());
        assert_eq!(decision.pending().partner_name(), "A");
        assert!(decision.details().is_none());
    }

    #[test]
    fn test_over_share_needs_confirmation() {
        let roster = roster();
        let allocation = allocation_for(&roster, 200_000.0, 50_000.0);
        let ledger = WithdrawalLedger::new(vec![prior(&roster[0], 50_000.0), prior(&roster[0], 35_000.0)]);

        let decision = AdmissionPolicy::new().evaluate(
            &roster[0],
            WithdrawalDraft::new(10_000.0, "R-3", "A"),
            &ledger,
            &allocation,
        );

        let details = decision.details().expect("confirmation required");
        assert_eq!(details.effective_percentage, 60.0);
        assert_eq!(details.entitled_share, 90_000.0);
        assert_eq!(details.existing_total, 85_000.0);
        assert_eq!(details.projected_total, 95_000.0);
        assert_eq!(details.excess, 5_000.0);
        assert_eq!(
            details.basis(),
            "effective 60.00%, entitled 90,000.00, projected 95,000.00"
        );

        let message = details.message("YER");
        assert!(message.contains("90,000.00 YER"));
        assert!(message.contains("5,000.00 YER over the share"));
        assert!(message.is_ascii());
    }

    #[test]
    fn test_exact_share_boundary_is_admitted() {
        let roster = roster();
        let allocation = allocation_for(&roster, 200_000.0, 50_000.0);
        let ledger = WithdrawalLedger::new(vec![prior(&roster[0], 80_000.0)]);
        let policy = AdmissionPolicy::new();

        let exact = policy.evaluate(&roster[0], WithdrawalDraft::new(10_000.0, "R", "A"), &ledger, &allocation);
        assert!(!exact.needs_confirmation());

        let over = policy.evaluate(&roster[0], WithdrawalDraft::new(10_000.01, "R", "A"), &ledger, &allocation);
        assert!(over.needs_confirmation());
    }

    #[test]
    fn test_net_loss_always_needs_confirmation() {
        let roster = roster();
        let allocation = allocation_for(&roster, 10_000.0, 30_000.0);

        let decision = AdmissionPolicy::new().evaluate(
            &roster[1],
            WithdrawalDraft::new(0.01, "R", "B"),
            &WithdrawalLedger::default(),
            &allocation,
        );

        let details = decision.details().unwrap();
        assert!(details.entitled_share < 0.0);
    }

    #[test]
    fn test_other_partners_withdrawals_do_not_count() {
        let roster = roster();
        let allocation = allocation_for(&roster, 200_000.0, 50_000.0);
        let ledger = WithdrawalLedger::new(vec![prior(&roster[1], 60_000.0)]);

        let decision = AdmissionPolicy::new().evaluate(
            &roster[0],
            WithdrawalDraft::new(90_000.0, "R", "A"),
            &ledger,
            &allocation,
        );
        assert!(!decision.needs_confirmation());
    }

    #[test]
    fn test_unknown_partner_is_entitled_to_nothing() {
        let roster = roster();
        let allocation = allocation_for(&roster, 200_000.0, 50_000.0);
        let stranger = Partner::with_id("x".to_string(), PartnerInput::shares("X", "Guest", 1, 1.0));

        let decision = AdmissionPolicy::new().evaluate(
            &stranger,
            WithdrawalDraft::new(1.0, "R", "X"),
            &WithdrawalLedger::default(),
            &allocation,
        );
        assert_eq!(decision.details().unwrap().entitled_share, 0.0);
    }

    #[test]
    fn test_pending_into_withdrawal_stamps_partner() {
        let roster = roster();
        let draft = WithdrawalDraft::new(500.0, "R-77", "Cashier").on("2024-02-02");
        let w = PendingWithdrawal::new(&roster[1], draft).into_withdrawal();

        assert!(!w.id.is_empty());
        assert_eq!(w.partner_id, "b");
        assert_eq!(w.partner_name, "B");
        assert_eq!(w.receipt_number, "R-77");
        assert_eq!(w.date, "2024-02-02");
    }
}
