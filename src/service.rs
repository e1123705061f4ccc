// 🧭 Partners Service - read → decide → write → persist
//
// Every mutation loads the collections it needs, applies one change in
// memory and saves each touched collection whole. Nothing is cached between
// calls, so allocations always reflect the latest roster and books.
//
// Reads for display degrade to empty; reads that feed a write do not, so an
// unreadable collection is reported instead of being saved over.

use crate::admission::{AdmissionDecision, AdmissionPolicy, OverdrawDetails, PendingWithdrawal};
use crate::allocation::{Allocation, PartnerAllocation, ProfitAllocationEngine, RosterShareCheck};
use crate::entities::{Employee, Expense, Partner, PartnerInput, Reservation, Withdrawal, WithdrawalDraft};
use crate::error::{PartnersError, Result};
use crate::ledger::{OrphanGroup, WithdrawalLedger};
use crate::roster::{OrphanPolicy, PartnerRoster};
use crate::settings::currency_of;
use crate::store::{CollectionStore, EMPLOYEES, EXPENSES, PARTNERS, RESERVATIONS, WITHDRAWALS};
use serde::Serialize;

/// Outcome of proposing a withdrawal
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    /// Within share: already in the ledger and persisted
    Admitted(Withdrawal),

    /// Over share: nothing written yet; call `confirm_withdrawal` or `cancel_withdrawal`
    NeedsConfirmation {
        pending: PendingWithdrawal,
        details: OverdrawDetails,
    },
}

/// One partner's position: entitlement vs. what was already drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerStatement {
    pub partner: Partner,
    pub allocation: PartnerAllocation,
    pub total_withdrawn: f64,
    pub withdrawal_count: usize,
    /// share - total_withdrawn (negative when over-drawn)
    pub remaining: f64,
}

pub struct PartnersService<S: CollectionStore> {
    store: S,
    engine: ProfitAllocationEngine,
    policy: AdmissionPolicy,
    orphan_policy: OrphanPolicy,
}

impl<S: CollectionStore> PartnersService<S> {
    pub fn new(store: S) -> Self {
        PartnersService {
            store,
            engine: ProfitAllocationEngine::new(),
            policy: AdmissionPolicy::new(),
            orphan_policy: OrphanPolicy::default(),
        }
    }

    pub fn with_orphan_policy(mut self, orphan_policy: OrphanPolicy) -> Self {
        self.orphan_policy = orphan_policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphan_policy
    }

    pub fn currency(&self) -> String {
        currency_of(&self.store)
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    pub fn partners(&self) -> Vec<Partner> {
        PARTNERS.load(&self.store)
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        RESERVATIONS.load(&self.store)
    }

    pub fn expenses(&self) -> Vec<Expense> {
        EXPENSES.load(&self.store)
    }

    pub fn employees(&self) -> Vec<Employee> {
        EMPLOYEES.load(&self.store)
    }

    pub fn ledger(&self) -> WithdrawalLedger {
        WithdrawalLedger::new(WITHDRAWALS.load(&self.store))
    }

    fn roster_for_update(&self) -> Result<PartnerRoster> {
        Ok(PartnerRoster::new(PARTNERS.load_for_update(&self.store)?))
    }

    fn ledger_for_update(&self) -> Result<WithdrawalLedger> {
        Ok(WithdrawalLedger::new(WITHDRAWALS.load_for_update(&self.store)?))
    }

    pub fn partner(&self, id: &str) -> Result<Partner> {
        self.partners()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PartnersError::PartnerNotFound(id.to_string()))
    }

    // ========================================================================
    // ROSTER
    // ========================================================================

    pub fn create_partner(&self, input: PartnerInput) -> Result<Partner> {
        let mut roster = self.roster_for_update()?;
        let partner = roster.create(input)?;
        PARTNERS.save(&self.store, roster.partners())?;

        tracing::info!(partner_id = %partner.id, name = %partner.name, method = %partner.share_method, "partner created");
        Ok(partner)
    }

    pub fn update_partner(&self, id: &str, input: PartnerInput) -> Result<Partner> {
        let mut roster = self.roster_for_update()?;
        let partner = roster.update(id, input)?;
        PARTNERS.save(&self.store, roster.partners())?;

        tracing::info!(partner_id = %partner.id, name = %partner.name, "partner updated");
        Ok(partner)
    }

    /// Delete a partner; its withdrawals are left alone (see `OrphanPolicy`)
    pub fn delete_partner(&self, id: &str) -> Result<Partner> {
        let mut roster = self.roster_for_update()?;
        let ledger = self.ledger();
        let removed = roster.delete(id, &ledger, self.orphan_policy)?;
        PARTNERS.save(&self.store, roster.partners())?;

        let orphaned = ledger.count_for(id);
        if orphaned > 0 {
            tracing::warn!(partner_id = %id, orphaned, "partner deleted, withdrawal history retained");
        } else {
            tracing::info!(partner_id = %id, "partner deleted");
        }
        Ok(removed)
    }

    pub fn share_check(&self) -> RosterShareCheck {
        RosterShareCheck::evaluate(&self.partners())
    }

    // ========================================================================
    // ALLOCATION
    // ========================================================================

    /// Allocation of the current roster against the current books
    pub fn allocation(&self) -> Allocation {
        self.engine
            .allocate(&self.partners(), &self.reservations(), &self.expenses())
    }

    pub fn statements(&self) -> Vec<PartnerStatement> {
        let partners = self.partners();
        let allocation = self
            .engine
            .allocate(&partners, &self.reservations(), &self.expenses());
        let ledger = self.ledger();

        partners
            .into_iter()
            .zip(allocation.partners)
            .map(|(partner, allocation)| {
                let total_withdrawn = ledger.total_for(&partner.id);
                PartnerStatement {
                    withdrawal_count: ledger.count_for(&partner.id),
                    remaining: allocation.share - total_withdrawn,
                    total_withdrawn,
                    allocation,
                    partner,
                }
            })
            .collect()
    }

    // ========================================================================
    // WITHDRAWALS
    // ========================================================================

    /// Phase one: validate and evaluate a withdrawal for `partner_id`
    ///
    /// Within share it is committed right away. Over share nothing is
    /// written until the caller confirms.
    pub fn propose_withdrawal(&self, partner_id: &str, draft: WithdrawalDraft) -> Result<Proposal> {
        draft.validate()?;

        let partners = self.partners();
        let partner = partners
            .iter()
            .find(|p| p.id == partner_id)
            .ok_or_else(|| PartnersError::PartnerNotFound(partner_id.to_string()))?;

        let allocation = self
            .engine
            .allocate(&partners, &self.reservations(), &self.expenses());
        let ledger = self.ledger();

        match self.policy.evaluate(partner, draft, &ledger, &allocation) {
            AdmissionDecision::Admitted(pending) => Ok(Proposal::Admitted(self.commit(pending)?)),
            AdmissionDecision::NeedsConfirmation { pending, details } => {
                tracing::debug!(partner_id = %partner_id, basis = %details.basis(), "withdrawal needs confirmation");
                Ok(Proposal::NeedsConfirmation { pending, details })
            }
        }
    }

    /// Phase two (accept): admit an over-share withdrawal
    ///
    /// The draft is validated again and the partner must still be on the
    /// roster; it may have been deleted since the proposal.
    pub fn confirm_withdrawal(&self, pending: PendingWithdrawal) -> Result<Withdrawal> {
        pending.draft().validate()?;
        if !self.partners().iter().any(|p| p.id == pending.partner_id()) {
            return Err(PartnersError::PartnerNotFound(pending.partner_id().to_string()));
        }

        tracing::warn!(
            partner_id = %pending.partner_id(),
            amount = pending.amount(),
            "over-share withdrawal confirmed"
        );
        self.commit(pending)
    }

    /// Phase two (decline): discard the proposal; nothing was written
    pub fn cancel_withdrawal(&self, pending: PendingWithdrawal) {
        tracing::info!(
            partner_id = %pending.partner_id(),
            amount = pending.amount(),
            "withdrawal cancelled"
        );
    }

    fn commit(&self, pending: PendingWithdrawal) -> Result<Withdrawal> {
        let mut ledger = self.ledger_for_update()?;
        let withdrawal = pending.into_withdrawal();
        ledger.append(withdrawal.clone());
        WITHDRAWALS.save(&self.store, ledger.entries())?;

        tracing::info!(
            withdrawal_id = %withdrawal.id,
            partner_id = %withdrawal.partner_id,
            amount = withdrawal.amount,
            "withdrawal admitted"
        );
        Ok(withdrawal)
    }

    pub fn withdrawals_for(&self, partner_id: &str) -> Vec<Withdrawal> {
        self.ledger().list(partner_id).into_iter().cloned().collect()
    }

    /// Delete a ledger row; shares are not re-checked
    pub fn remove_withdrawal(&self, id: &str) -> Result<Withdrawal> {
        let mut ledger = self.ledger_for_update()?;
        let removed = ledger
            .remove(id)
            .ok_or_else(|| PartnersError::WithdrawalNotFound(id.to_string()))?;
        WITHDRAWALS.save(&self.store, ledger.entries())?;

        tracing::info!(withdrawal_id = %id, partner_id = %removed.partner_id, "withdrawal removed");
        Ok(removed)
    }

    // ========================================================================
    // BOOKS
    // ========================================================================

    /// Append imported reservations; returns the new total
    pub fn import_reservations(&self, imported: Vec<Reservation>) -> Result<usize> {
        let mut reservations = RESERVATIONS.load_for_update(&self.store)?;
        let count = imported.len();
        reservations.extend(imported);
        RESERVATIONS.save(&self.store, &reservations)?;

        tracing::info!(imported = count, total = reservations.len(), "reservations imported");
        Ok(reservations.len())
    }

    /// Append imported expenses; returns the new total
    pub fn import_expenses(&self, imported: Vec<Expense>) -> Result<usize> {
        let mut expenses = EXPENSES.load_for_update(&self.store)?;
        let count = imported.len();
        expenses.extend(imported);
        EXPENSES.save(&self.store, &expenses)?;

        tracing::info!(imported = count, total = expenses.len(), "expenses imported");
        Ok(expenses.len())
    }

    /// Append imported employees; returns the new total
    pub fn import_employees(&self, imported: Vec<Employee>) -> Result<usize> {
        let mut employees = EMPLOYEES.load_for_update(&self.store)?;
        let count = imported.len();
        employees.extend(imported);
        EMPLOYEES.save(&self.store, &employees)?;

        tracing::info!(imported = count, total = employees.len(), "employees imported");
        Ok(employees.len())
    }

    /// Withdrawals whose partner has been deleted
    pub fn orphaned_withdrawals(&self) -> Vec<Withdrawal> {
        let partners = self.partners();
        self.ledger().orphans(&partners).into_iter().cloned().collect()
    }

    pub fn orphan_groups(&self) -> Vec<OrphanGroup> {
        self.ledger().orphan_groups(&self.partners())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};

    /// Roster A (60% / 60,000) + B (400 × 100), revenue 200,000, expenses 50,000
    fn scenario<S: CollectionStore>(store: S) -> (PartnersService<S>, Partner, Partner) {
        RESERVATIONS
            .save(&store, &[
                Reservation::with_amount("Wedding", 120_000.0),
                Reservation::with_amount("Engagement", 80_000.0),
            ])
            .unwrap();
        EXPENSES
            .save(&store, &[
                Expense::new("Catering", 30_000.0, "2024-01-10", "food"),
                Expense::new("Power", 20_000.0, "2024-01-11", "utilities"),
            ])
            .unwrap();

        let service = PartnersService::new(store);
        let a = service
            .create_partner(PartnerInput::percentage("A", "Manager", 60.0, 60_000.0))
            .unwrap();
        let b = service
            .create_partner(PartnerInput::shares("B", "Investor", 400, 100.0))
            .unwrap();
        (service, a, b)
    }

    fn admit(service: &PartnersService<impl CollectionStore>, partner_id: &str, amount: f64) -> Withdrawal {
        match service
            .propose_withdrawal(partner_id, WithdrawalDraft::new(amount, "R", "Cashier"))
            .unwrap()
        {
            Proposal::Admitted(w) => w,
            Proposal::NeedsConfirmation { pending, .. } => service.confirm_withdrawal(pending).unwrap(),
        }
    }

    #[test]
    fn test_end_to_end_overdraw_requires_confirmation() {
        let (service, a, _) = scenario(MemoryStore::new());

        let allocation = service.allocation();
        assert_eq!(allocation.net_profit, 150_000.0);
        assert_eq!(allocation.total_company_investment, 100_000.0);
        assert_eq!(allocation.for_partner(&a.id).unwrap().share, 90_000.0);

        admit(&service, &a.id, 50_000.0);
        admit(&service, &a.id, 35_000.0);
        assert_eq!(service.withdrawals_for(&a.id).len(), 2);

        let proposal = service
            .propose_withdrawal(&a.id, WithdrawalDraft::new(10_000.0, "R-3", "A"))
            .unwrap();

        let Proposal::NeedsConfirmation { pending, details } = proposal else {
            panic!("expected confirmation to be required");
        };
        assert_eq!(details.basis(), "effective 60.00%, entitled 90,000.00, projected 95,000.00");

        // nothing written before the decision
        assert_eq!(service.withdrawals_for(&a.id).len(), 2);

        let confirmed = service.confirm_withdrawal(pending).unwrap();
        assert_eq!(confirmed.partner_name, "A");
        assert_eq!(service.ledger().total_for(&a.id), 95_000.0);
    }

    #[test]
    fn test_cancel_leaves_ledger_untouched() {
        let (service, a, _) = scenario(MemoryStore::new());
        admit(&service, &a.id, 85_000.0);

        let proposal = service
            .propose_withdrawal(&a.id, WithdrawalDraft::new(10_000.0, "R", "A"))
            .unwrap();
        let Proposal::NeedsConfirmation { pending, .. } = proposal else {
            panic!("expected confirmation to be required");
        };
        service.cancel_withdrawal(pending);

        assert_eq!(service.ledger().len(), 1);
        assert_eq!(service.ledger().total_for(&a.id), 85_000.0);
    }

    #[test]
    fn test_confirm_revalidates_the_draft() {
        let (service, a, _) = scenario(MemoryStore::new());

        let draft = WithdrawalDraft {
            amount: -500.0,
            receipt_number: "R".to_string(),
            recipient_name: "A".to_string(),
            date: "not-a-date".to_string(),
            receipt_image: None,
        };
        let result = service.confirm_withdrawal(PendingWithdrawal::new(&a, draft));

        let Err(PartnersError::Validation(errors)) = result else {
            panic!("expected validation errors");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"amount"));
        assert!(fields.contains(&"date"));
        assert!(service.ledger().is_empty());
    }

    #[test]
    fn test_confirm_requires_partner_on_roster() {
        let (service, a, _) = scenario(MemoryStore::new());

        let ghost = Partner::with_id("ghost".to_string(), PartnerInput::shares("G", "Nobody", 1, 1.0));
        let result = service.confirm_withdrawal(PendingWithdrawal::new(&ghost, WithdrawalDraft::new(10.0, "R", "G")));
        assert!(matches!(result, Err(PartnersError::PartnerNotFound(id)) if id == "ghost"));

        // deleted between proposal and confirmation
        admit(&service, &a.id, 85_000.0);
        let proposal = service
            .propose_withdrawal(&a.id, WithdrawalDraft::new(10_000.0, "R", "A"))
            .unwrap();
        let Proposal::NeedsConfirmation { pending, .. } = proposal else {
            panic!("expected confirmation to be required");
        };
        service.delete_partner(&a.id).unwrap();

        assert!(matches!(
            service.confirm_withdrawal(pending),
            Err(PartnersError::PartnerNotFound(_))
        ));
        assert_eq!(service.ledger().total_for(&a.id), 85_000.0);
    }

    #[test]
    fn test_fractional_shares_keep_the_roster_readable() {
        let store = MemoryStore::new();
        store
            .write_raw(
                "partners",
                r#"[
                    {"id": "a", "name": "A", "position": "Manager", "shareMethod": "percentage", "sharePercentage": 60, "totalInvested": 60000},
                    {"id": "b", "name": "B", "position": "Investor", "shareMethod": "shares", "numberOfShares": 2.5, "shareValue": 100}
                ]"#,
            )
            .unwrap();
        let service = PartnersService::new(store);
        assert_eq!(service.partners().len(), 2);

        service
            .create_partner(PartnerInput::percentage("C", "Partner", 10.0, 1_000.0))
            .unwrap();
        let names: Vec<String> = service.partners().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_unreadable_collections_are_not_overwritten() {
        let store = MemoryStore::new();
        let bad_roster = r#"[{"id": "a", "name": "A", "shareMethod": "bonds"}]"#;
        let bad_ledger = r#"[{"id": "w1", "partnerId": "x"}]"#;
        store.write_raw("partners", bad_roster).unwrap();
        store.write_raw("withdrawals", bad_ledger).unwrap();
        let service = PartnersService::new(store);

        // display reads degrade to empty
        assert!(service.partners().is_empty());
        assert!(service.ledger().is_empty());

        let created = service.create_partner(PartnerInput::percentage("C", "Partner", 10.0, 1_000.0));
        assert!(matches!(created, Err(PartnersError::Store(_))));
        assert_eq!(service.store().read_raw("partners").unwrap().as_deref(), Some(bad_roster));

        assert!(service.remove_withdrawal("w1").is_err());
        assert_eq!(service.store().read_raw("withdrawals").unwrap().as_deref(), Some(bad_ledger));
    }

    #[test]
    fn test_unreadable_ledger_blocks_new_withdrawals() {
        let (service, a, _) = scenario(MemoryStore::new());
        service.store().write_raw("withdrawals", "{not json").unwrap();

        let result = service.propose_withdrawal(&a.id, WithdrawalDraft::new(1_000.0, "R", "A"));
        assert!(matches!(result, Err(PartnersError::Store(_))));
        assert_eq!(service.store().read_raw("withdrawals").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_imports_append_to_the_books() {
        let (service, _, _) = scenario(MemoryStore::new());

        assert_eq!(service.import_reservations(vec![Reservation::with_amount("Gala", 10_000.0)]).unwrap(), 3);
        assert_eq!(service.import_expenses(vec![]).unwrap(), 2);
        assert_eq!(service.allocation().net_profit, 160_000.0);

        let employee = Employee {
            id: "e1".to_string(),
            name: "Samir".to_string(),
            position: "Guard".to_string(),
            salary: 60_000.0,
            hire_date: "2023-04-01".to_string(),
        };
        assert_eq!(service.import_employees(vec![employee.clone()]).unwrap(), 1);
        assert_eq!(service.employees(), vec![employee]);
    }

    #[test]
    fn test_within_share_is_committed_immediately() {
        let (service, _, b) = scenario(MemoryStore::new());

        let proposal = service
            .propose_withdrawal(&b.id, WithdrawalDraft::new(60_000.0, "R-1", "B"))
            .unwrap();
        assert!(matches!(proposal, Proposal::Admitted(_)));
        assert_eq!(service.withdrawals_for(&b.id).len(), 1);
    }

    #[test]
    fn test_invalid_draft_is_rejected_before_any_write() {
        let (service, a, _) = scenario(MemoryStore::new());

        let result = service.propose_withdrawal(&a.id, WithdrawalDraft::new(-1.0, "R", "A"));
        assert!(matches!(result, Err(PartnersError::Validation(_))));
        assert!(service.ledger().is_empty());
    }

    #[test]
    fn test_unknown_partner() {
        let (service, _, _) = scenario(MemoryStore::new());
        let result = service.propose_withdrawal("ghost", WithdrawalDraft::new(1.0, "R", "X"));
        assert!(matches!(result, Err(PartnersError::PartnerNotFound(_))));
    }

    #[test]
    fn test_delete_then_readd_uses_post_delete_ledger() {
        let (service, a, _) = scenario(MemoryStore::new());
        admit(&service, &a.id, 50_000.0);
        let second = admit(&service, &a.id, 40_000.0);

        // 90,000 drawn = exactly the share; removing one row frees nothing else up
        service.remove_withdrawal(&second.id).unwrap();
        assert_eq!(service.ledger().total_for(&a.id), 50_000.0);

        let again = service
            .propose_withdrawal(&a.id, WithdrawalDraft::new(40_000.0, "R", "Cashier").on(&second.date))
            .unwrap();
        assert!(matches!(again, Proposal::Admitted(_)));
    }

    #[test]
    fn test_remove_unknown_withdrawal() {
        let (service, _, _) = scenario(MemoryStore::new());
        assert!(matches!(
            service.remove_withdrawal("missing"),
            Err(PartnersError::WithdrawalNotFound(_))
        ));
    }

    #[test]
    fn test_deleting_partner_recomputes_allocation_live() {
        let (service, a, b) = scenario(SqliteStore::open_in_memory().unwrap());
        admit(&service, &a.id, 85_000.0);

        // warm the allocation before the delete
        assert_eq!(service.allocation().for_partner(&b.id).unwrap().share, 60_000.0);

        service.delete_partner(&a.id).unwrap();

        let allocation = service.allocation();
        assert_eq!(allocation.total_company_investment, 40_000.0);
        let b_alloc = allocation.for_partner(&b.id).unwrap();
        assert_eq!(b_alloc.effective_percentage, 100.0);
        assert_eq!(b_alloc.share, 150_000.0);

        // history retained as orphans under the snapshot name
        let orphans = service.orphaned_withdrawals();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].partner_name_at_withdrawal(), "A");
        assert_eq!(service.orphan_groups()[0].total, 85_000.0);
    }

    #[test]
    fn test_forbid_policy_blocks_delete() {
        let (service, a, _) = scenario(MemoryStore::new());
        let service = service.with_orphan_policy(OrphanPolicy::ForbidWhileWithdrawals);
        admit(&service, &a.id, 1_000.0);

        let result = service.delete_partner(&a.id);
        assert!(matches!(result, Err(PartnersError::PartnerHasWithdrawals { .. })));
        assert_eq!(service.partners().len(), 2);
    }

    #[test]
    fn test_rename_does_not_rewrite_history() {
        let (service, a, _) = scenario(MemoryStore::new());
        admit(&service, &a.id, 1_000.0);

        let mut input = a.to_input();
        input.name = "A (renamed)".to_string();
        service.update_partner(&a.id, input).unwrap();

        assert_eq!(service.partner(&a.id).unwrap().name, "A (renamed)");
        assert_eq!(service.withdrawals_for(&a.id)[0].partner_name, "A");
    }

    #[test]
    fn test_statements() {
        let (service, a, b) = scenario(MemoryStore::new());
        admit(&service, &a.id, 95_000.0);

        let statements = service.statements();
        assert_eq!(statements.len(), 2);

        let sa = statements.iter().find(|s| s.partner.id == a.id).unwrap();
        assert_eq!(sa.total_withdrawn, 95_000.0);
        assert_eq!(sa.remaining, -5_000.0);

        let sb = statements.iter().find(|s| s.partner.id == b.id).unwrap();
        assert_eq!(sb.withdrawal_count, 0);
        assert_eq!(sb.remaining, 60_000.0);
    }

    #[test]
    fn test_empty_store_computes_over_nothing() {
        let service = PartnersService::new(MemoryStore::new());
        let allocation = service.allocation();
        assert_eq!(allocation.total_company_investment, 0.0);
        assert!(allocation.partners.is_empty());
        assert!(!service.share_check().needs_warning);
        assert_eq!(service.currency(), "YER");
    }
}
