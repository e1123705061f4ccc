// 📒 Withdrawal Ledger
//
// Insertion-ordered list of admitted withdrawals. Rows are never edited;
// removal is unconditional and never re-checks anything against shares.

use crate::entities::{Partner, Withdrawal};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithdrawalLedger {
    entries: Vec<Withdrawal>,
}

impl WithdrawalLedger {
    pub fn new(entries: Vec<Withdrawal>) -> Self {
        WithdrawalLedger { entries }
    }

    pub fn entries(&self) -> &[Withdrawal] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Withdrawal> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Withdrawals of one partner, in the order they were admitted
    pub fn list(&self, partner_id: &str) -> Vec<&Withdrawal> {
        self.entries
            .iter()
            .filter(|w| w.partner_id == partner_id)
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&Withdrawal> {
        self.entries.iter().find(|w| w.id == id)
    }

    pub fn append(&mut self, withdrawal: Withdrawal) {
        self.entries.push(withdrawal);
    }

    /// Remove a withdrawal by id, returning it if it was present
    pub fn remove(&mut self, id: &str) -> Option<Withdrawal> {
        let index = self.entries.iter().position(|w| w.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Sum of the partner's current (non-deleted) withdrawals
    pub fn total_for(&self, partner_id: &str) -> f64 {
        self.entries
            .iter()
            .filter(|w| w.partner_id == partner_id)
            .map(|w| w.amount)
            .sum()
    }

    pub fn count_for(&self, partner_id: &str) -> usize {
        self.entries.iter().filter(|w| w.partner_id == partner_id).count()
    }

    /// Running totals for every partner id present in the ledger
    pub fn totals_by_partner(&self) -> HashMap<String, f64> {
        let mut totals = HashMap::new();
        for w in &self.entries {
            *totals.entry(w.partner_id.clone()).or_insert(0.0) += w.amount;
        }
        totals
    }

    /// Withdrawals whose partner no longer exists in the roster
    ///
    /// These stay readable through their snapshot `partner_name`.
    pub fn orphans(&self, partners: &[Partner]) -> Vec<&Withdrawal> {
        let live: HashSet<&str> = partners.iter().map(|p| p.id.as_str()).collect();
        self.entries
            .iter()
            .filter(|w| !live.contains(w.partner_id.as_str()))
            .collect()
    }

    /// Orphaned history grouped by the snapshot identity it was recorded under
    pub fn orphan_groups(&self, partners: &[Partner]) -> Vec<OrphanGroup> {
        let mut groups: Vec<OrphanGroup> = Vec::new();
        for w in self.orphans(partners) {
            match groups.iter_mut().find(|g| g.partner_id == w.partner_id) {
                Some(group) => {
                    group.count += 1;
                    group.total += w.amount;
                }
                None => groups.push(OrphanGroup {
                    partner_id: w.partner_id.clone(),
                    partner_name: w.partner_name.clone(),
                    count: 1,
                    total: w.amount,
                }),
            }
        }
        groups
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanGroup {
    pub partner_id: String,
    pub partner_name: String,
    pub count: usize,
    pub total: f64,
}
