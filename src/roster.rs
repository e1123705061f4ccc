// 👥 Partner Roster Management
//
// Create / update / delete partners. Input is validated before any change, so
// a rejected call leaves the roster untouched. Names need not be unique.

use crate::allocation::RosterShareCheck;
use crate::entities::{Partner, PartnerInput};
use crate::error::{PartnersError, Result};
use crate::ledger::WithdrawalLedger;
use serde::{Deserialize, Serialize};

/// What happens to a partner's withdrawal history when the partner is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Delete the partner; its withdrawals stay as read-only history keyed by
    /// their snapshot name
    #[default]
    RetainHistory,

    /// Refuse the delete while the partner has withdrawals on record
    ForbidWhileWithdrawals,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnerRoster {
    partners: Vec<Partner>,
}

impl PartnerRoster {
    pub fn new(partners: Vec<Partner>) -> Self {
        PartnerRoster { partners }
    }

    pub fn partners(&self) -> &[Partner] {
        &self.partners
    }

    pub fn into_partners(self) -> Vec<Partner> {
        self.partners
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Partner> {
        self.partners.iter().find(|p| p.id == id)
    }

    /// Add a partner with a fresh id
    pub fn create(&mut self, input: PartnerInput) -> Result<Partner> {
        input.validate()?;

        let partner = Partner::new(input);
        self.partners.push(partner.clone());
        Ok(partner)
    }

    /// Replace a partner's values in place; the id never changes
    pub fn update(&mut self, id: &str, input: PartnerInput) -> Result<Partner> {
        input.validate()?;

        let slot = self
            .partners
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PartnersError::PartnerNotFound(id.to_string()))?;

        *slot = Partner::with_id(id.to_string(), input);
        Ok(slot.clone())
    }

    /// Remove a partner; never cascades into the withdrawal ledger
    pub fn delete(&mut self, id: &str, ledger: &WithdrawalLedger, policy: OrphanPolicy) -> Result<Partner> {
        let index = self
            .partners
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PartnersError::PartnerNotFound(id.to_string()))?;

        if policy == OrphanPolicy::ForbidWhileWithdrawals {
            let count = ledger.count_for(id);
            if count > 0 {
                return Err(PartnersError::PartnerHasWithdrawals {
                    partner_id: id.to_string(),
                    count,
                });
            }
        }

        Ok(self.partners.remove(index))
    }

    pub fn share_check(&self) -> RosterShareCheck {
        RosterShareCheck::evaluate(&self.partners)
    }
}
