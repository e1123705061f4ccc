// ⚖️ Profit Allocation Engine - who is entitled to how much of the net profit
//
//   net_profit               = Σ reservation.amount − Σ expense.amount
//   total_company_investment = Σ investment_value(partner)
//   effective_percentage(p)  = investment(p) × 100 / total_company_investment   (0 if total is 0)
//   share(p)                 = net_profit × effective_percentage(p) / 100
//
// Pure: every call recomputes from the slices it is given. Nothing is cached,
// so a roster change is reflected by the very next call.

use crate::entities::{Expense, Partner, Reservation, ShareMethod};
use crate::money::{format_percentage, percentage_of};
use crate::valuation::{investment_value, total_investment};
use serde::{Deserialize, Serialize};

// ============================================================================
// ALLOCATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerAllocation {
    pub partner_id: String,
    pub partner_name: String,
    pub share_method: ShareMethod,
    pub investment: f64,
    pub effective_percentage: f64,
    /// Entitled share of net profit (negative on a net loss)
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub total_company_investment: f64,
    pub partners: Vec<PartnerAllocation>,
}

impl Allocation {
    pub fn for_partner(&self, partner_id: &str) -> Option<&PartnerAllocation> {
        self.partners.iter().find(|p| p.partner_id == partner_id)
    }

    /// Sum of effective percentages (100 when there is any investment, else 0)
    pub fn effective_total(&self) -> f64 {
        self.partners.iter().map(|p| p.effective_percentage).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Net profit {:.2} (revenue {:.2} - expenses {:.2}) across {} partner(s), total investment {:.2}",
            self.net_profit,
            self.total_revenue,
            self.total_expenses,
            self.partners.len(),
            self.total_company_investment
        )
    }
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitAllocationEngine;

impl ProfitAllocationEngine {
    pub fn new() -> Self {
        ProfitAllocationEngine
    }

    /// Revenue counts every reservation, whatever its status
    pub fn total_revenue(&self, reservations: &[Reservation]) -> f64 {
        reservations.iter().map(|r| r.amount).sum()
    }

    pub fn total_expenses(&self, expenses: &[Expense]) -> f64 {
        expenses.iter().map(|e| e.amount).sum()
    }

    pub fn net_profit(&self, reservations: &[Reservation], expenses: &[Expense]) -> f64 {
        self.total_revenue(reservations) - self.total_expenses(expenses)
    }

    /// Effective ownership of `partner` within `partners`, computed on demand
    pub fn effective_percentage(&self, partner: &Partner, partners: &[Partner]) -> f64 {
        percentage_of(investment_value(partner), total_investment(partners))
    }

    pub fn entitled_share(&self, partner: &Partner, partners: &[Partner], net_profit: f64) -> f64 {
        net_profit * self.effective_percentage(partner, partners) / 100.0
    }

    /// Full allocation of the current roster against the current books
    pub fn allocate(
        &self,
        partners: &[Partner],
        reservations: &[Reservation],
        expenses: &[Expense],
    ) -> Allocation {
        let total_revenue = self.total_revenue(reservations);
        let total_expenses = self.total_expenses(expenses);
        let net_profit = total_revenue - total_expenses;
        let total_company_investment = total_investment(partners);

        let per_partner = partners
            .iter()
            .map(|p| {
                let investment = investment_value(p);
                let effective_percentage = percentage_of(investment, total_company_investment);
                PartnerAllocation {
                    partner_id: p.id.clone(),
                    partner_name: p.name.clone(),
                    share_method: p.share_method,
                    investment,
                    effective_percentage,
                    share: net_profit * effective_percentage / 100.0,
                }
            })
            .collect();

        Allocation {
            total_revenue,
            total_expenses,
            net_profit,
            total_company_investment,
            partners: per_partner,
        }
    }
}

// ============================================================================
// ROSTER SHARE CHECK (display rule)
// ============================================================================

/// Roster-wide sanity metric shown next to the partner list
///
/// Only an all-percentage roster is checked: its declared percentages should
/// add up to 100. Mixed or all-shares rosters are 100 by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterShareCheck {
    pub total_percentage: f64,
    pub all_percentage: bool,
    pub needs_warning: bool,
}

impl RosterShareCheck {
    pub fn evaluate(partners: &[Partner]) -> Self {
        let all_percentage = !partners.is_empty()
            && partners
                .iter()
                .all(|p| p.share_method == ShareMethod::Percentage);

        let total_percentage = if total_investment(partners) == 0.0 {
            0.0
        } else if all_percentage {
            partners.iter().map(|p| p.share_percentage.unwrap_or(0.0)).sum()
        } else {
            100.0
        };

        RosterShareCheck {
            total_percentage,
            all_percentage,
            needs_warning: all_percentage && total_percentage.round() != 100.0,
        }
    }

    pub fn message(&self) -> Option<String> {
        self.needs_warning.then(|| {
            format!(
                "Declared partner percentages add up to {}; they should total 100% for an accurate profit split.",
                format_percentage(self.total_percentage)
            )
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
