// 📊 Investment Valuation
//
//   Shares method:     number_of_shares × share_value
//   Percentage method: total_invested
//
// Missing fields count as 0. The inactive method's fields never take part.

use crate::entities::{Partner, ShareMethod};

/// Monetary investment of a partner under its active accounting method
pub fn investment_value(partner: &Partner) -> f64 {
    match partner.share_method {
        ShareMethod::Shares => {
            partner.number_of_shares.unwrap_or(0.0) * partner.share_value.unwrap_or(0.0)
        }
        ShareMethod::Percentage => partner.total_invested.unwrap_or(0.0),
    }
}

/// Sum of every partner's investment value
pub fn total_investment(partners: &[Partner]) -> f64 {
    partners.iter().map(investment_value).sum()
}
