// 🤝 Partner Entity - stakeholder in the venue
//
// "Partner id is IDENTITY (never changes), everything else is a VALUE"
//
// A partner declares its stake under exactly one accounting method. The fields
// of the other method may still be stored (stale form state) but are never
// read by valuation, allocation or admission.

use crate::error::{ValidationError, ValidationResult};
use crate::valuation::investment_value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// SHARE METHOD
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMethod {
    /// Declared percentage + total invested amount
    #[default]
    Percentage,

    /// Number of shares × value per share
    Shares,
}

impl ShareMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareMethod::Percentage => "percentage",
            ShareMethod::Shares => "shares",
        }
    }
}

impl FromStr for ShareMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage" | "percent" | "%" => Ok(ShareMethod::Percentage),
            "shares" | "share" => Ok(ShareMethod::Shares),
            other => Err(format!("unknown share method: {}", other)),
        }
    }
}

impl std::fmt::Display for ShareMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PARTNER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    /// Stable identity - assigned at creation, NEVER changes
    pub id: String,

    pub name: String,

    /// Role of the partner in the venue
    #[serde(default)]
    pub position: String,

    /// Which of the fields below are authoritative
    #[serde(default)]
    pub share_method: ShareMethod,

    // ------------------------------------------------------------------------
    // Percentage method
    // ------------------------------------------------------------------------
    /// Declared nominal share (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_percentage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_invested: Option<f64>,

    // ------------------------------------------------------------------------
    // Shares method
    // ------------------------------------------------------------------------
    /// Fractional counts occur in stored data; kept as entered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_shares: Option<f64>,

    /// Monetary value of one share
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_value: Option<f64>,
}

impl Partner {
    /// Create a partner with a fresh UUID from validated input
    pub fn new(input: PartnerInput) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), input)
    }

    /// Build a partner keeping an existing identity
    pub fn with_id(id: String, input: PartnerInput) -> Self {
        Partner {
            id,
            name: input.name.trim().to_string(),
            position: input.position.trim().to_string(),
            share_method: input.share_method,
            share_percentage: input.share_percentage,
            total_invested: input.total_invested,
            number_of_shares: input.number_of_shares,
            share_value: input.share_value,
        }
    }

    /// Monetary investment under the active accounting method
    pub fn investment(&self) -> f64 {
        investment_value(self)
    }

    /// Declared stake as shown on the partner card: `"60%"` or `"400 shares"`
    pub fn stake_label(&self) -> String {
        match self.share_method {
            ShareMethod::Percentage => format!("{}%", self.share_percentage.unwrap_or(0.0)),
            ShareMethod::Shares => format!("{} shares", self.number_of_shares.unwrap_or(0.0)),
        }
    }

    /// Current values as an editable input (for partial updates)
    pub fn to_input(&self) -> PartnerInput {
        PartnerInput {
            name: self.name.clone(),
            position: self.position.clone(),
            share_method: self.share_method,
            share_percentage: self.share_percentage,
            total_invested: self.total_invested,
            number_of_shares: self.number_of_shares,
            share_value: self.share_value,
        }
    }
}

// ============================================================================
// PARTNER INPUT (create / update payload)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerInput {
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub share_method: ShareMethod,
    #[serde(default)]
    pub share_percentage: Option<f64>,
    #[serde(default)]
    pub total_invested: Option<f64>,
    #[serde(default)]
    pub number_of_shares: Option<f64>,
    #[serde(default)]
    pub share_value: Option<f64>,
}

impl PartnerInput {
    pub fn percentage(name: &str, position: &str, share_percentage: f64, total_invested: f64) -> Self {
        PartnerInput {
            name: name.to_string(),
            position: position.to_string(),
            share_method: ShareMethod::Percentage,
            share_percentage: Some(share_percentage),
            total_invested: Some(total_invested),
            ..Default::default()
        }
    }

    pub fn shares(name: &str, position: &str, number_of_shares: u64, share_value: f64) -> Self {
        PartnerInput {
            name: name.to_string(),
            position: position.to_string(),
            share_method: ShareMethod::Shares,
            number_of_shares: Some(number_of_shares as f64),
            share_value: Some(share_value),
            ..Default::default()
        }
    }

    /// Validate the fields required by the chosen accounting method
    ///
    /// Only the active method's fields are checked; the inactive method's
    /// fields are carried as-is.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Required field is empty", "Partner"));
        }

        if self.position.trim().is_empty() {
            errors.push(ValidationError::new("position", "Required field is empty", "Partner"));
        }

        match self.share_method {
            ShareMethod::Percentage => {
                match self.share_percentage {
                    None => errors.push(ValidationError::new(
                        "sharePercentage",
                        "Required for the percentage method",
                        "Partner",
                    )),
                    Some(p) if !p.is_finite() => errors.push(ValidationError::new(
                        "sharePercentage",
                        "Must be a number",
                        "Partner",
                    )),
                    Some(p) if !(0.0..=100.0).contains(&p) => errors.push(ValidationError::new(
                        "sharePercentage",
                        format!("Must be between 0 and 100, got {}", p),
                        "Partner",
                    )),
                    Some(_) => {}
                }
                check_amount(&mut errors, "totalInvested", self.total_invested, "percentage");
            }
            ShareMethod::Shares => {
                match self.number_of_shares {
                    None => errors.push(ValidationError::new(
                        "numberOfShares",
                        "Required for the shares method",
                        "Partner",
                    )),
                    Some(n) if !n.is_finite() => errors.push(ValidationError::new(
                        "numberOfShares",
                        "Must be a number",
                        "Partner",
                    )),
                    Some(_) => {}
                }
                check_amount(&mut errors, "shareValue", self.share_value, "shares");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_amount(errors: &mut Vec<ValidationError>, field: &str, value: Option<f64>, method: &str) {
    match value {
        None => errors.push(ValidationError::new(
            field,
            format!("Required for the {} method", method),
            "Partner",
        )),
        Some(v) if !v.is_finite() => {
            errors.push(ValidationError::new(field, "Must be a number", "Partner"))
        }
        Some(_) => {}
    }
}

// ============================================================================
// TESTS
// ============================================================================
