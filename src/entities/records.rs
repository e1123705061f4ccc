// Venue records owned by the surrounding application
//
// Reservations and expenses feed the profit figures; employees are carried so
// that backups and the store hold the complete venue data. Field names and
// enum spellings match the records already stored by the venue app.

use serde::{Deserialize, Serialize};

fn default_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// RESERVATION
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    #[serde(rename = "مؤكد", alias = "confirmed")]
    Confirmed,

    #[serde(rename = "ملغي", alias = "cancelled")]
    Cancelled,

    #[default]
    #[serde(rename = "مبدئي", alias = "tentative")]
    Tentative,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "Confirmed",
            ReservationStatus::Cancelled => "Cancelled",
            ReservationStatus::Tentative => "Tentative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default)]
    pub renter_name: String,
    #[serde(default)]
    pub personal_id: String,
    #[serde(default)]
    pub phone_number: String,
    /// YYYY-MM-DD
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub gender_type: String,
    #[serde(default)]
    pub setup_type: String,
    /// Total contract amount
    pub amount: f64,
    /// Down payment already received
    #[serde(default)]
    pub down_payment: f64,
    #[serde(default)]
    pub security_deposit_type: String,
    #[serde(default)]
    pub security_deposit_amount: f64,
    #[serde(default)]
    pub contract_number: String,
    #[serde(default)]
    pub status: ReservationStatus,
}

impl Reservation {
    /// Minimal reservation (amount only), handy for tests and imports
    pub fn with_amount(renter_name: &str, amount: f64) -> Self {
        Reservation {
            id: default_id(),
            renter_name: renter_name.to_string(),
            personal_id: String::new(),
            phone_number: String::new(),
            date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            event_type: String::new(),
            gender_type: String::new(),
            setup_type: String::new(),
            amount,
            down_payment: 0.0,
            security_deposit_type: String::new(),
            security_deposit_amount: 0.0,
            contract_number: String::new(),
            status: ReservationStatus::Confirmed,
        }
    }

    /// Amount still owed by the renter
    pub fn remaining_balance(&self) -> f64 {
        self.amount - self.down_payment
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    /// YYYY-MM-DD
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
}

impl Expense {
    pub fn new(description: &str, amount: f64, date: &str, category: &str) -> Self {
        Expense {
            id: default_id(),
            description: description.to_string(),
            amount,
            date: date.to_string(),
            category: category.to_string(),
        }
    }
}

// ============================================================================
// EMPLOYEE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default = "default_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub salary: f64,
    /// YYYY-MM-DD
    #[serde(default)]
    pub hire_date: String,
}
