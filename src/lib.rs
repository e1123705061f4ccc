// Venue Partners - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod error;
pub mod money;
pub mod entities;
pub mod valuation;      // Investment value per accounting method
pub mod allocation;     // Net profit → effective percentage → entitled share
pub mod ledger;         // Withdrawal history per partner
pub mod admission;      // Soft-governance withdrawal policy
pub mod roster;         // Partner create / update / delete
pub mod store;          // Flat collection store (SQLite / memory)
pub mod settings;
pub mod config;
pub mod service;
pub mod summary;
pub mod backup;
pub mod csv_io;

// Re-export commonly used types
pub use error::{PartnersError, Result, ValidationError, ValidationResult};
pub use entities::{
    Employee, Expense, Partner, PartnerInput, ReceiptImage, Reservation, ReservationStatus,
    ShareMethod, Withdrawal, WithdrawalDraft,
};
pub use valuation::{investment_value, total_investment};
pub use allocation::{Allocation, PartnerAllocation, ProfitAllocationEngine, RosterShareCheck};
pub use ledger::{OrphanGroup, WithdrawalLedger};
pub use admission::{AdmissionDecision, AdmissionPolicy, OverdrawDetails, PendingWithdrawal};
pub use roster::{OrphanPolicy, PartnerRoster};
pub use store::{CollectionStore, MemoryStore, SqliteStore};
pub use settings::Settings;
pub use config::AppConfig;
pub use service::{PartnerStatement, PartnersService, Proposal};
pub use summary::{build_prompt, offline_summary, FinancialFacts};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
