// Error types for the partners core
//
// Validation problems are collected field by field (never stop at the first),
// everything else is a single domain error.

use thiserror::Error;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>, context: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// DOMAIN ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum PartnersError {
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("partner not found: {0}")]
    PartnerNotFound(String),

    #[error("withdrawal not found: {0}")]
    WithdrawalNotFound(String),

    #[error("partner {partner_id} still has {count} withdrawal(s) on record")]
    PartnerHasWithdrawals { partner_id: String, count: usize },

    #[error("venue settings have not been initialised (run `init` first)")]
    SettingsMissing,

    #[error("invalid administrator credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<Vec<ValidationError>> for PartnersError {
    fn from(errors: Vec<ValidationError>) -> Self {
        PartnersError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, PartnersError>;
