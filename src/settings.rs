// ⚙️ Venue Settings - hall identity, display currency, admin credentials
//
// Stored as a single document in the collection store. The currency code is
// used for display only; no conversion happens anywhere.

use crate::error::{PartnersError, Result, ValidationError, ValidationResult};
use crate::store::{load_document, save_document, CollectionStore, SETTINGS_KEY};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DEFAULT_CURRENCY: &str = "YER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub hall_name: String,
    pub currency: String,
    pub fiscal_year: i32,
    pub admin_user: String,
    /// SHA-256 hex digest of the admin password
    pub admin_pass_hash: String,
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Settings {
    pub fn new(hall_name: &str, currency: &str, admin_user: &str, admin_password: &str) -> Self {
        Settings {
            hall_name: hall_name.trim().to_string(),
            currency: currency.trim().to_uppercase(),
            fiscal_year: Utc::now().year(),
            admin_user: admin_user.trim().to_string(),
            admin_pass_hash: hash_password(admin_password),
        }
    }

    pub fn with_fiscal_year(mut self, year: i32) -> Self {
        self.fiscal_year = year;
        self
    }

    pub fn set_password(&mut self, password: &str) {
        self.admin_pass_hash = hash_password(password);
    }

    pub fn authenticate(&self, user: &str, password: &str) -> bool {
        self.admin_user == user.trim() && self.admin_pass_hash == hash_password(password)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.hall_name.is_empty() {
            errors.push(ValidationError::new("hallName", "Required field is empty", "Settings"));
        }
        if self.currency.is_empty() {
            errors.push(ValidationError::new("currency", "Required field is empty", "Settings"));
        }
        if self.admin_user.is_empty() {
            errors.push(ValidationError::new("adminUser", "Required field is empty", "Settings"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn load<S: CollectionStore + ?Sized>(store: &S) -> Option<Settings> {
        load_document(store, SETTINGS_KEY)
    }

    pub fn require<S: CollectionStore + ?Sized>(store: &S) -> Result<Settings> {
        Self::load(store).ok_or(PartnersError::SettingsMissing)
    }

    pub fn save<S: CollectionStore + ?Sized>(&self, store: &S) -> Result<()> {
        self.validate()?;
        save_document(store, SETTINGS_KEY, self)?;
        tracing::info!(hall = %self.hall_name, currency = %self.currency, "settings saved");
        Ok(())
    }
}

/// Display currency from stored settings, falling back to the default
pub fn currency_of<S: CollectionStore + ?Sized>(store: &S) -> String {
    Settings::load(store)
        .map(|s| s.currency)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}
