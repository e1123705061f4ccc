// 💸 Withdrawal Entity - cash disbursement against a partner's share
//
// Immutable once admitted; the only lifecycle event afterwards is deletion.
// `partner_name` is a snapshot taken at admission time and is NOT kept in
// sync with later partner renames.

use crate::error::{ValidationError, ValidationResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format used by every stored record
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: String,

    /// Owning partner (may no longer exist in the roster)
    pub partner_id: String,

    /// Partner name at withdrawal time
    pub partner_name: String,

    pub amount: f64,

    #[serde(default)]
    pub receipt_number: String,

    /// YYYY-MM-DD
    pub date: String,

    #[serde(default)]
    pub recipient_name: String,

    /// Receipt attachment as a `data:` URL (stored inline, no size limit here)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
}

impl Withdrawal {
    /// Name of the partner as it was when this withdrawal was admitted
    pub fn partner_name_at_withdrawal(&self) -> &str {
        &self.partner_name
    }

    pub fn has_receipt(&self) -> bool {
        self.receipt_image.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Parsed withdrawal date, if the stored string is well formed
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }
}

// ============================================================================
// WITHDRAWAL DRAFT (proposed, not yet admitted)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalDraft {
    pub amount: f64,
    #[serde(default)]
    pub receipt_number: String,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default = "today")]
    pub date: String,
    #[serde(default)]
    pub receipt_image: Option<String>,
}

fn today() -> String {
    Utc::now().date_naive().format(DATE_FORMAT).to_string()
}

impl WithdrawalDraft {
    /// Draft dated today
    pub fn new(amount: f64, receipt_number: &str, recipient_name: &str) -> Self {
        WithdrawalDraft {
            amount,
            receipt_number: receipt_number.to_string(),
            recipient_name: recipient_name.to_string(),
            date: today(),
            receipt_image: None,
        }
    }

    pub fn on(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    pub fn with_receipt(mut self, receipt: ReceiptImage) -> Self {
        self.receipt_image = Some(receipt.into_data_url());
        self
    }

    /// Input-boundary checks; nothing is submitted when this fails
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if !self.amount.is_finite() {
            errors.push(ValidationError::new("amount", "Must be a number", "Withdrawal"));
        } else if self.amount <= 0.0 {
            errors.push(ValidationError::new(
                "amount",
                format!("Must be positive, got {}", self.amount),
                "Withdrawal",
            ));
        }

        if NaiveDate::parse_from_str(&self.date, DATE_FORMAT).is_err() {
            errors.push(ValidationError::new(
                "date",
                format!("Expected YYYY-MM-DD, got '{}'", self.date),
                "Withdrawal",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// RECEIPT IMAGE
// ============================================================================

/// Opaque receipt attachment, encoded as text for inline storage
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ReceiptImage {
    pub fn new(mime_type: &str, bytes: Vec<u8>) -> Self {
        ReceiptImage {
            mime_type: mime_type.to_string(),
            bytes,
        }
    }

    /// Guess the mime type from a file extension
    pub fn mime_for_extension(extension: &str) -> &'static str {
        match extension.to_lowercase().as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn into_data_url(self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Decode a `data:` URL produced by `into_data_url`
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime_type, payload) = rest.split_once(";base64,")?;
        let bytes = STANDARD.decode(payload).ok()?;
        Some(ReceiptImage::new(mime_type, bytes))
    }
}
