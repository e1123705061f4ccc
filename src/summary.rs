// 📝 Financial Summary - facts in, natural-language text out
//
// The summary never feeds back into stored state. Generator failures come
// back as displayable text, not as errors.

use crate::allocation::ProfitAllocationEngine;
use crate::entities::{Expense, Partner, Reservation};
use crate::money::format_currency;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerStake {
    pub name: String,
    pub stake: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialFacts {
    pub reservation_count: usize,
    pub expense_count: usize,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub partners: Vec<PartnerStake>,
    pub currency: String,
}

impl FinancialFacts {
    pub fn collect(
        reservations: &[Reservation],
        expenses: &[Expense],
        partners: &[Partner],
        currency: &str,
    ) -> Self {
        let engine = ProfitAllocationEngine::new();
        let total_revenue = engine.total_revenue(reservations);
        let total_expenses = engine.total_expenses(expenses);

        FinancialFacts {
            reservation_count: reservations.len(),
            expense_count: expenses.len(),
            total_revenue,
            total_expenses,
            net_profit: total_revenue - total_expenses,
            partners: partners
                .iter()
                .map(|p| PartnerStake {
                    name: p.name.clone(),
                    stake: p.stake_label(),
                })
                .collect(),
            currency: currency.to_string(),
        }
    }

    fn partner_line(&self) -> String {
        if self.partners.is_empty() {
            return "none recorded".to_string();
        }
        self.partners
            .iter()
            .map(|p| format!("{}: {}", p.name, p.stake))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Prompt for the text-generation collaborator
pub fn build_prompt(facts: &FinancialFacts) -> String {
    format!(
        "Act as a financial analyst for an event-venue company.\n\
         Based on the data below, write a short, accurate financial summary of the company's performance.\n\
         - Write for the business owner, not for an accountant.\n\
         - Start with an overview of revenue, expenses and net profit.\n\
         - Mention the number of reservations and the number of expense items.\n\
         - Briefly cover the partners' ownership structure if there are several partners.\n\
         - Close with one key observation or suggestion for improvement.\n\
         - All amounts are in {currency}.\n\
         \n\
         Financial data:\n\
         - Total revenue from {reservations} reservation(s): {revenue:.2}\n\
         - Total expenses from {expenses} item(s): {costs:.2}\n\
         - Net profit: {net:.2}\n\
         - Partners ({partner_count}): {partner_line}\n",
        currency = facts.currency,
        reservations = facts.reservation_count,
        revenue = facts.total_revenue,
        expenses = facts.expense_count,
        costs = facts.total_expenses,
        net = facts.net_profit,
        partner_count = facts.partners.len(),
        partner_line = facts.partner_line(),
    )
}

/// Deterministic summary used when no remote generator is available
pub fn offline_summary(facts: &FinancialFacts) -> String {
    let outcome = if facts.net_profit > 0.0 {
        "The venue is profitable"
    } else if facts.net_profit < 0.0 {
        "The venue is running at a loss"
    } else {
        "The venue is breaking even"
    };

    format!(
        "{outcome}: {reservations} reservation(s) brought in {revenue} against {expenses} expense item(s) totalling {costs}, leaving a net result of {net}. Partners: {partners}.",
        reservations = facts.reservation_count,
        revenue = format_currency(facts.total_revenue, &facts.currency),
        expenses = facts.expense_count,
        costs = format_currency(facts.total_expenses, &facts.currency),
        net = format_currency(facts.net_profit, &facts.currency),
        partners = facts.partner_line(),
    )
}

// ============================================================================
// GEMINI CLIENT (feature = "ai")
// ============================================================================

#[cfg(feature = "ai")]
pub use gemini::GeminiClient;

#[cfg(feature = "ai")]
mod gemini {
    use super::{build_prompt, FinancialFacts};
    use anyhow::{Context, Result};
    use serde::Deserialize;

    const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

    #[derive(Deserialize)]
    struct GenerateResponse {
        #[serde(default)]
        candidates: Vec<Candidate>,
    }

    #[derive(Deserialize)]
    struct Candidate {
        content: Content,
    }

    #[derive(Deserialize)]
    struct Content {
        #[serde(default)]
        parts: Vec<Part>,
    }

    #[derive(Deserialize)]
    struct Part {
        #[serde(default)]
        text: String,
    }

    pub struct GeminiClient {
        http: reqwest::Client,
        api_key: Option<String>,
        model: String,
    }

    impl GeminiClient {
        pub fn new(api_key: Option<String>, model: &str) -> Self {
            GeminiClient {
                http: reqwest::Client::new(),
                api_key,
                model: model.to_string(),
            }
        }

        /// Generate a summary; any failure is returned as text
        pub async fn generate(&self, facts: &FinancialFacts) -> String {
            let Some(api_key) = self.api_key.as_deref() else {
                tracing::warn!("summary requested without an API key");
                return "Error: the text-generation API key is not configured.".to_string();
            };

            match self.request(api_key, &build_prompt(facts)).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "summary generation failed");
                    format!("An error occurred while generating the summary: {}", e)
                }
            }
        }

        async fn request(&self, api_key: &str, prompt: &str) -> Result<String> {
            let url = format!("{}/{}:generateContent", API_BASE, self.model);
            let body = serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            });

            let response: GenerateResponse = self
                .http
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await
                .context("request failed")?
                .error_for_status()
                .context("API returned an error status")?
                .json()
                .await
                .context("unexpected response body")?;

            let text: String = response
                .candidates
                .into_iter()
                .next()
                .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
                .unwrap_or_default();

            if text.trim().is_empty() {
                anyhow::bail!("empty response");
            }
            Ok(text)
        }
    }
}
