// 📝 Entry forms for the logbook and wallet
//
// The stores accept anything; user input is checked here before it becomes a
// NewDelivery or NewTransaction. Required text must be non-empty after
// trimming, fee / amount must parse and be strictly positive, and a
// transaction's category must belong to its type.

use crate::logbook::{NewDelivery, Platform};
use crate::wallet::{Category, NewTransaction, TransactionType};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Why a form could not be submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),
    #[error("amount must be greater than zero (got {0})")]
    NonPositiveAmount(f64),
    #[error("category {category} cannot be used for {kind}")]
    CategoryMismatch {
        category: Category,
        kind: TransactionType,
    },
}

/// Raw delivery form input, as typed by the driver.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeliveryForm {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default, deserialize_with = "amount_text")]
    pub fee: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub notes: String,
}

impl DeliveryForm {
    pub fn validate(&self) -> Result<NewDelivery, FormError> {
        let customer = required(&self.customer, "customer")?;
        let fee = positive_amount(&self.fee, "fee")?;
        let area = required(&self.area, "area")?;
        let notes = self.notes.trim();

        Ok(NewDelivery {
            customer,
            platform: self.platform,
            fee,
            area,
            notes: if notes.is_empty() {
                None
            } else {
                Some(notes.to_string())
            },
        })
    }
}

/// Raw income/expense form input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionForm {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default, deserialize_with = "amount_text")]
    pub amount: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
}

impl TransactionForm {
    /// Blank form for `kind` with its first category preselected
    pub fn new(kind: TransactionType) -> Self {
        TransactionForm {
            kind,
            amount: String::new(),
            category: kind.default_category(),
            description: String::new(),
        }
    }

    pub fn validate(&self) -> Result<NewTransaction, FormError> {
        let amount = positive_amount(&self.amount, "amount")?;

        if !self.category.belongs_to(self.kind) {
            return Err(FormError::CategoryMismatch {
                category: self.category,
                kind: self.kind,
            });
        }

        let description = match self.description.trim() {
            "" => crate::i18n::category_name(self.category, crate::language::Language::En).to_string(),
            text => text.to_string(),
        };

        Ok(NewTransaction {
            kind: self.kind,
            amount,
            category: self.category,
            description,
        })
    }
}

/// Amounts arrive as text from the TUI and as numbers or text from JSON clients
fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a money amount typed by a user. Accepts "25", "25.5", " 1,200 ".
pub fn parse_amount(value: &str) -> Result<f64, FormError> {
    parse_field(value, "amount")
}

fn parse_field(value: &str, field: &'static str) -> Result<f64, FormError> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(FormError::MissingField(field));
    }
    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(FormError::InvalidAmount(value.trim().to_string())),
    }
}

fn positive_amount(value: &str, field: &'static str) -> Result<f64, FormError> {
    let amount = parse_field(value, field)?;
    if amount > 0.0 {
        Ok(amount)
    } else {
        Err(FormError::NonPositiveAmount(amount))
    }
}
