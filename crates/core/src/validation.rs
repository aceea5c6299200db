//! Create and edit payload validation, run before any store call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::normalize::RawRecord;

pub const CLIENT_CODE_PREFIX: &str = "CL";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in Client Name")]
    MissingName,
    #[error("Please select an Industry")]
    MissingIndustry,
    #[error("Health Score must be between 0 and 100")]
    HealthScoreOutOfRange,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("{field} cannot be negative")]
    Negative { field: &'static str },
}

/// New client as entered on the create form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientDraft {
    pub name: String,
    pub industry: String,
    pub client_code: Option<String>,
    pub status: Option<String>,
    pub total_licenses: i64,
    pub total_users: i64,
    pub active_users: Option<i64>,
    pub monthly_spend: Decimal,
    pub contract_value: Decimal,
    pub health_score: Option<Decimal>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ClientDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.industry.trim().is_empty() {
            return Err(ValidationError::MissingIndustry);
        }
        check_health(self.health_score)?;
        check_email(self.email.as_deref())?;
        check_count("Total licenses", Some(self.total_licenses))?;
        check_count("Total users", Some(self.total_users))?;
        check_count("Active users", self.active_users)?;
        check_money("Monthly spend", Some(self.monthly_spend))?;
        check_money("Contract value", Some(self.contract_value))
    }

    /// Store payload in the snake_case API shape. `client_code` must be set
    /// by the caller when the draft did not carry one.
    pub fn to_raw(&self, client_code: &str) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert("client_id".into(), Value::from(client_code));
        raw.insert("name".into(), Value::from(self.name.trim()));
        raw.insert("industry".into(), Value::from(self.industry.trim()));
        raw.insert("status".into(), Value::from(self.status.as_deref().unwrap_or("Active")));
        raw.insert("total_licenses".into(), Value::from(self.total_licenses));
        raw.insert("total_users".into(), Value::from(self.total_users));
        if let Some(active_users) = self.active_users {
            raw.insert("active_users".into(), Value::from(active_users));
        }
        raw.insert("monthly_spend".into(), Value::from(self.monthly_spend.to_string()));
        raw.insert("contract_value".into(), Value::from(self.contract_value.to_string()));
        if let Some(health_score) = self.health_score {
            raw.insert("health_score".into(), Value::from(health_score.to_string()));
        }
        insert_text(&mut raw, "contact", self.contact.as_deref());
        insert_text(&mut raw, "email", self.email.as_deref());
        insert_text(&mut raw, "phone", self.phone.as_deref());
        raw
    }
}

/// Partial edit; only supplied fields are validated and sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub status: Option<String>,
    pub total_licenses: Option<i64>,
    pub total_users: Option<i64>,
    pub active_users: Option<i64>,
    pub monthly_spend: Option<Decimal>,
    pub contract_value: Option<Decimal>,
    pub health_score: Option<Decimal>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ClientUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::MissingName);
        }
        if self.industry.as_deref().is_some_and(|industry| industry.trim().is_empty()) {
            return Err(ValidationError::MissingIndustry);
        }
        check_health(self.health_score)?;
        check_email(self.email.as_deref())?;
        check_count("Total licenses", self.total_licenses)?;
        check_count("Total users", self.total_users)?;
        check_count("Active users", self.active_users)?;
        check_money("Monthly spend", self.monthly_spend)?;
        check_money("Contract value", self.contract_value)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        insert_text(&mut raw, "name", self.name.as_deref().map(str::trim));
        insert_text(&mut raw, "industry", self.industry.as_deref().map(str::trim));
        insert_text(&mut raw, "status", self.status.as_deref());
        for (key, value) in [
            ("total_licenses", self.total_licenses),
            ("total_users", self.total_users),
            ("active_users", self.active_users),
        ] {
            if let Some(value) = value {
                raw.insert(key.into(), Value::from(value));
            }
        }
        for (key, value) in [
            ("monthly_spend", self.monthly_spend),
            ("contract_value", self.contract_value),
            ("health_score", self.health_score),
        ] {
            if let Some(value) = value {
                raw.insert(key.into(), Value::from(value.to_string()));
            }
        }
        insert_text(&mut raw, "contact", self.contact.as_deref());
        insert_text(&mut raw, "email", self.email.as_deref());
        insert_text(&mut raw, "phone", self.phone.as_deref());
        raw
    }
}

/// Next sequential business code after the highest `CL####` in use.
pub fn next_client_code<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|code| code.trim().strip_prefix(CLIENT_CODE_PREFIX))
        .filter_map(|digits| digits.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    format!("{CLIENT_CODE_PREFIX}{:04}", highest.saturating_add(1))
}

fn check_health(score: Option<Decimal>) -> Result<(), ValidationError> {
    match score {
        Some(score) if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED => {
            Err(ValidationError::HealthScoreOutOfRange)
        }
        _ => Ok(()),
    }
}

fn check_email(email: Option<&str>) -> Result<(), ValidationError> {
    match email.map(str::trim) {
        Some(email) if !email.is_empty() && !email.contains('@') => {
            Err(ValidationError::InvalidEmail)
        }
        _ => Ok(()),
    }
}

fn check_count(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value < 0 => Err(ValidationError::Negative { field }),
        _ => Ok(()),
    }
}

fn check_money(field: &'static str, value: Option<Decimal>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.is_sign_negative() && !value.is_zero() => {
            Err(ValidationError::Negative { field })
        }
        _ => Ok(()),
    }
}

fn insert_text(raw: &mut RawRecord, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        raw.insert(key.to_string(), Value::from(value));
    }
}
