//! Loan inputs and the calculation result.
//!
//! `LoanInputs` is the typed boundary of the engine: the wizard adapter
//! builds it from the merged form-field map, coercing anything malformed to
//! a safe value, so the calculator itself never sees untyped data.

use crate::core::market::SourceTier;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Term applied when the form has no usable value yet.
const DEFAULT_TERM_YEARS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Loan amount and term; no property selected yet.
    LoanDetails,
    /// Property value and down payment known.
    Property,
    /// Applicant contact and income data.
    Applicant,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::LoanDetails => 1,
            WizardStep::Property => 2,
            WizardStep::Applicant => 3,
        }
    }

    pub fn from_number(n: u8) -> Result<Self> {
        match n {
            1 => Ok(WizardStep::LoanDetails),
            2 => Ok(WizardStep::Property),
            3 => Ok(WizardStep::Applicant),
            _ => Err(anyhow!("Invalid wizard step: {}", n)),
        }
    }
}

impl FromStr for WizardStep {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid wizard step: {}", s))?;
        Self::from_number(n)
    }
}

/// Request-scoped calculation inputs, in pesos.
#[derive(Debug, Clone)]
pub struct LoanInputs {
    pub loan_amount: f64,
    pub loan_term_years: u32,
    pub home_value: f64,
    pub down_payment: f64,
    pub monthly_income: f64,
    pub step: WizardStep,
}

impl LoanInputs {
    /// Builds inputs from the merged wizard fields. Missing or non-numeric
    /// amounts coerce to 0; the term falls back to its default since a
    /// zero-year loan has no payment schedule.
    pub fn from_fields(fields: &HashMap<String, String>, step: WizardStep) -> Self {
        let amount = |key: &str| -> f64 {
            fields
                .get(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let loan_term_years = fields
            .get("loan_term")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_TERM_YEARS);

        LoanInputs {
            loan_amount: amount("loan_amount"),
            loan_term_years,
            home_value: amount("home_value"),
            down_payment: amount("down_payment"),
            monthly_income: amount("monthly_income"),
            step,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeValidation {
    Valid,
    Invalid,
}

impl Display for IncomeValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                IncomeValidation::Valid => "valid",
                IncomeValidation::Invalid => "invalid",
            }
        )
    }
}

/// Payment breakdown for one calculation. Immutable output; the serialized
/// field names are the wire contract consumed by the wizard front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub monthly_payment: f64,
    pub principal_interest: f64,
    pub property_tax: f64,
    pub insurance: f64,
    pub pmi: f64,
    pub interest_rate: f64,
    pub tna_rate: f64,
    pub tea_rate: f64,
    pub cftea_rate: f64,
    pub total_interest: f64,
    /// May be lower than the requested amount after the LTV clamp.
    pub loan_amount: f64,
    pub ltv_ratio: f64,
    pub debt_to_income_ratio: f64,
    pub monthly_income: f64,
    pub current_uva_value: f64,
    pub loan_amount_uvas: f64,
    pub monthly_payment_uvas: f64,
    pub income_validation: IncomeValidation,
    pub uva_source: SourceTier,
    pub uva_updated: DateTime<Utc>,
    pub rates_source: SourceTier,
    pub rates_updated: DateTime<Utc>,
}

/// Rounds to 2 decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
