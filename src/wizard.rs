//! The wizard boundary: step calculations and final submission.
//!
//! This is the adapter in front of the engine. It owns the lenient
//! treatment of raw form fields; by the time the calculator runs,
//! everything is typed. Step handling is a total function for any field
//! map; the only error it can surface is a misconfigured market feed.

use crate::core::cache::KeyValueCollection;
use crate::core::loan::{CalculationResult, LoanInputs, WizardStep};
use crate::core::MortgageCalculator;
use crate::session::SessionStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::info;

/// Result of one step submission, serialized flat for the front end.
#[derive(Debug, Serialize)]
pub struct StepOutcome {
    pub step: u8,
    pub calculations: CalculationResult,
}

/// A submitted application, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub loan_amount: f64,
    pub loan_term_years: u32,
    pub home_value: f64,
    pub down_payment: f64,
    pub monthly_income: f64,
    pub property_location: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub terms_accepted: bool,
    pub marketing_consent: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Application {
    /// Builds the record from the merged wizard fields, with the same
    /// lenient coercion the calculation inputs get.
    fn from_fields(fields: &HashMap<String, String>) -> Self {
        let amount = |key: &str| -> f64 {
            fields
                .get(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let text = |key: &str| -> String { fields.get(key).cloned().unwrap_or_default() };
        let flag = |key: &str| -> bool {
            fields
                .get(key)
                .map(|v| matches!(v.as_str(), "1" | "true" | "on" | "yes"))
                .unwrap_or(false)
        };
        let inputs = LoanInputs::from_fields(fields, WizardStep::Applicant);

        Application {
            loan_amount: amount("loan_amount"),
            loan_term_years: inputs.loan_term_years,
            home_value: amount("home_value"),
            down_payment: amount("down_payment"),
            monthly_income: amount("monthly_income"),
            property_location: text("property_location"),
            full_name: text("full_name"),
            email: text("email"),
            phone: text("phone"),
            terms_accepted: flag("terms_accepted"),
            marketing_consent: flag("marketing_consent"),
            submitted_at: Utc::now(),
        }
    }
}

/// Outbound notification seam. Mail composition and delivery live outside
/// this crate; the tracing implementation records what would be sent.
pub trait Notifier: Send + Sync {
    fn application_received(&self, submission_id: &str, application: &Application);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn application_received(&self, submission_id: &str, application: &Application) {
        info!(
            submission_id,
            applicant = %application.full_name,
            loan_amount = application.loan_amount,
            "Application received"
        );
    }
}

pub struct Wizard {
    sessions: SessionStore,
    calculator: MortgageCalculator,
    applications: Arc<dyn KeyValueCollection>,
    notifier: Arc<dyn Notifier>,
}

impl Wizard {
    pub fn new(
        sessions: SessionStore,
        calculator: MortgageCalculator,
        applications: Arc<dyn KeyValueCollection>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sessions,
            calculator,
            applications,
            notifier,
        }
    }

    /// Handles one step submission: merges the incoming fields over the
    /// session state and returns the recomputed payment breakdown.
    pub async fn handle_step(
        &self,
        session_key: &str,
        step: WizardStep,
        fields: HashMap<String, String>,
    ) -> Result<StepOutcome> {
        let merged = self.sessions.merge(session_key, fields).await;
        let inputs = LoanInputs::from_fields(&merged, step);
        let calculations = self.calculator.calculate(&inputs).await?;

        Ok(StepOutcome {
            step: step.number(),
            calculations,
        })
    }

    /// Final submission: persists the merged record, notifies, clears the
    /// session. The UI already holds the last-computed breakdown, so no
    /// calculation runs here.
    pub async fn submit(
        &self,
        session_key: &str,
        fields: HashMap<String, String>,
    ) -> Result<String> {
        let merged = self.sessions.merge(session_key, fields).await;
        let application = Application::from_fields(&merged);

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        session_key.hash(&mut hasher);
        let submission_id = format!(
            "app-{}-{:08x}",
            application.submitted_at.timestamp_millis(),
            hasher.finish() as u32
        );

        let record = serde_json::to_vec(&application)
            .context("Failed to serialize application record")?;
        self.applications
            .put(submission_id.as_bytes(), &record, None)
            .await;

        self.notifier
            .application_received(&submission_id, &application);
        self.sessions.clear(session_key).await;

        Ok(submission_id)
    }

    /// Loads a previously submitted application.
    pub async fn application(&self, submission_id: &str) -> Option<Application> {
        let raw = self.applications.get(submission_id.as_bytes()).await?;
        serde_json::from_slice(&raw).ok()
    }
}
