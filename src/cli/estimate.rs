use super::ui;
use crate::EstimateRequest;
use crate::core::loan::{CalculationResult, IncomeValidation};
use crate::wizard::Wizard;
use anyhow::Result;
use comfy_table::Cell;
use std::collections::HashMap;

impl CalculationResult {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Monthly cost"),
            ui::header_cell("Pesos"),
        ]);
        table.add_row(vec![
            Cell::new("Principal & interest"),
            ui::amount_cell(self.principal_interest),
        ]);
        table.add_row(vec![
            Cell::new("Property tax"),
            ui::amount_cell(self.property_tax),
        ]);
        table.add_row(vec![
            Cell::new("Insurance"),
            ui::amount_cell(self.insurance),
        ]);
        table.add_row(vec![Cell::new("PMI"), ui::amount_cell(self.pmi)]);

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\nTotal monthly payment: {}\n",
            ui::style_text(
                &format!("$ {:.2}", self.monthly_payment),
                ui::StyleType::TotalValue
            )
        ));

        let mut details = ui::new_styled_table();
        details.set_header(vec![ui::header_cell("Detail"), ui::header_cell("Value")]);
        details.add_row(vec![
            Cell::new("Loan amount"),
            ui::amount_cell(self.loan_amount),
        ]);
        details.add_row(vec![
            Cell::new("Loan-to-value"),
            ui::percent_cell(self.ltv_ratio),
        ]);
        details.add_row(vec![
            Cell::new("TNA / TEA / CFTEA"),
            Cell::new(format!(
                "{:.2}% / {:.2}% / {:.2}%",
                self.tna_rate, self.tea_rate, self.cftea_rate
            )),
        ]);
        details.add_row(vec![
            Cell::new("Total interest over the term"),
            ui::amount_cell(self.total_interest),
        ]);
        details.add_row(vec![
            Cell::new("UVA value"),
            ui::amount_cell(self.current_uva_value),
        ]);
        details.add_row(vec![
            Cell::new("Loan in UVAs"),
            ui::amount_cell(self.loan_amount_uvas),
        ]);
        details.add_row(vec![
            Cell::new("Monthly payment in UVAs"),
            ui::amount_cell(self.monthly_payment_uvas),
        ]);
        output.push('\n');
        output.push_str(&details.to_string());

        output
    }
}

/// Runs one estimate through the wizard path and prints the breakdown.
pub async fn show_estimate(wizard: &Wizard, request: &EstimateRequest) -> Result<()> {
    let mut fields = HashMap::new();
    fields.insert("loan_amount".to_string(), request.loan_amount.to_string());
    fields.insert("loan_term".to_string(), request.loan_term_years.to_string());
    fields.insert("home_value".to_string(), request.home_value.to_string());
    fields.insert("down_payment".to_string(), request.down_payment.to_string());
    fields.insert(
        "monthly_income".to_string(),
        request.monthly_income.to_string(),
    );

    let outcome = wizard
        .handle_step("cli-estimate", request.step, fields)
        .await?;
    let calculations = &outcome.calculations;

    println!(
        "{}\n",
        ui::style_text("Mortgage estimate", ui::StyleType::Title)
    );
    println!("{}", calculations.display_as_table());

    if calculations.monthly_income > 0.0 {
        let ratio = format!(
            "Debt-to-income ratio: {:.2}% (max 25%)",
            calculations.debt_to_income_ratio
        );
        match calculations.income_validation {
            IncomeValidation::Valid => println!("\n{ratio}"),
            IncomeValidation::Invalid => println!(
                "\n{}",
                ui::style_text(
                    &format!("{ratio} - income too low for this loan"),
                    ui::StyleType::Warning
                )
            ),
        }
    }

    let mut notes = Vec::new();
    if let Some(note) = ui::source_note(calculations.uva_source) {
        notes.push(format!("UVA value {note}"));
    }
    if let Some(note) = ui::source_note(calculations.rates_source) {
        notes.push(format!("rates {note}"));
    }
    if !notes.is_empty() {
        println!(
            "\n{}",
            ui::style_text(&format!("Data sources: {}", notes.join(", ")), ui::StyleType::Subtle)
        );
    }

    Ok(())
}
