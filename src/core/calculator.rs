//! The mortgage estimate engine.
//!
//! One entry point serves every wizard step; steps differ only in which
//! inputs are populated. Principal and scheduled payment are denominated in
//! UVAs and converted to pesos at the current index value. Lifetime
//! interest is valued at today's index value rather than a projected one,
//! which understates the real peso cost but is applied consistently.

use crate::core::loan::{CalculationResult, IncomeValidation, LoanInputs, WizardStep, round2};
use crate::core::market::{IndexValueProvider, RateProvider};
use crate::core::units::{pesos_to_uva, uva_to_pesos};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Product cap for primary-residence loans.
const MAX_LTV_PCT: f64 = 80.0;
const MAX_LTV_FRACTION: f64 = MAX_LTV_PCT / 100.0;

/// Product cap on total housing cost against gross monthly income.
const MAX_DTI_PCT: f64 = 25.0;

/// Flat annual escrow estimates, as fractions of the home value.
const PROPERTY_TAX_ANNUAL_RATE: f64 = 0.012;
const INSURANCE_ANNUAL_RATE: f64 = 0.005;

pub struct MortgageCalculator {
    index_provider: Arc<dyn IndexValueProvider>,
    rate_provider: Arc<dyn RateProvider>,
}

impl MortgageCalculator {
    pub fn new(
        index_provider: Arc<dyn IndexValueProvider>,
        rate_provider: Arc<dyn RateProvider>,
    ) -> Self {
        Self {
            index_provider,
            rate_provider,
        }
    }

    /// Computes the payment breakdown for the given inputs.
    ///
    /// Market data failures never surface here: the providers degrade
    /// through their fallback tiers and always yield a value. The only
    /// error path is a feed with no configured default constant.
    pub async fn calculate(&self, inputs: &LoanInputs) -> Result<CalculationResult> {
        let mut loan_amount = inputs.loan_amount;
        let mut home_value = inputs.home_value;

        // Before a property is selected the wizard has no home value, so
        // estimate one from the requested amount at the LTV cap.
        if inputs.step == WizardStep::LoanDetails && home_value == 0.0 && loan_amount > 0.0 {
            home_value = loan_amount / MAX_LTV_FRACTION;
            debug!(home_value, "Imputed home value for initial estimate");
        }

        let index = self.index_provider.current_index().await?;
        let rates = self.rate_provider.current_rates().await?;
        let uva_value = index.value.value;

        let mut ltv = if home_value > 0.0 {
            loan_amount / home_value * 100.0
        } else {
            0.0
        };
        if ltv > MAX_LTV_PCT {
            ltv = MAX_LTV_PCT;
            loan_amount = home_value * MAX_LTV_FRACTION;
            debug!(loan_amount, "Clamped loan amount to the LTV cap");
        }

        let loan_amount_uvas = pesos_to_uva(loan_amount, uva_value);

        let monthly_rate = rates.value.tna_rate / 100.0 / 12.0;
        let total_payments = inputs.loan_term_years * 12;
        let n = total_payments as f64;

        // French amortization in UVAs
        let monthly_payment_uvas = if monthly_rate > 0.0 {
            let growth = (1.0 + monthly_rate).powi(total_payments as i32);
            loan_amount_uvas * (monthly_rate * growth) / (growth - 1.0)
        } else {
            loan_amount_uvas / n
        };

        let monthly_payment_pesos = uva_to_pesos(monthly_payment_uvas, uva_value);

        // Escrow estimates stay in pesos
        let monthly_property_tax = home_value * PROPERTY_TAX_ANNUAL_RATE / 12.0;
        let monthly_insurance = home_value * INSURANCE_ANNUAL_RATE / 12.0;

        // No PMI in this product; LTV is already capped at 80%
        let monthly_pmi = 0.0;

        let total_monthly = monthly_payment_pesos + monthly_property_tax + monthly_insurance
            + monthly_pmi;

        let total_interest_uvas = monthly_payment_uvas * n - loan_amount_uvas;
        let total_interest_pesos = uva_to_pesos(total_interest_uvas, uva_value);

        let debt_to_income_ratio = if inputs.monthly_income > 0.0 {
            total_monthly / inputs.monthly_income * 100.0
        } else {
            0.0
        };
        // Threshold check happens before rounding
        let income_validation = if debt_to_income_ratio <= MAX_DTI_PCT {
            IncomeValidation::Valid
        } else {
            IncomeValidation::Invalid
        };

        Ok(CalculationResult {
            monthly_payment: round2(total_monthly),
            principal_interest: round2(monthly_payment_pesos),
            property_tax: round2(monthly_property_tax),
            insurance: round2(monthly_insurance),
            pmi: monthly_pmi,
            interest_rate: rates.value.tna_rate,
            tna_rate: round2(rates.value.tna_rate),
            tea_rate: round2(rates.value.tea_rate),
            cftea_rate: round2(rates.value.cftea_rate),
            total_interest: round2(total_interest_pesos),
            loan_amount,
            ltv_ratio: round2(ltv),
            debt_to_income_ratio: round2(debt_to_income_ratio),
            monthly_income: inputs.monthly_income,
            current_uva_value: uva_value,
            loan_amount_uvas: round2(loan_amount_uvas),
            monthly_payment_uvas: round2(monthly_payment_uvas),
            income_validation,
            uva_source: index.tier,
            uva_updated: index.fetched_at,
            rates_source: rates.tier,
            rates_updated: rates.fetched_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::{IndexValue, MarketDatum, RateSet, SourceTier};
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedIndex {
        value: f64,
        tier: SourceTier,
    }

    #[async_trait]
    impl IndexValueProvider for FixedIndex {
        async fn current_index(&self) -> Result<MarketDatum<IndexValue>> {
            Ok(MarketDatum {
                value: IndexValue {
                    value: self.value,
                    quoted_at: None,
                },
                fetched_at: Utc::now(),
                tier: self.tier,
            })
        }
    }

    struct FixedRates {
        tna: f64,
        tier: SourceTier,
    }

    #[async_trait]
    impl RateProvider for FixedRates {
        async fn current_rates(&self) -> Result<MarketDatum<RateSet>> {
            Ok(MarketDatum {
                value: RateSet {
                    tna_rate: self.tna,
                    tea_rate: self.tna + 0.42,
                    cftea_rate: self.tna + 1.92,
                },
                fetched_at: Utc::now(),
                tier: self.tier,
            })
        }
    }

    fn calculator(uva: f64, tna: f64) -> MortgageCalculator {
        MortgageCalculator::new(
            Arc::new(FixedIndex {
                value: uva,
                tier: SourceTier::Live,
            }),
            Arc::new(FixedRates {
                tna,
                tier: SourceTier::Live,
            }),
        )
    }

    fn inputs(
        loan: f64,
        term: u32,
        home: f64,
        income: f64,
        step: WizardStep,
    ) -> LoanInputs {
        LoanInputs {
            loan_amount: loan,
            loan_term_years: term,
            home_value: home,
            down_payment: 0.0,
            monthly_income: income,
            step,
        }
    }

    #[tokio::test]
    async fn test_breakdown_at_step_two() {
        // loan 35M over 10 years against a 43.75M home at TNA 9.5% and
        // UVA 1484.82
        let calc = calculator(1484.82, 9.5);
        let result = calc
            .calculate(&inputs(
                35_000_000.0,
                10,
                43_750_000.0,
                1_030_000.0,
                WizardStep::Property,
            ))
            .await
            .unwrap();

        assert_eq!(result.ltv_ratio, 80.0);
        assert_eq!(result.loan_amount, 35_000_000.0);
        assert_eq!(result.loan_amount_uvas, 23571.88);
        assert_eq!(result.monthly_payment_uvas, 305.01);
        assert_eq!(result.principal_interest, 452891.45);
        assert_eq!(result.property_tax, 43750.0);
        assert_eq!(result.insurance, 18229.17);
        assert_eq!(result.monthly_payment, 514870.62);
        assert_eq!(result.total_interest, 19346974.18);
        assert_eq!(result.pmi, 0.0);
        assert_eq!(result.interest_rate, 9.5);
        assert_eq!(result.current_uva_value, 1484.82);

        // 514870 / 1.03M is just under 50% of income
        assert_eq!(result.debt_to_income_ratio, 49.99);
        assert_eq!(result.income_validation, IncomeValidation::Invalid);
    }

    #[tokio::test]
    async fn test_ltv_clamp_recomputes_loan_amount() {
        let calc = calculator(1484.82, 9.5);
        let result = calc
            .calculate(&inputs(
                40_000_000.0,
                20,
                40_000_000.0,
                5_000_000.0,
                WizardStep::Property,
            ))
            .await
            .unwrap();

        // 100% LTV requested; the product caps at 80%
        assert_eq!(result.ltv_ratio, 80.0);
        assert_eq!(result.loan_amount, 32_000_000.0);
        assert_eq!(result.pmi, 0.0);
    }

    #[tokio::test]
    async fn test_step_one_imputes_home_value() {
        let calc = calculator(1484.82, 9.5);
        let result = calc
            .calculate(&inputs(
                35_000_000.0,
                10,
                0.0,
                0.0,
                WizardStep::LoanDetails,
            ))
            .await
            .unwrap();

        // home value imputed as loan / 0.8 = 43.75M, visible via escrow
        assert_eq!(result.property_tax, 43750.0);
        assert_eq!(result.insurance, 18229.17);
        assert_eq!(result.ltv_ratio, 80.0);
        assert_eq!(result.loan_amount, 35_000_000.0);

        // no income yet: ratio is zero and the threshold check passes
        assert_eq!(result.debt_to_income_ratio, 0.0);
        assert_eq!(result.income_validation, IncomeValidation::Valid);
    }

    #[tokio::test]
    async fn test_no_imputation_past_step_one() {
        let calc = calculator(1484.82, 9.5);
        let result = calc
            .calculate(&inputs(35_000_000.0, 10, 0.0, 0.0, WizardStep::Property))
            .await
            .unwrap();

        // home value stays zero: no escrow, no LTV
        assert_eq!(result.property_tax, 0.0);
        assert_eq!(result.insurance, 0.0);
        assert_eq!(result.ltv_ratio, 0.0);
    }

    #[tokio::test]
    async fn test_zero_rate_divides_principal_evenly() {
        let calc = calculator(1000.0, 0.0);
        let result = calc
            .calculate(&inputs(1_200_000.0, 10, 0.0, 0.0, WizardStep::Property))
            .await
            .unwrap();

        // 1200 UVAs over 120 payments, no compounding
        assert_eq!(result.monthly_payment_uvas, 10.0);
        assert_eq!(result.principal_interest, 10_000.0);
        assert_eq!(result.total_interest, 0.0);
    }

    #[tokio::test]
    async fn test_income_validation_boundary() {
        // Zero rate and no home value give an exact total of 10,000
        let calc = calculator(1000.0, 0.0);

        let at_limit = calc
            .calculate(&inputs(1_200_000.0, 10, 0.0, 40_000.0, WizardStep::Applicant))
            .await
            .unwrap();
        assert_eq!(at_limit.debt_to_income_ratio, 25.0);
        assert_eq!(at_limit.income_validation, IncomeValidation::Valid);

        let over_limit = calc
            .calculate(&inputs(1_200_000.0, 10, 0.0, 39_000.0, WizardStep::Applicant))
            .await
            .unwrap();
        assert!(over_limit.debt_to_income_ratio > 25.0);
        assert_eq!(over_limit.income_validation, IncomeValidation::Invalid);
    }

    #[tokio::test]
    async fn test_provenance_is_surfaced() {
        let calc = MortgageCalculator::new(
            Arc::new(FixedIndex {
                value: 1484.82,
                tier: SourceTier::Default,
            }),
            Arc::new(FixedRates {
                tna: 9.5,
                tier: SourceTier::LastKnown,
            }),
        );
        let result = calc
            .calculate(&inputs(
                10_000_000.0,
                15,
                20_000_000.0,
                900_000.0,
                WizardStep::Property,
            ))
            .await
            .unwrap();

        assert_eq!(result.uva_source, SourceTier::Default);
        assert_eq!(result.rates_source, SourceTier::LastKnown);
    }
}
