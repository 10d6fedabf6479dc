//! Core business logic abstractions

pub mod cache;
pub mod calculator;
pub mod loan;
pub mod log;
pub mod market;
pub mod units;

// Re-export main types for cleaner imports
pub use calculator::MortgageCalculator;
pub use loan::{CalculationResult, IncomeValidation, LoanInputs, WizardStep};
pub use market::{
    BankQuote, BankQuoteProvider, IndexValue, IndexValueProvider, MarketDatum, RateProvider,
    RateSet, SourceTier,
};
