pub mod cli;
pub mod config;
pub mod core;
pub mod providers;
pub mod session;
pub mod store;
pub mod wizard;

use crate::core::MortgageCalculator;
use crate::core::cache::{KeyValueCollection, Store};
use crate::core::loan::WizardStep;
use crate::providers::TieredSource;
use crate::providers::banco::BankQuotesFeed;
use crate::providers::bcra::BcraRatesFeed;
use crate::providers::uva::UvaIndexFeed;
use crate::session::SessionStore;
use crate::store::KeyValueStore;
use crate::wizard::{LogNotifier, Wizard};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Market,
    Estimate(EstimateRequest),
}

/// One-shot estimate parameters from the command line. The CLI submits
/// them as a single wizard step, the same path a front end would use.
pub struct EstimateRequest {
    pub loan_amount: f64,
    pub loan_term_years: u32,
    pub home_value: f64,
    pub down_payment: f64,
    pub monthly_income: f64,
    pub step: WizardStep,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("uvacalc starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load_or_default(),
    };
    debug!("Loaded config: {config:#?}");

    let store = open_store(&config);
    let cache = collection(&store, "market_cache")?;
    let last_known = collection(&store, "last_known")?;

    let uva_base = config
        .feeds
        .uva
        .as_ref()
        .map_or("https://criptoya.com", |c| &c.base_url);
    let index_source = Arc::new(TieredSource::new(
        UvaIndexFeed::new(uva_base),
        Arc::clone(&cache),
        Arc::clone(&last_known),
    ));

    let (bcra_base, bcra_token) = config
        .feeds
        .bcra
        .as_ref()
        .map_or(("https://api.estadisticasbcra.com", None), |c| {
            (c.base_url.as_str(), c.api_token.as_deref())
        });
    let rate_source = Arc::new(TieredSource::new(
        BcraRatesFeed::new(bcra_base, bcra_token),
        Arc::clone(&cache),
        Arc::clone(&last_known),
    ));

    let banco_base = config
        .feeds
        .banco
        .as_ref()
        .map_or("https://criptoya.com", |c| &c.base_url);
    let quote_source = Arc::new(TieredSource::new(
        BankQuotesFeed::new(banco_base),
        Arc::clone(&cache),
        Arc::clone(&last_known),
    ));

    match command {
        AppCommand::Market => {
            cli::market::show_market_overview(
                index_source.as_ref(),
                rate_source.as_ref(),
                quote_source.as_ref(),
            )
            .await
        }
        AppCommand::Estimate(request) => {
            // CLI sessions are one-shot, so they live in memory
            let sessions = SessionStore::new(
                store
                    .get_collection("sessions", false, true)
                    .context("Failed to create session collection")?,
            );
            let applications = collection(&store, "applications")?;
            let calculator = MortgageCalculator::new(index_source, rate_source);
            let wizard = Wizard::new(sessions, calculator, applications, Arc::new(LogNotifier));

            cli::estimate::show_estimate(&wizard, &request).await
        }
    }
}

fn open_store(config: &config::AppConfig) -> KeyValueStore {
    let data_path = config
        .data_path
        .as_ref()
        .map(std::path::PathBuf::from)
        .or_else(|| config::AppConfig::default_data_path().ok());

    match data_path {
        Some(path) => KeyValueStore::open(&path.join("store")),
        None => KeyValueStore::ephemeral(),
    }
}

/// A persistent collection when the data directory is usable, an
/// in-memory one otherwise. The tool stays functional either way; only
/// the last-known tier loses its persistence.
fn collection(store: &KeyValueStore, name: &str) -> Result<Arc<dyn KeyValueCollection>> {
    store
        .get_collection(name, true, true)
        .or_else(|| store.get_collection(name, false, true))
        .with_context(|| format!("Failed to create collection: {name}"))
}
