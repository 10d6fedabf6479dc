use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use uvacalc::core::loan::WizardStep;
use uvacalc::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current UVA value, mortgage rates and bank quotes
    Market,
    /// Compute a mortgage estimate
    Estimate {
        /// Requested loan amount in pesos
        #[arg(long)]
        loan_amount: f64,

        /// Loan term in years
        #[arg(long, default_value_t = 30)]
        loan_term: u32,

        /// Property value in pesos; 0 when no property is selected yet
        #[arg(long, default_value_t = 0.0)]
        home_value: f64,

        /// Down payment in pesos
        #[arg(long, default_value_t = 0.0)]
        down_payment: f64,

        /// Gross monthly income in pesos
        #[arg(long, default_value_t = 0.0)]
        monthly_income: f64,

        /// Wizard step (1-3); step 1 estimates the property value
        #[arg(long, default_value_t = 2)]
        step: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(Commands::Market) => {
            uvacalc::run_command(uvacalc::AppCommand::Market, cli.config_path.as_deref()).await
        }
        Some(Commands::Estimate {
            loan_amount,
            loan_term,
            home_value,
            down_payment,
            monthly_income,
            step,
        }) => {
            let request = uvacalc::EstimateRequest {
                loan_amount,
                loan_term_years: loan_term,
                home_value,
                down_payment,
                monthly_income,
                step: WizardStep::from_number(step)?,
            };
            uvacalc::run_command(
                uvacalc::AppCommand::Estimate(request),
                cli.config_path.as_deref(),
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = uvacalc::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
feeds:
  uva:
    base_url: "https://criptoya.com"
  bcra:
    base_url: "https://api.estadisticasbcra.com"
    # Token from https://estadisticasbcra.com/api/registracion
    api_token: ""
  banco:
    base_url: "https://criptoya.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
