use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rewardly_core::{
    SystemClock, calculate_all, calculate_period, distinct_tags, generate_card_alerts_with,
    generate_theme_recommendations, parse_iso_date, parse_timezone, today_from,
};
use rewardly_ingest::{ImportReport, Wallet, load_wallet, parse_transactions_csv};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod report;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "rewardly",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("REWARDLY_BUILD_SHA"), ")"),
    about = "Credit-card reward tracking and card recommendations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print each card's current reward period
    Period {
        #[arg(long)]
        wallet: Option<PathBuf>,

        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        today: Option<String>,
    },

    /// Calculate rewards per card for the current period
    Calc {
        #[arg(long)]
        wallet: Option<PathBuf>,

        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        today: Option<String>,

        /// Print calculations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank cards per theme and list card alerts
    Recommend {
        #[arg(long)]
        wallet: Option<PathBuf>,

        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        today: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List the distinct tags present in a transaction CSV
    Tags {
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Manage ~/.rewardly/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config (never overwrites)
    Init,
    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_logging(&cfg.log.level);

    match cli.command {
        Command::Period { wallet, today } => {
            let wallet = open_wallet(wallet, &cfg)?;
            let today = resolve_today(today.as_deref(), &cfg)?;
            for card in &wallet.cards {
                let period = calculate_period(card, today);
                println!(
                    "{:<16} {:<28} {} .. {} ({} days)",
                    card.id,
                    period.label,
                    period.start,
                    period.end,
                    period.days()
                );
            }
        }

        Command::Calc {
            wallet,
            csv,
            today,
            json,
        } => {
            let wallet = open_wallet(wallet, &cfg)?;
            let import = open_transactions(csv, &cfg)?;
            let today = resolve_today(today.as_deref(), &cfg)?;
            let calcs = calculate_all(&wallet.cards, &import.transactions, today, &wallet.settings);

            if json {
                println!("{}", serde_json::to_string_pretty(&calcs)?);
            } else {
                print_import_summary(&import);
                for (card, calc) in wallet.cards.iter().zip(&calcs) {
                    println!("{}", report::render_calculation(&card.name, calc));
                }
            }
        }

        Command::Recommend {
            wallet,
            csv,
            today,
            json,
        } => {
            let wallet = open_wallet(wallet, &cfg)?;
            let import = open_transactions(csv, &cfg)?;
            let today = resolve_today(today.as_deref(), &cfg)?;
            let calcs = calculate_all(&wallet.cards, &import.transactions, today, &wallet.settings);
            let recs = generate_theme_recommendations(
                &wallet.themes,
                &wallet.cards,
                &calcs,
                &wallet.settings,
            );
            let alerts = generate_card_alerts_with(&wallet.cards, &calcs, cfg.alerts);

            if json {
                let out = serde_json::json!({
                    "recommendations": recs,
                    "alerts": alerts,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_import_summary(&import);
                if recs.is_empty() {
                    println!("No themes defined in the wallet.\n");
                }
                for rec in &recs {
                    println!("{}", report::render_recommendation(rec));
                }
                if !alerts.is_empty() {
                    println!("Alerts:");
                    for alert in &alerts {
                        print!("  {}", report::render_alert(alert));
                    }
                }
            }
        }

        Command::Tags { csv } => {
            let import = open_transactions(csv, &cfg)?;
            for tag in distinct_tags(&import.transactions) {
                println!("{tag}");
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                let (path, written) = config::init_config()?;
                if written {
                    println!("Wrote {}", path.display());
                } else {
                    println!("Config already exists: {}", path.display());
                }
            }
            ConfigCommand::Show => {
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level. Logs go to stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_today(arg: Option<&str>, cfg: &Config) -> Result<NaiveDate> {
    if let Some(value) = arg {
        return parse_iso_date(value).context("--today");
    }
    let tz = parse_timezone(&cfg.defaults.timezone).context("config defaults.timezone")?;
    let today = today_from(&SystemClock, tz);
    debug!(%today, timezone = %cfg.defaults.timezone, "resolved today");
    Ok(today)
}

fn open_wallet(arg: Option<PathBuf>, cfg: &Config) -> Result<Wallet> {
    let path = arg
        .or_else(|| cfg.defaults.wallet.clone())
        .context("no wallet given: pass --wallet <toml> or set defaults.wallet in config")?;
    load_wallet(&path)
}

fn open_transactions(arg: Option<PathBuf>, cfg: &Config) -> Result<ImportReport> {
    let path = arg
        .or_else(|| cfg.defaults.csv.clone())
        .context("no transactions given: pass --csv <file> or set defaults.csv in config")?;
    parse_transactions_csv(&path)
}

fn print_import_summary(import: &ImportReport) {
    println!(
        "Imported {} transactions ({} skipped)\n",
        import.transactions.len(),
        import.skipped.len()
    );
}
