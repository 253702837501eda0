//! sfbasis CLI — pull rates, compute the Treasury-SF basis, plot and summarize it.
//!
//! Commands:
//! - `pull` — fetch Treasury yields and SOFR OIS rates into the data directory
//! - `calc` — compute the wide basis table from the pulled rates
//! - `format` — reshape the basis table to long `(unique_id, ds, y)` format
//! - `plot` — write the interactive HTML chart
//! - `summary` — print diagnostics and statistics, write static charts
//! - `all` — every stage in order

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sfbasis_core::data::{
    pull_treasury_sf_data, save_pulled, DataError, HttpProvider, MarketDataProvider,
    SyntheticProvider,
};
use sfbasis_core::{
    calculate_treasury_sf_basis, load_treasury_sf_basis, save_long_basis, save_treasury_sf_basis,
};
use sfbasis_report::{plot_main, run_summary, Settings};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sfbasis",
    about = "Treasury-SF basis pipeline: Treasury yields minus SOFR OIS rates, in basis points"
)]
struct Cli {
    /// Settings file. Defaults to settings.toml at the project root.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch Treasury yields and SOFR OIS rates and store them as Parquet.
    Pull {
        #[command(flatten)]
        pull: PullArgs,
    },
    /// Compute the basis table from the stored rates.
    Calc {
        /// Last date to include (YYYY-MM-DD). Defaults to all available data.
        #[arg(long)]
        end_date: Option<String>,
    },
    /// Write the long-format basis table used by the plot and summary.
    Format,
    /// Write the interactive basis chart.
    Plot {
        /// First date shown (YYYY-MM-DD). Defaults to the plot_start_date setting.
        #[arg(long)]
        start: Option<String>,

        /// Last date shown (YYYY-MM-DD). Defaults to the latest available.
        #[arg(long)]
        end: Option<String>,
    },
    /// Print diagnostics and statistics; write static charts and a stats CSV.
    Summary,
    /// Run pull, calc, format, plot and summary in order.
    All {
        #[command(flatten)]
        pull: PullArgs,

        /// Reuse the stored rates instead of pulling.
        #[arg(long, default_value_t = false)]
        skip_pull: bool,
    },
}

#[derive(clap::Args)]
struct PullArgs {
    /// Start date (YYYY-MM-DD). Defaults to the start_date setting.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to the end_date setting, else today.
    #[arg(long)]
    end: Option<String>,

    /// Generate synthetic rates instead of calling the market-data service.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings =
        Settings::load(cli.config.as_deref()).context("failed to resolve settings")?;
    info!(
        data_dir = %settings.data_dir.display(),
        output_dir = %settings.output_dir.display(),
        "settings resolved"
    );

    match cli.command {
        Commands::Pull { pull } => run_pull(&mut settings, &pull),
        Commands::Calc { end_date } => run_calc(&settings, parse_date_arg(end_date.as_deref())?),
        Commands::Format => run_format(&settings),
        Commands::Plot { start, end } => {
            if let Some(start) = parse_date_arg(start.as_deref())? {
                settings.plot_start_date = start;
            }
            if let Some(end) = parse_date_arg(end.as_deref())? {
                settings.plot_end_date = Some(end);
            }
            run_plot(&settings)
        }
        Commands::Summary => run_summary_cmd(&settings),
        Commands::All { pull, skip_pull } => {
            if !skip_pull {
                run_pull(&mut settings, &pull)?;
            }
            run_calc(&settings, None)?;
            run_format(&settings)?;
            run_plot(&settings)?;
            run_summary_cmd(&settings)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date_arg(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn build_provider(settings: &Settings, synthetic: bool) -> Result<Box<dyn MarketDataProvider>> {
    if synthetic {
        return Ok(Box::new(SyntheticProvider::new()));
    }
    let Some(url) = settings.market_data_url.as_deref() else {
        return Err(DataError::NotConfigured(
            "set MARKET_DATA_URL or market_data_url in settings.toml, or pass --synthetic".into(),
        )
        .into());
    };
    Ok(Box::new(HttpProvider::new(url)?))
}

fn run_pull(settings: &mut Settings, args: &PullArgs) -> Result<()> {
    if let Some(start) = parse_date_arg(args.start.as_deref())? {
        settings.start_date = start;
    }
    if let Some(end) = parse_date_arg(args.end.as_deref())? {
        settings.end_date = Some(end);
    }
    let end = settings
        .end_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let provider = build_provider(settings, args.synthetic)?;
    let pulled = pull_treasury_sf_data(provider.as_ref(), settings.start_date, end)?;
    let paths = save_pulled(&pulled, &settings.store(), provider.as_ref())?;

    println!("Treasury yields: {}", paths.treasury_yields.display());
    println!("SF rates:        {}", paths.sf_rates.display());
    Ok(())
}

fn run_calc(settings: &Settings, end_date: Option<NaiveDate>) -> Result<()> {
    let store = settings.store();
    let basis = calculate_treasury_sf_basis(end_date, &store)?;
    let path = save_treasury_sf_basis(&basis, &store)?;
    println!(
        "Basis: {} ({} dates, {} tenors)",
        path.display(),
        basis.height(),
        basis.width()
    );
    Ok(())
}

fn run_format(settings: &Settings) -> Result<()> {
    let store = settings.store();
    let basis = load_treasury_sf_basis(&store)?;
    let path = save_long_basis(&basis, &store)?;
    println!("Long format: {}", path.display());
    Ok(())
}

fn run_plot(settings: &Settings) -> Result<()> {
    let path = plot_main(settings)?;
    println!("Plot: {}", path.display());
    Ok(())
}

fn run_summary_cmd(settings: &Settings) -> Result<()> {
    let (report, artifacts) = run_summary(settings)?;
    println!("{report}");
    println!("Time series:    {}", artifacts.time_series.display());
    println!(
        "Term structure: {} ({})",
        artifacts.term_structure.display(),
        artifacts.term_structure_date
    );
    println!("Correlation:    {}", artifacts.correlation.display());
    println!("Statistics:     {}", artifacts.stats_csv.display());
    Ok(())
}
