// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sales_crossfilter::{load_csv, Dashboard, LoadReport, RecordStore, Settings};

#[derive(Parser, Debug)]
#[command(name = "sales-crossfilter", version, about = "Sales map and product-line dashboard")]
struct Cli {
    /// Settings file, without extension
    #[arg(long, default_value = "settings")]
    config: String,

    /// Sales CSV, overrides data.csv_path
    #[arg(long, env = "SALES_CSV")]
    csv: Option<PathBuf>,

    /// Default year, overrides dashboard.default_year
    #[arg(long)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal dashboard (default)
    Tui,
    /// Print the load report and sales per year
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::new(&cli.config).context("Failed to read settings")?;
    if let Some(csv) = cli.csv {
        settings.data.csv_path = csv;
    }
    if cli.year.is_some() {
        settings.dashboard.default_year = cli.year;
    }

    sales_crossfilter::init_logging(&settings.log.level);

    match cli.command.unwrap_or(Command::Tui) {
        Command::Summary => run_summary(&settings),
        Command::Tui => run_ui_mode(&settings),
    }
}

fn load(settings: &Settings) -> Result<(RecordStore, LoadReport, Dashboard)> {
    let (store, report) = load_csv(&settings.data.csv_path, &settings.region_scope())?;
    let dashboard = Dashboard::build(&store, &settings.dashboard_options())
        .context("Failed to build dashboard")?;
    Ok((store, report, dashboard))
}

fn run_summary(settings: &Settings) -> Result<()> {
    println!("📊 Sales Dashboard - Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading {}...", settings.data.csv_path.display());
    let (store, report, dashboard) = load(settings)?;
    println!("✓ {}", report.summary());

    for err in report.rejected.iter().take(10) {
        println!("   ✗ {}", err);
    }
    if report.rejected.len() > 10 {
        println!("   ... and {} more", report.rejected.len() - 10);
    }

    println!("\n🗺️  {} ({} regions)", dashboard.title(), dashboard.table().regions().len());
    println!("   Default year: {}", dashboard.default_year());
    println!("   Default region: {}", dashboard.fallback_region());

    println!("\n📅 Sales per year:");
    for &year in dashboard.domain().years() {
        let map = dashboard.derive_map_dataset(year);
        let top = map
            .ranked()
            .first()
            .map(|r| format!("{} ({:.2})", r.region, r.total_sales))
            .unwrap_or_default();
        println!(
            "   {}  {:>14.2}  {:>3} regions  top: {}",
            year,
            store.total_sales_for_year(year),
            map.regions.len(),
            top
        );
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(settings: &Settings) -> Result<()> {
    println!("🖥️  Loading Sales Dashboard...\n");

    let (store, report, dashboard) = load(settings)?;
    println!("✓ Loaded {} sales records", store.len());
    if !report.rejected.is_empty() {
        println!("⚠ {} rows rejected (run `summary` for details)", report.rejected.len());
    }

    let dashboard = std::sync::Arc::new(dashboard);
    let mut app = ui::App::new(dashboard.new_session());
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin sales-server --features server");
    std::process::exit(1);
}
