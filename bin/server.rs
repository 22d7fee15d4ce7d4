// Sales Dashboard - Web Server
// Loads the sales CSV once, then serves the cross-filter API to every viewer.

use anyhow::{Context, Result};
use sales_crossfilter::{load_csv, server, Dashboard, SessionRegistry, Settings};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let config = std::env::args().nth(1).unwrap_or_else(|| "settings".to_string());
    let settings = Settings::new(&config).context("Failed to read settings")?;
    sales_crossfilter::init_logging(&settings.log.level);

    println!("🌐 Sales Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (store, report) = load_csv(&settings.data.csv_path, &settings.region_scope())?;
    tracing::info!("{}", report.summary());

    let dashboard = Dashboard::build(&store, &settings.dashboard_options())
        .context("Failed to build dashboard")?;
    println!("✓ {} loaded: {} sales records", dashboard.title(), store.len());

    let ttl = Duration::from_secs(settings.server.session_ttl_secs);
    let registry = Arc::new(SessionRegistry::with_ttl(Arc::new(dashboard), ttl));

    // Creating a session also sweeps; this covers servers nobody visits
    let sweeper = Arc::clone(&registry);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ttl.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            sweeper.sweep_expired();
        }
    });

    let app = server::router(registry);

    let addr = settings.server.bind.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/controls", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Failed to start server")?;

    Ok(())
}
