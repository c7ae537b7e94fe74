use anyhow::{Context, Result};
use jsescraper::{export, report, Fetcher, ScraperConfig, Session, TopN};
use std::{env, path::PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) args: [TOP_N] [CSV_DIR] ──────────────────────────────────
    let mut args = env::args().skip(1);
    let top_n = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("TOP_N must be a number, got {:?}", raw))?,
        None => TopN::DEFAULT,
    };
    let csv_dir = args.next().map(PathBuf::from);

    // ─── 3) config ───────────────────────────────────────────────────
    let config = match env::var("JSESCRAPER_CONFIG") {
        Ok(path) => ScraperConfig::load(&path)?,
        Err(_) => ScraperConfig::default(),
    };
    info!(url = %config.url, tables = config.tables.len(), "loaded config");

    // ─── 4) fetch once ───────────────────────────────────────────────
    let mut session = Session::new();
    session.set_top_n(top_n);
    let fetcher = Fetcher::new(config.clone());
    if let Err(e) = session.refresh(&fetcher) {
        error!(error = %e, "could not fetch market data");
        return Err(e).context("fetching market data");
    }

    // ─── 5) rank + print ─────────────────────────────────────────────
    let summary = session
        .summary(&config)
        .context("no tables after refresh")?
        .context("ranking market data")?;

    if env::var("JSESCRAPER_FORMAT").as_deref() == Ok("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", report::render_summary(&summary, session.last_refresh()));
    }

    // ─── 6) optional CSV export ──────────────────────────────────────
    if let (Some(dir), Some(tables)) = (csv_dir, session.tables()) {
        let written = export::write_table_set(&dir, tables, &config)?;
        info!(files = written.len(), dir = %dir.display(), "CSV export done");
    }

    info!("all done");
    Ok(())
}
