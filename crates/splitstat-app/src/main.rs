// Batch entry point.
//
// 1. Initialize tracing (stderr)
// 2. Load config
// 3. Load events and manifest, assemble, write output

use splitstat_app::config;
use splitstat_app::run;

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("splitstat starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: events={}, combinations={}, output={}",
        config.paths.events, config.paths.combinations, config.paths.output
    );

    let summary = run::run(&config).await?;
    info!(
        "Done: {} events, {} requests, {} rows written to {}",
        summary.events, summary.requests, summary.rows, config.paths.output
    );
    Ok(())
}

/// Initialize tracing to log to stderr, leaving stdout free.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("splitstat_app=info,splitstat_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
