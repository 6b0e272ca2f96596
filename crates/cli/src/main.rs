use anyhow::Context;
use clap::Parser;
use std::path::Path;
use topyield_core::config::Settings;
use topyield_core::ingest::datapackage;
use topyield_core::quote::yahoo::YahooQuoteProvider;

mod commands;
mod logging;

#[derive(Debug, Parser)]
#[command(name = "topyield", about = "Find the highest dividend yield in the S&P 500")]
struct Args {
    /// Data package descriptor for the roster. Overrides ROSTER_URL.
    #[arg(long)]
    roster_url: Option<String>,

    /// Logging configuration (YAML). Overrides LOG_CONFIG.
    #[arg(long)]
    log_config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut settings = Settings::from_env()?;
    if let Some(url) = args.roster_url {
        settings.roster_url = url;
    }
    if let Some(path) = args.log_config {
        settings.log_config = path;
    }

    let _sentry_guard = init_sentry(&settings);

    let log_config = logging::LogConfig::load(Path::new(&settings.log_config))?;
    logging::init(&log_config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(async {
        tokio::select! {
            res = run(settings) => res,
            signal = tokio::signal::ctrl_c() => signal
                .context("failed to listen for ctrl-c")
                .map(|()| tracing::info!("closing")),
        }
    });

    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "topyield stopped with an error");
    }
    result
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let http = datapackage::http_client(&settings)?;
    let roster = datapackage::load_roster(&http, &settings.roster_url).await?;
    let provider = YahooQuoteProvider::from_settings(&settings)?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut session = commands::Session::new(provider, roster, stdin, std::io::stdout());
    session.run().await
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
