use std::io::Write;
use std::process::ExitCode;

use sth_pollen::{collect_sths, Config, Error};
use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn run() -> Result<(), Error> {
    let config = Config::from_env()?;
    let fetcher = config.fetcher()?;
    debug!(url = %fetcher.url_for(&config.app_id), "fetching STH set");

    let mut archive = fetcher.fetch(&config.app_id)?;
    if archive.is_authenticated() {
        info!(app_id = %config.app_id, entries = archive.len(), "package verified");
    } else {
        warn!(
            app_id = %config.app_id,
            "package format carries no key signature; archive is unauthenticated"
        );
    }

    let scan = collect_sths(&mut archive, &config.sth_source)?;
    for skipped in &scan.skipped {
        warn!(name = %skipped.name, "ignoring STH: {}", skipped.reason);
    }
    info!(count = scan.pollen.sths.len(), "collected STHs");

    // Render fully before writing so a failure never leaves partial output
    let mut out = Vec::new();
    scan.pollen.write_json(&mut out)?;
    std::io::stdout().lock().write_all(&out)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error fetching STH Set CRX: {}", e);
            if let Some(suggestion) = e.suggestion() {
                info!("{}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}
