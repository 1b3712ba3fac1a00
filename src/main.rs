//! fetch-sheets — pull CMS content from the spreadsheet into `src/data/*.json`
//! before the site build. Exits non-zero only on fatal setup errors.

use std::process::ExitCode;

use cms_sync::{pipeline, SyncConfig, SyncReport};

async fn fetch() -> anyhow::Result<SyncReport> {
    let cfg = SyncConfig::from_env()?;
    pipeline::run(&cfg).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    cms_sync::init_tracing();

    tracing::info!("fetching data from Google Sheets");

    match fetch().await {
        Ok(report) => {
            pipeline::log_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "fatal error");
            ExitCode::FAILURE
        }
    }
}
