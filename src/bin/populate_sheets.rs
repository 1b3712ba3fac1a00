//! populate-sheets — push the seed dataset (`config/sheet_seed.toml` or
//! `$SHEET_SEED_PATH`) into the spreadsheet. Needs a write-scoped credential.

use anyhow::{anyhow, Result};
use std::{process::ExitCode, sync::Arc};

use cms_sync::seed::{load_seed, push_seed};
use cms_sync::sheets::{
    auth::{load_credentials, SCOPE_READ_WRITE},
    client::http_client,
    ServiceAccountAuth, SheetsClient,
};
use cms_sync::SyncConfig;

async fn populate(cfg: &SyncConfig) -> Result<()> {
    let key = load_credentials(&cfg.credential_path)?.ok_or_else(|| {
        anyhow!(
            "service account file not found: {}",
            cfg.credential_path.display()
        )
    })?;
    tracing::info!(client_email = %key.client_email, "service account loaded");

    let seed = load_seed(&cfg.seed_path)?;

    let http = http_client(cfg.http_timeout)?;
    let auth = ServiceAccountAuth::new(key, SCOPE_READ_WRITE, http.clone())?;
    let client = SheetsClient::new(
        http,
        cfg.sheets_api_base.as_str(),
        cfg.spreadsheet_id.as_str(),
        Arc::new(auth),
    );

    push_seed(&client, &seed).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    cms_sync::init_tracing();

    tracing::info!("populating Google Sheets with seed data");

    let result = match SyncConfig::from_env() {
        Ok(cfg) => populate(&cfg).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            tracing::info!("all sheets populated successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "populate failed");
            ExitCode::FAILURE
        }
    }
}
