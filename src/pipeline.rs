// src/pipeline.rs
//! Per-run driver: credential check, then fetch → normalize → mirror images →
//! write for each category, with the last snapshot standing in on failure.

use anyhow::{Context, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::{fs, sync::Arc};

use crate::config::SyncConfig;
use crate::content::{ContentCategory, Snapshot};
use crate::images::ImageResolver;
use crate::normalize::normalize_rows;
use crate::sheets::{
    auth::{load_credentials, SCOPE_READONLY},
    client::http_client,
    ServiceAccountAuth, SheetsClient, TabularSource,
};
use crate::snapshot::{ensure_placeholder, load_fallback, snapshot_path, write_snapshot};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "cms_sync_fetch_errors_total",
            "Categories that fell back to their previous snapshot."
        );
        describe_counter!(
            "cms_sync_records_written_total",
            "Records written to fresh snapshots."
        );
        describe_counter!(
            "cms_sync_images_mirrored_total",
            "Remote images downloaded into the mirror."
        );
        describe_counter!(
            "cms_sync_image_errors_total",
            "Image downloads that failed (original url kept)."
        );
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Credential present; every category was attempted remotely.
    Remote,
    /// No credential; existing snapshots kept, missing ones created empty.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOutcome {
    Fresh { count: usize },
    Fallback { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub outcomes: Vec<(ContentCategory, CategoryOutcome)>,
    pub had_errors: bool,
}

impl SyncReport {
    pub fn outcome(&self, category: ContentCategory) -> Option<CategoryOutcome> {
        self.outcomes
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, o)| *o)
    }
}

/// Full run as the `fetch-sheets` binary performs it.
///
/// Errors returned here are fatal (unreadable credential, client setup);
/// per-category failures only show up in the report.
pub async fn run(cfg: &SyncConfig) -> Result<SyncReport> {
    ensure_metrics_described();
    ensure_directories(cfg)?;

    let Some(key) = load_credentials(&cfg.credential_path)? else {
        tracing::warn!(
            path = %cfg.credential_path.display(),
            "service account file not found, using fallback data from existing JSON files"
        );
        return bootstrap_fallback_files(cfg);
    };
    let http = http_client(cfg.http_timeout)?;
    let auth = ServiceAccountAuth::new(key, SCOPE_READONLY, http.clone())?;
    tracing::info!(client_email = auth.client_email(), "service account loaded");
    let client = SheetsClient::new(
        http,
        cfg.sheets_api_base.as_str(),
        cfg.spreadsheet_id.as_str(),
        Arc::new(auth),
    );
    let images = ImageResolver::new(cfg)?;

    Ok(sync_all(cfg, &client, &images).await)
}

fn ensure_directories(cfg: &SyncConfig) -> Result<()> {
    fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("creating {}", cfg.data_dir.display()))?;
    if !cfg.images_dir.exists() {
        fs::create_dir_all(&cfg.images_dir)
            .with_context(|| format!("creating {}", cfg.images_dir.display()))?;
        tracing::info!(path = %cfg.images_dir.display(), "created CMS images directory");
    }
    Ok(())
}

/// No-remote mode: keep every existing snapshot, create `[]` for missing ones.
pub fn bootstrap_fallback_files(cfg: &SyncConfig) -> Result<SyncReport> {
    let mut outcomes = Vec::with_capacity(ContentCategory::ALL.len());
    for category in ContentCategory::ALL {
        let path = snapshot_path(&cfg.data_dir, category);
        if ensure_placeholder(&path)? {
            tracing::info!(file = category.file_name(), "created empty snapshot");
        }
        let count = load_fallback(&path, category).len();
        outcomes.push((category, CategoryOutcome::Fallback { count }));
    }
    Ok(SyncReport {
        mode: SyncMode::Fallback,
        outcomes,
        had_errors: false,
    })
}

/// Sync every category from `source`, one after another.
pub async fn sync_all(
    cfg: &SyncConfig,
    source: &dyn TabularSource,
    images: &ImageResolver,
) -> SyncReport {
    ensure_metrics_described();

    let mut outcomes = Vec::with_capacity(ContentCategory::ALL.len());
    let mut had_errors = false;

    for category in ContentCategory::ALL {
        tracing::info!(category = %category, "fetching");
        let outcome = match sync_category(cfg, source, images, category).await {
            Ok(count) => CategoryOutcome::Fresh { count },
            Err(e) => {
                had_errors = true;
                counter!("cms_sync_fetch_errors_total").increment(1);
                let path = snapshot_path(&cfg.data_dir, category);
                // consumers always get a file, even before the first good fetch
                if let Err(pe) = ensure_placeholder(&path) {
                    tracing::warn!(error = %format!("{pe:#}"), path = %path.display(), "could not create empty snapshot");
                }
                let count = load_fallback(&path, category).len();
                tracing::warn!(
                    category = %category,
                    error = %format!("{e:#}"),
                    count,
                    "using fallback data"
                );
                CategoryOutcome::Fallback { count }
            }
        };
        outcomes.push((category, outcome));
    }

    SyncReport {
        mode: SyncMode::Remote,
        outcomes,
        had_errors,
    }
}

async fn sync_category(
    cfg: &SyncConfig,
    source: &dyn TabularSource,
    images: &ImageResolver,
    category: ContentCategory,
) -> Result<usize> {
    let rows = source
        .fetch_rows(category.sheet_name())
        .await
        .with_context(|| format!("fetching {category}"))?;

    let mut staged = normalize_rows(&rows);
    if let Some(field) = category.image_field() {
        staged = images.resolve_records(staged, field).await;
    }

    let snapshot = Snapshot::from_staged(category, &staged);
    let path = snapshot_path(&cfg.data_dir, category);
    write_snapshot(&path, &snapshot)?;

    counter!("cms_sync_records_written_total").increment(snapshot.len() as u64);
    tracing::info!(path = %path.display(), count = snapshot.len(), "wrote snapshot");
    Ok(snapshot.len())
}

/// Closing status lines for the console.
pub fn log_summary(report: &SyncReport) {
    match (report.mode, report.had_errors) {
        (SyncMode::Fallback, _) => {
            tracing::warn!("no remote access, snapshots left as they were")
        }
        (SyncMode::Remote, true) => {
            tracing::warn!("completed with some errors (using fallback data)")
        }
        (SyncMode::Remote, false) => tracing::info!("all data fetched successfully"),
    }
}
