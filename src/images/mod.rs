// src/images/mod.rs
pub mod shapes;

use anyhow::{anyhow, bail, Context, Result};
use metrics::counter;
use reqwest::{
    header::{LOCATION, USER_AGENT},
    redirect::Policy,
    StatusCode, Url,
};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::config::SyncConfig;
use crate::normalize::StagedRecord;
pub use shapes::{detect, drive_shapes, ImageRef, RegexShape, UrlShape};

pub const DEFAULT_EXT: &str = ".jpg";
/// Prefix snapshot values use for mirrored files.
pub const LOCAL_PREFIX: &str = "cms/";
const FETCH_USER_AGENT: &str = "Mozilla/5.0 (compatible; cms-sync/0.1)";

/// Mirrors externally hosted images into the local asset directory.
pub struct ImageResolver {
    shapes: Vec<Box<dyn UrlShape>>,
    mirror_dir: PathBuf,
    image_base: String,
    http: reqwest::Client,
    max_redirects: u8,
}

impl ImageResolver {
    pub fn new(cfg: &SyncConfig) -> Result<Self> {
        // Redirects are followed by hand so the hop budget is ours.
        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .redirect(Policy::none())
            .build()
            .context("building image http client")?;
        Ok(Self {
            shapes: drive_shapes(),
            mirror_dir: cfg.images_dir.clone(),
            image_base: cfg.image_base.trim_end_matches('/').to_string(),
            http,
            max_redirects: cfg.max_redirects,
        })
    }

    /// Replace the recognized URL shapes (registry order is match order).
    pub fn with_shapes(mut self, shapes: Vec<Box<dyn UrlShape>>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn detect(&self, value: &str) -> Option<ImageRef> {
        detect(&self.shapes, value)
    }

    /// Direct-download endpoint for a content id.
    pub fn download_url(&self, image: &ImageRef) -> String {
        format!("{}/{}", self.image_base, image.content_id)
    }

    /// Make sure the mirror holds `image`, returning its `cms/<file>` reference.
    /// An existing file is reused without touching the network.
    pub async fn localize(&self, image: &ImageRef) -> Result<String> {
        let file_name = image.file_name();
        let dest = self.mirror_dir.join(&file_name);

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            return Ok(format!("{LOCAL_PREFIX}{file_name}"));
        }

        tokio::fs::create_dir_all(&self.mirror_dir)
            .await
            .with_context(|| format!("creating {}", self.mirror_dir.display()))?;

        let url = self.download_url(image);
        let bytes = download_to(&self.http, &url, &dest, self.max_redirects).await?;
        counter!("cms_sync_images_mirrored_total").increment(1);
        tracing::debug!(content_id = %image.content_id, bytes, "image mirrored");
        Ok(format!("{LOCAL_PREFIX}{file_name}"))
    }

    /// Rewrite `field` on every record whose value is a recognized remote image.
    /// A failed download keeps the record exactly as it was.
    pub async fn resolve_records(
        &self,
        records: Vec<StagedRecord>,
        field: &str,
    ) -> Vec<StagedRecord> {
        let mut out = Vec::with_capacity(records.len());
        for mut rec in records {
            let Some(image) = rec.get(field).and_then(|v| self.detect(v)) else {
                out.push(rec);
                continue;
            };

            let label = rec
                .get("alt")
                .or_else(|| rec.get("name"))
                .filter(|s| !s.is_empty())
                .unwrap_or(&image.content_id)
                .to_string();
            tracing::info!(image = %label, "resolving image");

            match self.localize(&image).await {
                Ok(local) => rec.set(field, local),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), content_id = %image.content_id, "image download failed, keeping original url");
                    counter!("cms_sync_image_errors_total").increment(1);
                }
            }
            out.push(rec);
        }
        out
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(".part");
    PathBuf::from(s)
}

/// GET `url` and stream a 200 body into `dest`, returning the byte count.
///
/// `max_requests` bounds the whole chain including the first request, so at
/// most `max_requests - 1` redirects are followed.
pub async fn download_to(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
    max_requests: u8,
) -> Result<u64> {
    let mut current = Url::parse(url).with_context(|| format!("invalid download url {url}"))?;
    let mut budget = max_requests;

    let resp = loop {
        if budget == 0 {
            bail!("too many redirects (limit {max_requests} requests)");
        }
        budget -= 1;
        let resp = http
            .get(current.clone())
            .header(USER_AGENT, FETCH_USER_AGENT)
            .send()
            .await
            .with_context(|| format!("GET {current}"))?;

        let status = resp.status();
        if status.is_redirection() {
            if let Some(location) = resp.headers().get(LOCATION) {
                let location = location
                    .to_str()
                    .map_err(|_| anyhow!("non-ascii redirect location"))?;
                // relative locations resolve against the current url
                current = current
                    .join(location)
                    .with_context(|| format!("bad redirect location {location}"))?;
                continue;
            }
        }
        if status != StatusCode::OK {
            bail!("HTTP {status} from {current}");
        }
        break resp;
    };

    let part = part_path(dest);
    match stream_body(resp, &part).await {
        Ok(n) => {
            tokio::fs::rename(&part, dest)
                .await
                .with_context(|| format!("moving download into {}", dest.display()))?;
            Ok(n)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            Err(e)
        }
    }
}

async fn stream_body(mut resp: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await.context("reading image body")? {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
