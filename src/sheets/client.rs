// src/sheets/client.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value as Json};
use std::{sync::Arc, time::Duration};

use super::{column_letter, AccessTokenProvider, TabularSink, TabularSource};
use crate::normalize::RawRows;

/// Rows touched by an overwrite; anything below is left alone.
const WRITE_ROW_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Json>>>,
}

fn cell_to_string(v: Json) -> String {
    match v {
        Json::String(s) => s,
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

/// Plain HTTP client with the per-request timeout applied.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("building http client")
}

/// Spreadsheet values API client (v4 REST surface).
pub struct SheetsClient {
    http: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    auth: Arc<dyn AccessTokenProvider>,
}

impl SheetsClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        }
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with each segment encoded.
    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .with_context(|| format!("invalid sheets api base {}", self.api_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("sheets api base cannot carry a path: {}", self.api_base))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    pub async fn get_values(&self, range: &str) -> Result<RawRows> {
        let url = self.values_url(range)?;
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("sheets get {range}"))?
            .error_for_status()
            .with_context(|| format!("sheets get {range}"))?;

        let body: ValueRange = resp
            .json()
            .await
            .with_context(|| format!("sheets get {range}: malformed response"))?;

        Ok(body
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    pub async fn update_values(&self, range: &str, rows: &RawRows) -> Result<()> {
        let url = self.values_url(range)?;
        let token = self.auth.access_token().await?;
        self.http
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": rows }))
            .send()
            .await
            .with_context(|| format!("sheets update {range}"))?
            .error_for_status()
            .with_context(|| format!("sheets update {range}"))?;
        Ok(())
    }

    pub async fn clear_values(&self, range: &str) -> Result<()> {
        let url = self.values_url(&format!("{range}:clear"))?;
        let token = self.auth.access_token().await?;
        self.http
            .post(url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await
            .with_context(|| format!("sheets clear {range}"))?
            .error_for_status()
            .with_context(|| format!("sheets clear {range}"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TabularSource for SheetsClient {
    async fn fetch_rows(&self, sheet: &str) -> Result<RawRows> {
        self.get_values(&format!("{sheet}!A:Z")).await
    }
}

#[async_trait::async_trait]
impl TabularSink for SheetsClient {
    async fn overwrite(&self, sheet: &str, rows: &RawRows) -> Result<()> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let last_col = column_letter(width);

        self.update_values(&format!("{sheet}!A1:{last_col}{WRITE_ROW_LIMIT}"), rows)
            .await?;

        let first_stale = rows.len() + 1;
        if first_stale <= WRITE_ROW_LIMIT {
            self.clear_values(&format!("{sheet}!A{first_stale}:{last_col}{WRITE_ROW_LIMIT}"))
                .await?;
        }
        Ok(())
    }
}
