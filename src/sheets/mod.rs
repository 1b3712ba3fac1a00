// src/sheets/mod.rs
pub mod auth;
pub mod client;

use anyhow::Result;

use crate::normalize::RawRows;

pub use auth::{AccessTokenProvider, ServiceAccountAuth, ServiceAccountKey, StaticToken};
pub use client::SheetsClient;

/// Read side of the remote spreadsheet.
#[async_trait::async_trait]
pub trait TabularSource: Send + Sync {
    /// Raw cell grid for one sheet (header row first).
    async fn fetch_rows(&self, sheet: &str) -> Result<RawRows>;
}

/// Write side, used only by the seeding entry point.
#[async_trait::async_trait]
pub trait TabularSink: Send + Sync {
    /// Replace the sheet's leading rows with `rows` and clear whatever
    /// previously sat below them.
    async fn overwrite(&self, sheet: &str, rows: &RawRows) -> Result<()>;
}

/// Spreadsheet column letter for a 1-based column index (1 → A, 27 → AA).
pub fn column_letter(mut index: usize) -> String {
    let mut out = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        out.push(b'A' + rem as u8);
        index = (index - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
