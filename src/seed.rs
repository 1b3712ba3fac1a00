// src/seed.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::normalize::RawRows;
use crate::sheets::TabularSink;

/// Dataset pushed to the spreadsheet by `populate-sheets`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedData {
    pub sheets: Vec<SeedSheet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedSheet {
    pub name: String,
    /// Header row first.
    pub rows: RawRows,
}

impl SeedSheet {
    pub fn item_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

pub fn parse_seed(s: &str) -> Result<SeedData> {
    let data: SeedData = toml::from_str(s).context("parsing seed toml")?;
    for sheet in &data.sheets {
        if sheet.name.trim().is_empty() {
            bail!("seed sheet with an empty name");
        }
        if sheet.rows.is_empty() {
            bail!("seed sheet {} has no header row", sheet.name);
        }
    }
    Ok(data)
}

pub fn load_seed(path: &Path) -> Result<SeedData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading seed data from {}", path.display()))?;
    parse_seed(&content).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Push every seed sheet in order; the first failure aborts the rest.
pub async fn push_seed(sink: &dyn TabularSink, data: &SeedData) -> Result<()> {
    for sheet in &data.sheets {
        tracing::info!(sheet = %sheet.name, "updating sheet");
        sink.overwrite(&sheet.name, &sheet.rows)
            .await
            .with_context(|| format!("updating {} sheet", sheet.name))?;
        tracing::info!(sheet = %sheet.name, items = sheet.item_count(), "sheet updated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sheets_in_order() {
        let s = r#"
[[sheets]]
name = "Events"
rows = [["title", "date"], ["Yoga Day", "21 June"]]

[[sheets]]
name = "Gallery"
rows = [["imageUrl", "alt"]]
"#;
        let d = parse_seed(s).unwrap();
        assert_eq!(d.sheets.len(), 2);
        assert_eq!(d.sheets[0].name, "Events");
        assert_eq!(d.sheets[0].item_count(), 1);
        assert_eq!(d.sheets[1].item_count(), 0);
    }

    #[test]
    fn rejects_headerless_sheet() {
        let s = r#"
[[sheets]]
name = "Events"
rows = []
"#;
        assert!(parse_seed(s).is_err());
    }

    #[test]
    fn bundled_seed_file_parses() {
        let d = load_seed(Path::new("config/sheet_seed.toml")).unwrap();
        let names: Vec<_> = d.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Events", "Gallery", "Committee"]);
    }
}
