// src/normalize.rs
use once_cell::sync::OnceCell;
use regex::Regex;

/// Raw cell grid as returned by the sheet; row 0 holds the header labels.
pub type RawRows = Vec<Vec<String>>;

/// Loosely typed row between the sheet and the typed snapshot.
/// Keys keep header order; `id` is the 1-based position among kept rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRecord {
    pub id: u32,
    pub fields: Vec<(String, String)>,
}

impl StagedRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Replace the value under `key` in place, or append it.
    pub fn set(&mut self, key: &str, value: String) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }
}

/// Header label → record key: trim, lowercase, whitespace runs to `_`.
pub fn normalize_header(label: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws
        .replace_all(&label.trim().to_lowercase(), "_")
        .into_owned()
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Turn a header + data grid into staged records.
///
/// Blank rows are dropped before numbering, so ids stay contiguous.
/// Short rows read as "" for the missing columns. Fewer than two rows
/// (no data) gives an empty result rather than an error.
pub fn normalize_rows(rows: &[Vec<String>]) -> Vec<StagedRecord> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };
    if data.is_empty() {
        return Vec::new();
    }

    let keys: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

    data.iter()
        .filter(|row| !is_blank_row(row))
        .enumerate()
        .map(|(idx, row)| {
            let mut rec = StagedRecord {
                id: (idx + 1) as u32,
                fields: Vec::with_capacity(keys.len()),
            };
            for (col, key) in keys.iter().enumerate() {
                let value = row.get(col).map(|c| c.trim()).unwrap_or_default();
                rec.set(key, value.to_string());
            }
            rec
        })
        .collect()
}
