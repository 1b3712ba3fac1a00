// src/snapshot.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::{ContentCategory, Snapshot};

pub fn snapshot_path(data_dir: &Path, category: ContentCategory) -> PathBuf {
    data_dir.join(category.file_name())
}

/// Last persisted snapshot for `category`, or an empty one.
/// A missing file and an unparsable file are treated the same.
pub fn load_fallback(path: &Path, category: ContentCategory) -> Snapshot {
    let Ok(content) = fs::read_to_string(path) else {
        return Snapshot::empty(category);
    };
    match Snapshot::from_json(category, &content) {
        Ok(snap) => snap,
        Err(e) => {
            tracing::debug!(error = %e, path = %path.display(), "fallback snapshot unreadable");
            Snapshot::empty(category)
        }
    }
}

/// Overwrite `path` with the pretty-printed snapshot.
/// Written to a sibling temp file first, then renamed into place.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = snapshot
        .to_json_pretty()
        .with_context(|| format!("serializing {} snapshot", snapshot.category()))?;
    write_atomic(path, json.as_bytes())
}

/// Write `[]` when no snapshot exists yet. Returns whether a file was created.
pub fn ensure_placeholder(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_atomic(path, b"[]")?;
    Ok(true)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CommitteeMember, Event, GalleryImage};

    #[test]
    fn round_trip_reproduces_records() {
        let dir = tempfile::tempdir().unwrap();
        let snaps = [
            Snapshot::Events(vec![
                Event {
                    id: 1,
                    title: "International Yoga Day".into(),
                    date: "21st June 2025".into(),
                    location: "Avondale Community Centre".into(),
                    description: "Yoga, mindfulness, and wellness celebration.".into(),
                },
                Event {
                    id: 2,
                    title: "Teej Mela (Fair)".into(),
                    date: "2nd August 2025".into(),
                    location: "Blockhouse Bay".into(),
                    description: String::new(),
                },
            ]),
            Snapshot::Gallery(vec![GalleryImage {
                id: 1,
                imageurl: "cms/abc.jpg".into(),
                alt: "Diwali".into(),
                caption: Some("Dance".into()),
            }]),
            Snapshot::Committee(vec![CommitteeMember {
                id: 1,
                name: "Chair".into(),
                title: "Chairperson".into(),
                photourl: "committee-members-chairperson".into(),
            }]),
        ];
        for snap in snaps {
            let p = snapshot_path(dir.path(), snap.category());
            write_snapshot(&p, &snap).unwrap();
            assert_eq!(load_fallback(&p, snap.category()), snap);
        }
    }

    #[test]
    fn output_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("events.json");
        let snap = Snapshot::Events(vec![Event {
            id: 1,
            title: "t".into(),
            date: "d".into(),
            location: "l".into(),
            description: "x".into(),
        }]);
        write_snapshot(&p, &snap).unwrap();
        let text = fs::read_to_string(&p).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": 1,"));
        assert!(!dir.path().join("events.json.tmp").exists());
    }

    #[test]
    fn missing_or_broken_fallback_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("gallery.json");
        assert_eq!(
            load_fallback(&p, ContentCategory::Gallery),
            Snapshot::Gallery(vec![])
        );
        fs::write(&p, "{ definitely not json").unwrap();
        assert!(load_fallback(&p, ContentCategory::Gallery).is_empty());
    }

    #[test]
    fn placeholder_only_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nested").join("committee.json");
        assert!(ensure_placeholder(&p).unwrap());
        assert_eq!(fs::read_to_string(&p).unwrap(), "[]");

        fs::write(&p, r#"[{"id":1,"name":"kept"}]"#).unwrap();
        assert!(!ensure_placeholder(&p).unwrap());
        assert!(fs::read_to_string(&p).unwrap().contains("kept"));
    }
}
