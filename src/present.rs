//! present.rs — consumer-side view of the snapshots: resolves `cms/<file>`
//! references against the mirror directory and shapes items for templates.

use serde::Serialize;
use std::path::Path;

use crate::content::{CommitteeMember, GalleryImage};
use crate::images::LOCAL_PREFIX;

/// - `cms/<file>`: the mirror path if the file exists, else `""` (logged)
/// - anything else (external urls, local identifiers): unchanged
pub fn resolve_image_url(value: &str, mirror_dir: &Path) -> String {
    if value.is_empty() {
        return String::new();
    }
    if let Some(file) = value.strip_prefix(LOCAL_PREFIX) {
        let candidate = mirror_dir.join(file);
        if !file.is_empty() && candidate.is_file() {
            return candidate.to_string_lossy().into_owned();
        }
        tracing::warn!(reference = value, "CMS image not found");
        return String::new();
    }
    value.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    pub id: u32,
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitteeItem {
    pub name: String,
    pub title: String,
    pub photo: String,
}

pub fn gallery_items(images: &[GalleryImage], mirror_dir: &Path) -> Vec<GalleryItem> {
    images
        .iter()
        .map(|g| GalleryItem {
            id: g.id,
            src: resolve_image_url(&g.imageurl, mirror_dir),
            alt: g.alt.clone(),
            caption: g.caption.clone(),
        })
        .collect()
}

pub fn committee_items(members: &[CommitteeMember], mirror_dir: &Path) -> Vec<CommitteeItem> {
    members
        .iter()
        .map(|m| CommitteeItem {
            name: m.name.clone(),
            title: m.title.clone(),
            photo: resolve_image_url(&m.photourl, mirror_dir),
        })
        .collect()
}
