//! content.rs — categories, typed snapshot records and the staged-to-typed step.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::StagedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentCategory {
    Events,
    Gallery,
    Committee,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 3] = [
        ContentCategory::Events,
        ContentCategory::Gallery,
        ContentCategory::Committee,
    ];

    /// Sheet (tab) name in the remote spreadsheet.
    pub fn sheet_name(self) -> &'static str {
        match self {
            ContentCategory::Events => "Events",
            ContentCategory::Gallery => "Gallery",
            ContentCategory::Committee => "Committee",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ContentCategory::Events => "events.json",
            ContentCategory::Gallery => "gallery.json",
            ContentCategory::Committee => "committee.json",
        }
    }

    /// Normalized key holding an image reference, if the category has one.
    pub fn image_field(self) -> Option<&'static str> {
        match self {
            ContentCategory::Events => None,
            ContentCategory::Gallery => Some("imageurl"),
            ContentCategory::Committee => Some("photourl"),
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: u32,
    #[serde(default)]
    pub imageurl: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub photourl: String,
}

/// One category's records, as persisted to (and read back from) its JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Events(Vec<Event>),
    Gallery(Vec<GalleryImage>),
    Committee(Vec<CommitteeMember>),
}

impl Snapshot {
    pub fn empty(category: ContentCategory) -> Self {
        match category {
            ContentCategory::Events => Snapshot::Events(Vec::new()),
            ContentCategory::Gallery => Snapshot::Gallery(Vec::new()),
            ContentCategory::Committee => Snapshot::Committee(Vec::new()),
        }
    }

    pub fn category(&self) -> ContentCategory {
        match self {
            Snapshot::Events(_) => ContentCategory::Events,
            Snapshot::Gallery(_) => ContentCategory::Gallery,
            Snapshot::Committee(_) => ContentCategory::Committee,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Snapshot::Events(v) => v.len(),
            Snapshot::Gallery(v) => v.len(),
            Snapshot::Committee(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type staged rows into the category's fixed schema.
    /// Columns the schema does not know are dropped; missing ones become "".
    pub fn from_staged(category: ContentCategory, records: &[StagedRecord]) -> Self {
        match category {
            ContentCategory::Events => Snapshot::Events(
                records
                    .iter()
                    .map(|r| Event {
                        id: r.id,
                        title: r.get_or_empty("title"),
                        date: r.get_or_empty("date"),
                        location: r.get_or_empty("location"),
                        description: r.get_or_empty("description"),
                    })
                    .collect(),
            ),
            ContentCategory::Gallery => Snapshot::Gallery(
                records
                    .iter()
                    .map(|r| GalleryImage {
                        id: r.id,
                        imageurl: r.get_or_empty("imageurl"),
                        alt: r.get_or_empty("alt"),
                        caption: r.get("caption").map(str::to_string),
                    })
                    .collect(),
            ),
            ContentCategory::Committee => Snapshot::Committee(
                records
                    .iter()
                    .map(|r| CommitteeMember {
                        id: r.id,
                        name: r.get_or_empty("name"),
                        title: r.get_or_empty("title"),
                        photourl: r.get_or_empty("photourl"),
                    })
                    .collect(),
            ),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        match self {
            Snapshot::Events(v) => serde_json::to_string_pretty(v),
            Snapshot::Gallery(v) => serde_json::to_string_pretty(v),
            Snapshot::Committee(v) => serde_json::to_string_pretty(v),
        }
    }

    pub fn from_json(category: ContentCategory, s: &str) -> serde_json::Result<Self> {
        Ok(match category {
            ContentCategory::Events => Snapshot::Events(serde_json::from_str(s)?),
            ContentCategory::Gallery => Snapshot::Gallery(serde_json::from_str(s)?),
            ContentCategory::Committee => Snapshot::Committee(serde_json::from_str(s)?),
        })
    }
}
