// src/images/shapes.rs
use regex::Regex;

/// Stable identity of a remotely hosted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Provider-assigned id; doubles as the mirror file stem.
    pub content_id: String,
    /// Extension including the dot, when the URL shape carries one.
    pub ext: Option<String>,
}

impl ImageRef {
    pub fn file_name(&self) -> String {
        format!(
            "{}{}",
            self.content_id,
            self.ext.as_deref().unwrap_or(super::DEFAULT_EXT)
        )
    }
}

/// One recognizable external-hosting URL form.
pub trait UrlShape: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, value: &str) -> Option<ImageRef>;
}

/// URL shape matched by a regex whose `id` group is the content id.
pub struct RegexShape {
    name: &'static str,
    re: Regex,
}

impl RegexShape {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            re: Regex::new(pattern)?,
        })
    }
}

impl UrlShape for RegexShape {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, value: &str) -> Option<ImageRef> {
        let caps = self.re.captures(value)?;
        let id = caps.name("id")?.as_str();
        Some(ImageRef {
            content_id: id.to_string(),
            ext: None,
        })
    }
}

// Ids end up as file names, so the id class excludes separators and dots.
const DRIVE_FILE: &str = r"drive\.google\.com/file/d/(?P<id>[A-Za-z0-9_-]+)";
const DRIVE_OPEN: &str = r"drive\.google\.com/open\?(?:[^#]*&)?id=(?P<id>[A-Za-z0-9_-]+)";
const DRIVE_UC: &str = r"drive\.google\.com/uc\?(?:[^#]*&)?id=(?P<id>[A-Za-z0-9_-]+)";

/// The three Drive link forms people paste into the sheet.
pub fn drive_shapes() -> Vec<Box<dyn UrlShape>> {
    [
        ("drive-file", DRIVE_FILE),
        ("drive-open", DRIVE_OPEN),
        ("drive-uc", DRIVE_UC),
    ]
    .into_iter()
    .filter_map(|(name, pat)| RegexShape::new(name, pat).ok())
    .map(|s| Box::new(s) as Box<dyn UrlShape>)
    .collect()
}

/// First shape that recognizes `value`, in registry order.
pub fn detect(shapes: &[Box<dyn UrlShape>], value: &str) -> Option<ImageRef> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    shapes.iter().find_map(|s| {
        let found = s.extract(value)?;
        tracing::debug!(shape = s.name(), content_id = %found.content_id, "image link recognized");
        Some(found)
    })
}
