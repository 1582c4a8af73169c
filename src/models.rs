use serde::{Deserialize, Serialize};

/// Section depth of a heading that takes part in the table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H2,
    H3,
}

impl Default for HeadingLevel {
    fn default() -> Self {
        HeadingLevel::H2
    }
}

impl HeadingLevel {
    /// Accepts `h2`/`h3` in any case; every other tag is outside the TOC.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("h2") {
            Some(HeadingLevel::H2)
        } else if tag.eq_ignore_ascii_case("h3") {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }

    pub fn depth(self) -> u8 {
        match self {
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
        }
    }

    /// Badge text shown next to a TOC link.
    pub fn badge(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

/// A heading element of the document root.
///
/// `id` may be pre-declared by the document; once the anchor allocator has
/// run it always holds the unique anchor for this page lifecycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub label: String,
    pub id: Option<String>,
    /// Whether the clickable anchor affordance is already attached.
    pub decorated: bool,
}

impl Heading {
    pub fn new(level: HeadingLevel, label: impl Into<String>) -> Self {
        Self {
            level,
            label: label.into(),
            id: None,
            decorated: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The pre-declared or assigned id, treating an empty attribute as absent.
    pub fn anchor(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// One rendered entry of the navigation container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    pub target: String,
    pub level: HeadingLevel,
    pub label: String,
    #[serde(default)]
    pub active: bool,
}

impl NavLink {
    pub fn href(&self) -> String {
        format!("#{}", self.target)
    }
}

/// Result of building the table of contents: headings and links are parallel
/// and in document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Toc {
    pub headings: Vec<Heading>,
    pub links: Vec<NavLink>,
}

impl Toc {
    pub fn is_empty(&self) -> bool {
        self.headings.is_empty() || self.links.is_empty()
    }
}

/// One observation of a heading against the viewport band.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: String,
    pub ratio: f64,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn new(target: impl Into<String>, ratio: f64, is_intersecting: bool) -> Self {
        Self {
            target: target.into(),
            ratio,
            is_intersecting,
        }
    }
}

/// Vertical extent of an element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Scroll offset and height of the visible area, in document units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_y: f64,
    pub height: f64,
}
