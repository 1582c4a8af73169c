use crate::anchors::{AnchorRegistry, ensure_id};
use crate::logging;
use crate::models::{Heading, NavLink, Toc};
use crate::slug::slugify;
use crate::spy::mark_active;

/// The document element whose level-2 and level-3 headings feed the TOC.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentRoot {
    pub headings: Vec<Heading>,
}

impl DocumentRoot {
    pub fn new(headings: Vec<Heading>) -> Self {
        Self { headings }
    }

    pub fn heading(&self, id: &str) -> Option<&Heading> {
        self.headings.iter().find(|h| h.anchor() == Some(id))
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.headings.iter().position(|h| h.anchor() == Some(id))
    }
}

/// The element whose children are replaced by the generated links.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavContainer {
    pub links: Vec<NavLink>,
}

impl NavContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_links(&mut self, links: Vec<NavLink>) {
        self.links = links;
    }

    /// Flag the link pointing at `target` and clear every other flag.
    pub fn set_active(&mut self, target: &str) {
        mark_active(&mut self.links, target);
    }

    pub fn active(&self) -> Option<&NavLink> {
        self.links.iter().find(|l| l.active)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.links.iter().position(|l| l.active)
    }
}

/// Build the table of contents with a fresh anchor registry.
pub fn build_toc(root: Option<&mut DocumentRoot>, nav: Option<&mut NavContainer>) -> Toc {
    let mut registry = AnchorRegistry::new();
    build_toc_with(root, nav, &mut registry)
}

/// Assign anchors to the root's headings, then fill the nav container with
/// one link per heading. Either side missing makes this a no-op.
pub fn build_toc_with(
    root: Option<&mut DocumentRoot>,
    nav: Option<&mut NavContainer>,
    registry: &mut AnchorRegistry,
) -> Toc {
    let (Some(root), Some(nav)) = (root, nav) else {
        logging::debug("document root or nav container missing, skipping TOC");
        return Toc::default();
    };

    assign_anchors(&mut root.headings, registry);
    let links = build_links(&root.headings);
    nav.replace_links(links.clone());

    logging::debug(format!("built TOC with {} entries", links.len()));
    Toc {
        headings: root.headings.clone(),
        links,
    }
}

/// Phase one: the only step that mutates headings.
pub fn assign_anchors(headings: &mut [Heading], registry: &mut AnchorRegistry) {
    for heading in headings.iter_mut() {
        ensure_id(heading, registry);
        heading.decorated = true;
    }
}

/// Phase two: derive links from already-anchored headings without touching them.
pub fn build_links(headings: &[Heading]) -> Vec<NavLink> {
    headings
        .iter()
        .map(|heading| NavLink {
            target: heading
                .anchor()
                .map(str::to_string)
                .unwrap_or_else(|| slugify(&heading.label)),
            level: heading.level,
            label: heading.label.trim().to_string(),
            active: false,
        })
        .collect()
}
