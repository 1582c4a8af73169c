use std::collections::HashSet;

use crate::logging;
use crate::models::Heading;
use crate::slug::slugify;

/// Identifiers already handed out during one page lifecycle.
#[derive(Debug, Clone, Default)]
pub struct AnchorRegistry {
    used: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Reserve `candidate`, or the first free `candidate-N` with N starting
    /// at 2, and return the reserved id.
    pub fn allocate(&mut self, candidate: &str) -> String {
        let mut id = candidate.to_string();
        let mut suffix = 2;
        while self.used.contains(&id) {
            id = format!("{}-{}", candidate, suffix);
            suffix += 1;
        }
        self.used.insert(id.clone());
        id
    }
}

/// Give `heading` a unique anchor and record it in `registry`.
///
/// A pre-declared id wins over the slug of the label; collisions get a
/// numeric suffix in encounter order.
pub fn ensure_id(heading: &mut Heading, registry: &mut AnchorRegistry) -> String {
    let candidate = match heading.anchor() {
        Some(existing) => existing.to_string(),
        None => slugify(&heading.label),
    };
    let id = registry.allocate(&candidate);
    if id != candidate {
        logging::debug(format!("anchor '{}' taken, using '{}'", candidate, id));
    }
    heading.id = Some(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeadingLevel;

    fn heading(label: &str) -> Heading {
        Heading::new(HeadingLevel::H2, label)
    }

    #[test]
    fn test_duplicate_labels_get_suffixes() {
        let mut registry = AnchorRegistry::new();
        let mut headings = vec![heading("Intro"), heading("Intro")];
        let ids: Vec<String> = headings
            .iter_mut()
            .map(|h| ensure_id(h, &mut registry))
            .collect();
        assert_eq!(ids, vec!["intro", "intro-2"]);
        assert_eq!(headings[1].id.as_deref(), Some("intro-2"));
    }

    #[test]
    fn test_suffix_sequence_in_encounter_order() {
        let mut registry = AnchorRegistry::new();
        let ids: Vec<String> = (0..4)
            .map(|_| ensure_id(&mut heading("Notes"), &mut registry))
            .collect();
        assert_eq!(ids, vec!["notes", "notes-2", "notes-3", "notes-4"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_existing_id_takes_precedence() {
        let mut registry = AnchorRegistry::new();
        let mut h = heading("Intro").with_id("custom-anchor");
        assert_eq!(ensure_id(&mut h, &mut registry), "custom-anchor");
        assert!(registry.contains("custom-anchor"));
        assert!(!registry.contains("intro"));
    }

    #[test]
    fn test_existing_id_collision_is_suffixed() {
        let mut registry = AnchorRegistry::new();
        let mut first = heading("Setup");
        let mut second = heading("Other").with_id("setup");
        assert_eq!(ensure_id(&mut first, &mut registry), "setup");
        assert_eq!(ensure_id(&mut second, &mut registry), "setup-2");
    }

    #[test]
    fn test_skips_suffixes_already_in_use() {
        let mut registry = AnchorRegistry::new();
        let mut a = heading("x").with_id("faq-2");
        let mut b = heading("FAQ");
        let mut c = heading("FAQ");
        ensure_id(&mut a, &mut registry);
        assert_eq!(ensure_id(&mut b, &mut registry), "faq");
        assert_eq!(ensure_id(&mut c, &mut registry), "faq-3");
    }

    #[test]
    fn test_empty_label_uses_fallback() {
        let mut registry = AnchorRegistry::new();
        assert_eq!(ensure_id(&mut heading(""), &mut registry), "section");
        assert_eq!(ensure_id(&mut heading("?!"), &mut registry), "section-2");
    }

    #[test]
    fn test_stable_across_fresh_registries() {
        let labels = ["Intro", "Usage", "Intro"];
        let run = || {
            let mut registry = AnchorRegistry::new();
            labels
                .iter()
                .map(|l| ensure_id(&mut heading(l), &mut registry))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
