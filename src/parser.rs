use eyre::Result;
use html2text::config;
use regex::{Captures, Regex};

use crate::html::OPAQUE_MARKUP;

/// Rendered rows a heading occupies in the text layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    pub id: String,
    pub row: usize,
    pub height: usize,
}

/// Plain-text layout of a document root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStructure {
    pub text_lines: Vec<String>,
    pub sections: Vec<SectionSpan>,
}

impl TextStructure {
    pub fn section(&self, id: &str) -> Option<&SectionSpan> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn is_heading_row(&self, row: usize) -> bool {
        self.sections
            .iter()
            .any(|s| row >= s.row && row < s.row + s.height)
    }
}

const MARKER_OPEN: &str = "@@docnav:";
const MARKER_CLOSE: &str = "@@";

/// Lay out anchored HTML as text lines, recording where every `h2`/`h3`
/// with an id lands.
pub fn parse_html(html_src: &str, text_width: Option<usize>) -> Result<TextStructure> {
    let text_width = text_width.unwrap_or(80).max(20);
    let (marked, ids) = mark_headings(html_src)?;
    let lines = html_to_plain_text(&marked, text_width)?;
    Ok(collect_sections(lines, &ids))
}

/// Put a numbered marker paragraph in front of each anchored heading and
/// return the ids in marker order. Markers carry the index rather than the id
/// so they never wrap.
fn mark_headings(html: &str) -> Result<(String, Vec<String>)> {
    let heading_re = Regex::new(&format!(
        r#"(?is){}|(?P<open><h[23]\s[^>]*?\bid\s*=\s*"(?P<id>[^"]*)"[^>]*>)"#,
        OPAQUE_MARKUP
    ))?;
    let mut ids = Vec::new();
    let marked = heading_re
        .replace_all(html, |caps: &Captures| match (caps.name("open"), caps.name("id")) {
            (Some(open), Some(id)) => {
                let marker = format!("<p>{}{}{}</p>{}", MARKER_OPEN, ids.len(), MARKER_CLOSE, open.as_str());
                ids.push(id.as_str().to_string());
                marker
            }
            _ => caps[0].to_string(),
        })
        .into_owned();
    Ok((marked, ids))
}

fn html_to_plain_text(html: &str, width: usize) -> Result<Vec<String>> {
    let text = config::plain()
        .link_footnotes(false)
        .string_from_read(html.as_bytes(), width)?;
    Ok(text.lines().map(|s| s.to_string()).collect())
}

/// Drop marker lines (and the blank line html2text puts after them) and
/// turn them into section spans.
fn collect_sections(lines: Vec<String>, ids: &[String]) -> TextStructure {
    let mut text_lines = Vec::with_capacity(lines.len());
    let mut sections = Vec::new();
    let mut pending: Option<String> = None;

    for line in lines {
        if let Some(index) = marker_index(&line) {
            pending = ids.get(index).cloned();
            continue;
        }
        if pending.is_some() && line.trim().is_empty() {
            continue;
        }
        if let Some(id) = pending.take() {
            sections.push(SectionSpan {
                id,
                row: text_lines.len(),
                height: 1,
            });
        }
        text_lines.push(line);
    }
    if let Some(id) = pending {
        sections.push(SectionSpan {
            id,
            row: text_lines.len(),
            height: 1,
        });
    }

    for section in sections.iter_mut() {
        section.height = text_lines[section.row.min(text_lines.len())..]
            .iter()
            .take_while(|line| !line.trim().is_empty())
            .count()
            .max(1);
    }

    TextStructure {
        text_lines,
        sections,
    }
}

fn marker_index(line: &str) -> Option<usize> {
    let rest = line.trim().strip_prefix(MARKER_OPEN)?;
    rest.strip_suffix(MARKER_CLOSE)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_index() {
        assert_eq!(marker_index("@@docnav:2@@"), Some(2));
        assert_eq!(marker_index("  @@docnav:0@@ "), Some(0));
        assert_eq!(marker_index("@@docnav:intro@@"), None);
        assert_eq!(marker_index("plain"), None);
    }

    #[test]
    fn test_mark_headings_only_touches_anchored() {
        let (marked, ids) = mark_headings(r#"<h2 id="a">A</h2><h3>B</h3><h4 id="c">C</h4><h3 id="d">D</h3>"#).unwrap();
        assert!(marked.starts_with(r#"<p>@@docnav:0@@</p><h2 id="a">"#));
        assert!(marked.contains(r#"<p>@@docnav:1@@</p><h3 id="d">"#));
        assert_eq!(marked.matches("@@docnav:").count(), 2);
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn test_mark_headings_skips_comments_and_scripts() {
        let html = r#"<!-- <h2 id="old">Old</h2> --><script>let s = '<h2 id="js">';</script><h2 id="new">New</h2>"#;
        let (marked, ids) = mark_headings(html).unwrap();
        assert_eq!(ids, vec!["new"]);
        assert!(marked.contains(r#"<!-- <h2 id="old">Old</h2> -->"#));
    }

    #[test]
    fn test_long_ids_survive_wrapping() {
        let id = "a-really-long-heading-title-that-goes-on-and-on-past-the-wrap-width-of-the-text";
        let html = format!(r#"<p>x</p><h2 id="{}">A really long heading</h2><p>Body.</p>"#, id);
        let structure = parse_html(&html, Some(40)).unwrap();
        let section = structure.section(id).unwrap();
        assert!(structure.text_lines[section.row].contains("A really long heading"));
        assert!(structure.text_lines.iter().all(|l| !l.contains("@@")));
    }

    #[test]
    fn test_collect_sections_strips_markers() {
        let lines = vec![
            "Preface".to_string(),
            "".to_string(),
            "@@docnav:0@@".to_string(),
            "".to_string(),
            "## Intro".to_string(),
            "".to_string(),
            "Body text".to_string(),
        ];
        let structure = collect_sections(lines, &["intro".to_string()]);
        assert_eq!(structure.text_lines.len(), 5);
        let intro = structure.section("intro").unwrap();
        assert_eq!(intro.row, 2);
        assert_eq!(intro.height, 1);
        assert_eq!(structure.text_lines[intro.row], "## Intro");
        assert!(structure.is_heading_row(2));
        assert!(!structure.is_heading_row(4));
    }

    #[test]
    fn test_parse_html_locates_headings() {
        let html = r#"<p>First paragraph.</p><h2 id="intro">Intro</h2><p>Text.</p><h3 id="usage">Usage</h3><p>More.</p>"#;
        let structure = parse_html(html, Some(60)).unwrap();
        let intro = structure.section("intro").unwrap();
        let usage = structure.section("usage").unwrap();
        assert!(intro.row < usage.row);
        assert!(structure.text_lines[intro.row].contains("Intro"));
        assert!(structure.text_lines[usage.row].contains("Usage"));
        assert!(structure.text_lines.iter().all(|l| !l.contains("@@docnav:")));
    }
}
