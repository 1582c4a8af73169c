//! Printable forms of a built table of contents.

use eyre::Result;
use serde::Serialize;

use crate::location::with_fragment;
use crate::models::{HeadingLevel, Toc};

#[derive(Debug, Serialize)]
pub struct SectionReport {
    pub id: String,
    pub level: u8,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct TocReport {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_url: Option<String>,
    pub sections: Vec<SectionReport>,
}

impl TocReport {
    pub fn new(toc: &Toc, page_url: &str, back_url: Option<&str>) -> Self {
        Self {
            url: page_url.to_string(),
            back_url: back_url.map(str::to_string),
            sections: toc
                .links
                .iter()
                .map(|link| SectionReport {
                    id: link.target.clone(),
                    level: link.level.depth(),
                    label: link.label.clone(),
                    url: with_fragment(page_url, &link.target),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One line per link, level-3 entries indented under their level-2 parent.
pub fn outline(toc: &Toc) -> String {
    let mut out = String::new();
    for link in &toc.links {
        let indent = match link.level {
            HeadingLevel::H2 => "",
            HeadingLevel::H3 => "  ",
        };
        out.push_str(&format!("{}{} {}  #{}\n", indent, link.level.badge(), link.label, link.target));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NavLink;

    fn toc() -> Toc {
        let link = |target: &str, level, label: &str| NavLink {
            target: target.to_string(),
            level,
            label: label.to_string(),
            active: false,
        };
        Toc {
            headings: Vec::new(),
            links: vec![
                link("intro", HeadingLevel::H2, "Intro"),
                link("setup", HeadingLevel::H3, "Setup"),
            ],
        }
    }

    #[test]
    fn test_outline() {
        assert_eq!(outline(&toc()), "H2 Intro  #intro\n  H3 Setup  #setup\n");
        assert_eq!(outline(&Toc::default()), "");
    }

    #[test]
    fn test_report_urls() {
        let report = TocReport::new(&toc(), "https://example.com/guide.html", None);
        assert_eq!(report.sections[1].url, "https://example.com/guide.html#setup");
        assert_eq!(report.sections[1].level, 3);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["sections"][0]["id"], "intro");
        assert!(json.get("back_url").is_none());
    }
}
