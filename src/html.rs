//! Reads the document root and navigation container out of an HTML page and
//! writes the built table of contents back as markup.

use eyre::{Result, eyre};
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};

use crate::logging;
use crate::models::{Heading, HeadingLevel, NavLink, Toc};
use crate::toc::{DocumentRoot, NavContainer, build_toc};

pub const ANCHOR_CLASS: &str = "h-anchor";
pub const LINK_CLASS: &str = "toc__a";
pub const LEVEL_CLASS: &str = "toc__lvl";
pub const ACTIVE_CLASS: &str = "is-active";

/// Serialized markup whose text may look like tags but holds no elements the
/// heading selector can reach: comments and raw-text or inert elements.
pub(crate) const OPAQUE_MARKUP: &str = concat!(
    r"(?:<!--.*?-->",
    r"|<script\b[^>]*>.*?</script\s*>",
    r"|<style\b[^>]*>.*?</style\s*>",
    r"|<template\b[^>]*>.*?</template\s*>",
    r"|<noscript\b[^>]*>.*?</noscript\s*>",
    r"|<textarea\b[^>]*>.*?</textarea\s*>",
    r"|<iframe\b[^>]*>.*?</iframe\s*>",
    r"|<xmp\b[^>]*>.*?</xmp\s*>",
    r"|<noembed\b[^>]*>.*?</noembed\s*>",
    r"|<noframes\b[^>]*>.*?</noframes\s*>)"
);

/// Link glyph placed in front of every decorated heading.
pub const ANCHOR_ICON: &str = concat!(
    r#"<svg class="h-anchor__icon" viewBox="0 0 24 24" fill="none" aria-hidden="true">"#,
    r#"<path d="M10 13a5 5 0 007.07 0l1.41-1.41a5 5 0 00-7.07-7.07L10 4.93" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"></path>"#,
    r#"<path d="M14 11a5 5 0 01-7.07 0L5.52 9.59a5 5 0 017.07-7.07L14 4" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"></path>"#,
    "</svg>"
);

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| eyre!("invalid selector `{}`: {}", selector, err))
}

/// One `<a class="toc__a">` entry.
pub fn render_link(link: &NavLink) -> String {
    let class = if link.active {
        format!("{} {}", LINK_CLASS, ACTIVE_CLASS)
    } else {
        LINK_CLASS.to_string()
    };
    format!(
        r#"<a class="{}" href="{}" data-target="{}" data-level="{}"><span class="{}">{}</span><span>{}</span></a>"#,
        class,
        escape_html(&link.href()),
        escape_html(&link.target),
        link.level.depth(),
        LEVEL_CLASS,
        link.level.badge(),
        escape_html(&link.label),
    )
}

pub fn render_links(links: &[NavLink]) -> String {
    links.iter().map(render_link).collect()
}

/// Inner markup of a heading once the anchor affordance is attached.
pub fn decorate_label(label: &str) -> String {
    format!(
        r#"<span class="{}">{}{}</span>"#,
        ANCHOR_CLASS,
        ANCHOR_ICON,
        escape_html(label)
    )
}

/// The page written back out with anchors, decorations and links in place.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub toc: Toc,
    pub html: String,
}

/// A parsed HTML page.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(source: &str) -> Self {
        Self {
            document: Html::parse_document(source),
        }
    }

    pub fn html(&self) -> String {
        self.document.html()
    }

    pub fn title(&self) -> Option<String> {
        let selector = parse_selector("title").ok()?;
        let title: String = self.document.select(&selector).next()?.text().collect();
        let title = title.trim();
        if title.is_empty() { None } else { Some(title.to_string()) }
    }

    fn first(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).next())
    }

    /// The level-2 and level-3 headings under the first element matching
    /// `selector`, in document order.
    pub fn document_root(&self, selector: &str) -> Result<Option<DocumentRoot>> {
        match self.first(selector)? {
            Some(element) => Ok(Some(DocumentRoot::new(read_headings(element)?))),
            None => Ok(None),
        }
    }

    pub fn nav_container(&self, selector: &str) -> Result<Option<NavContainer>> {
        Ok(self.first(selector)?.map(|_| NavContainer::new()))
    }

    /// Markup of the first element matching `selector` with anchored
    /// `headings` applied.
    pub fn anchored_html(&self, selector: &str, headings: &[Heading]) -> Result<Option<String>> {
        match self.first(selector)? {
            Some(element) => anchored_markup(element, headings).map(Some),
            None => Ok(None),
        }
    }

    /// Build the TOC and serialize the page with it applied. A missing root
    /// or container leaves the markup untouched.
    pub fn annotate(&self, root_selector: &str, nav_selector: &str) -> Result<Annotated> {
        let root_element = self.first(root_selector)?;
        let nav_element = self.first(nav_selector)?;
        if root_element.is_none() {
            logging::warn(format!("no element matches document root `{}`", root_selector));
        }
        if nav_element.is_none() {
            logging::warn(format!("no element matches nav container `{}`", nav_selector));
        }

        let mut root = root_element.map(read_headings).transpose()?.map(DocumentRoot::new);
        let mut nav = nav_element.map(|_| NavContainer::new());

        let toc = build_toc(root.as_mut(), nav.as_mut());
        let mut html = self.document.html();

        if let (Some(root_element), Some(nav_element), Some(root)) = (root_element, nav_element, root.as_ref()) {
            let original = root_element.html();
            let rewritten = anchored_markup(root_element, &root.headings)?;
            html = html.replacen(&original, &rewritten, 1);

            let nav_html = nav_element.html();
            let rebuilt = replace_children(&nav_html, nav_element.value().name(), &render_links(&toc.links));
            if html.contains(&nav_html) {
                html = html.replacen(&nav_html, &rebuilt, 1);
            } else {
                logging::warn("nav container overlaps a rewritten heading, links not written");
            }
        }

        Ok(Annotated { toc, html })
    }
}

/// Markup of `element` with `headings` (as returned by the TOC builder)
/// written into its `h2`/`h3` elements.
fn anchored_markup(element: ElementRef<'_>, headings: &[Heading]) -> Result<String> {
    let predecorated: Vec<bool> = read_headings(element)?.iter().map(|h| h.decorated).collect();
    rewrite_headings(&element.html(), headings, &predecorated)
}

fn read_headings(root: ElementRef<'_>) -> Result<Vec<Heading>> {
    let headings = parse_selector("h2, h3")?;
    let anchor = parse_selector(&format!(".{}", ANCHOR_CLASS))?;

    Ok(root
        .select(&headings)
        .filter(|element| !in_template(*element))
        .filter_map(|element| {
            let level = HeadingLevel::from_tag(element.value().name())?;
            let mut heading = Heading::new(level, element.text().collect::<String>());
            if let Some(id) = element.value().attr("id") {
                heading = heading.with_id(id);
            }
            heading.decorated = element.select(&anchor).next().is_some();
            Some(heading)
        })
        .collect())
}

/// Template contents are inert, so their headings are not part of the page.
fn in_template(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "template")
}

/// Give each serialized `h2`/`h3` its anchor id and, when not already
/// present, the anchor affordance. Headings are matched in document order;
/// comments and raw-text elements are passed through untouched so the count
/// agrees with [`read_headings`].
fn rewrite_headings(markup: &str, headings: &[Heading], predecorated: &[bool]) -> Result<String> {
    let heading_re = Regex::new(&format!(
        r"(?is){}|<h(?P<level>[23])(?P<attrs>\s[^>]*)?>(?P<inner>.*?)</h[23]\s*>",
        OPAQUE_MARKUP
    ))?;
    let id_re = Regex::new(r#"(?i)\s+id\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)?;

    let mut index = 0usize;
    let rewritten = heading_re.replace_all(markup, |caps: &Captures| {
        let Some(level) = caps.name("level") else {
            return caps[0].to_string();
        };
        let position = index;
        index += 1;
        let Some(heading) = headings.get(position) else {
            return caps[0].to_string();
        };
        let Some(id) = heading.anchor() else {
            return caps[0].to_string();
        };

        let attrs = caps.name("attrs").map_or("", |m| m.as_str());
        let attrs = id_re.replace_all(attrs, "");
        let inner = if predecorated.get(position).copied().unwrap_or(false) {
            caps["inner"].to_string()
        } else {
            decorate_label(&heading.label)
        };
        format!(
            r#"<h{level} id="{id}"{attrs}>{inner}</h{level}>"#,
            level = level.as_str(),
            id = escape_html(id),
            attrs = attrs,
            inner = inner,
        )
    });
    Ok(rewritten.into_owned())
}

/// `outer` with everything between its opening and closing tag swapped for
/// `children`.
fn replace_children(outer: &str, tag: &str, children: &str) -> String {
    let open_end = outer.find('>').map_or(0, |i| i + 1);
    let close = format!("</{}>", tag);
    format!("{}{}{}", &outer[..open_end], children, close)
}
