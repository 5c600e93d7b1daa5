use std::io::Cursor;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static TAG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

const BOILERPLATE_MARKERS: &[&str] = &[
    "nav", "navbar", "menu", "sidebar", "footer", "header", "banner", "cookie", "consent", "ads",
    "advert", "promo", "subscribe", "newsletter",
];

/// Turns raw HTML into a plain-text body plus an optional title.
///
/// Three tiers, tried in order: main-content extraction, full-document
/// conversion, regex tag stripping. A lower tier activates only when the
/// tier above is unavailable or fails, never based on content quality.
/// The capability switches model optional providers resolved at startup.
pub struct HtmlNormalizer {
    readability: bool,
    structured: bool,
}

impl HtmlNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            readability: true,
            structured: true,
        }
    }

    /// Skip main-content extraction and go straight to the full document.
    #[must_use]
    pub fn without_readability() -> Self {
        Self {
            readability: false,
            structured: true,
        }
    }

    /// No structured parsing at all; only the tag-stripping tier.
    #[must_use]
    pub fn tag_strip_only() -> Self {
        Self {
            readability: false,
            structured: false,
        }
    }

    #[must_use]
    pub fn normalize(&self, html: &str) -> (String, Option<String>) {
        if !self.structured {
            return (strip_tags(html), None);
        }
        if self.readability {
            if let Some((text, title)) = main_content(html) {
                return (text, title);
            }
        }
        full_document(html)
    }
}

impl Default for HtmlNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Main-content tier: score candidate containers by non-link text density
/// and pick the best region. `None` means the tier failed and the full
/// document tier should run.
fn main_content(html: &str) -> Option<(String, Option<String>)> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("article, main, section, div").ok()?;

    let mut best_score: i64 = 0;
    let mut best_text: Option<String> = None;

    for el in doc.select(&selector) {
        if is_boilerplate_container(&el) {
            continue;
        }
        let text_chars = element_text_chars(&el);
        if text_chars < 20 {
            continue;
        }
        let link_chars = element_link_text_chars(&el);
        let mut score = text_chars as i64 - 2 * link_chars as i64;
        match el.value().name() {
            "article" => score += 500,
            "main" => score += 300,
            _ => {}
        }
        if link_chars > text_chars / 2 {
            score -= 500;
        }
        if score > best_score {
            best_score = score;
            best_text = Some(element_text(&el));
        }
    }

    best_text.map(|text| (text, short_title(&doc)))
}

/// Full-document tier: title from `<title>`, body through html2text.
/// A conversion failure drops to the tag-stripping tier.
fn full_document(html: &str) -> (String, Option<String>) {
    let doc = Html::parse_document(html);
    let title = document_title(&doc);
    match html2text::from_read(Cursor::new(html.as_bytes()), 80) {
        Ok(text) => (text, title),
        Err(_) => (strip_tags(html), None),
    }
}

/// Tag-stripping tier: every tag becomes a line break, no title.
fn strip_tags(html: &str) -> String {
    TAG_STRIP.replace_all(html, "\n").into_owned()
}

/// Visible text of the whole document with line breaks at node
/// boundaries; input for the text-based code extraction passes.
#[must_use]
pub fn visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    element_text(&doc.root_element())
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join("\n").trim().to_string()
}

fn element_text_chars(el: &ElementRef) -> usize {
    el.text().map(|t| t.chars().count()).sum()
}

fn element_link_text_chars(el: &ElementRef) -> usize {
    let Ok(selector) = Selector::parse("a") else {
        return 0;
    };
    el.select(&selector)
        .map(|a| a.text().map(|t| t.chars().count()).sum::<usize>())
        .sum()
}

fn is_boilerplate_container(el: &ElementRef) -> bool {
    let mut marker_text = el.value().classes().collect::<Vec<_>>().join(" ");
    if let Some(id) = el.value().attr("id") {
        marker_text.push(' ');
        marker_text.push_str(id);
    }
    let marker_text = marker_text.to_ascii_lowercase();
    BOILERPLATE_MARKERS
        .iter()
        .any(|marker| marker_text.contains(marker))
}

fn document_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let el = doc.select(&selector).next()?;
    let title = element_text(&el);
    (!title.is_empty()).then_some(title)
}

/// Short title in the readability style: the leading segment of `<title>`
/// before a site-name separator.
fn short_title(doc: &Html) -> Option<String> {
    let full = document_title(doc)?;
    for separator in [" | ", " - ", " :: "] {
        if let Some((head, _)) = full.split_once(separator) {
            let head = head.trim();
            if !head.is_empty() {
                return Some(head.to_string());
            }
        }
    }
    Some(full)
}
