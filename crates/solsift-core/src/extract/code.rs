use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

use super::normalize::visible_text;
use crate::artifact::CodeFragment;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+-]*)\n(.*?)```").expect("fence pattern")
});

static LANGUAGE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^language-([A-Za-z0-9_+-]+)$").expect("language class pattern"));

/// Extract code fragments from plain or Markdown-like text.
///
/// Two passes: fenced triple-backtick regions with an optional language
/// tag, then a paragraph heuristic that captures any blank-line-delimited
/// chunk containing `pragma solidity` even when it was never fenced.
#[must_use]
pub fn extract_from_text(text: &str) -> Vec<CodeFragment> {
    let mut fragments = Vec::new();

    for caps in FENCED_BLOCK.captures_iter(text) {
        let language = Some(caps[1].to_string()).filter(|tag| !tag.is_empty());
        let code = caps[2].trim();
        if !code.is_empty() {
            fragments.push(CodeFragment::new(language, code));
        }
    }

    for paragraph in text.split("\n\n") {
        // Fenced regions are already covered by the pass above.
        if paragraph.contains("pragma solidity") && !paragraph.contains("```") {
            fragments.push(CodeFragment::tagged("solidity", paragraph.trim()));
        }
    }

    dedupe(fragments)
}

/// Extract code fragments from an HTML document.
///
/// The markup pass captures every `<pre>`/`<code>` element (language from
/// a `language-<tag>` class), then the text passes run over the visible
/// text of the same document; the union is deduplicated.
#[must_use]
pub fn extract_from_html(html: &str) -> Vec<CodeFragment> {
    let Ok(selector) = Selector::parse("pre, code") else {
        return extract_from_text(html);
    };

    let doc = Html::parse_document(html);
    let mut fragments = Vec::new();

    for el in doc.select(&selector) {
        let code = el.text().collect::<Vec<_>>().join("\n");
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        let language = el.value().classes().find_map(|class| {
            LANGUAGE_CLASS
                .captures(class)
                .map(|caps| caps[1].to_string())
        });
        fragments.push(CodeFragment::new(language, code));
    }

    fragments.extend(extract_from_text(&visible_text(html)));
    dedupe(fragments)
}

/// Drop exact-duplicate fragments, keyed by the hash of the code body
/// alone; the first occurrence wins and relative order is preserved.
#[must_use]
pub fn dedupe(fragments: Vec<CodeFragment>) -> Vec<CodeFragment> {
    let mut seen = HashSet::new();
    fragments
        .into_iter()
        .filter(|fragment| seen.insert(content_hash(&fragment.code)))
        .collect()
}

fn content_hash(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}
