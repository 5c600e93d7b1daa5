use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Marker for wiki hosts that sit behind a login wall and are not worth
/// scraping; matched against the URL host.
pub const RESTRICTED_HOST_MARKER: &str = "slite.com";

static GITHUB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?github\.com/([^/]+)/([^/]+)(?:/tree/([^/]+)(?:/(.*))?)?")
        .expect("github url pattern")
});

static GOOGLE_DOC_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://docs\.google\.com/document/d/([A-Za-z0-9_-]+)")
        .expect("google doc url pattern")
});

/// File format of a local input, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFormat {
    Markdown,
    Html,
    Pdf,
    PlainText,
}

impl LocalFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext.as_deref() {
            Some("md" | "markdown") => Self::Markdown,
            Some("html" | "htm") => Self::Html,
            Some("pdf") => Self::Pdf,
            _ => Self::PlainText,
        }
    }
}

/// Parsed coordinates of a GitHub repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubLocator {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    pub subpath: Option<String>,
}

impl GitHubLocator {
    /// Parse `https://github.com/{owner}/{repo}` with an optional
    /// `/tree/{branch}/{subpath}` tail. The `.git` suffix is stripped.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let caps = GITHUB_URL.captures(url)?;
        let owner = caps[1].to_string();
        let repo = caps[2].trim_end_matches(".git").to_string();
        let branch = caps.get(3).map(|m| m.as_str().to_string());
        let subpath = caps
            .get(4)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty());
        Some(Self {
            owner,
            repo,
            branch,
            subpath,
        })
    }
}

/// Which retrieval strategy applies to an input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Local { path: PathBuf, format: LocalFormat },
    GitHub(GitHubLocator),
    GoogleDoc { doc_id: String },
    Restricted,
    PdfUrl,
    Web,
}

/// Classify a URL or filesystem path. Total: every input maps to exactly
/// one branch, first match wins. The html-vs-markdown decision for the
/// generic `Web` branch is deferred to the retrieval strategy, which has
/// the response's content type.
#[must_use]
pub fn classify(input: &str) -> Classification {
    if let Some(path) = maybe_local_path(input) {
        let format = LocalFormat::from_path(&path);
        return Classification::Local { path, format };
    }
    if let Some(locator) = GitHubLocator::parse(input) {
        return Classification::GitHub(locator);
    }
    if let Some(doc_id) = google_doc_id(input) {
        return Classification::GoogleDoc { doc_id };
    }
    if is_restricted_host(input) {
        return Classification::Restricted;
    }
    if input.to_lowercase().ends_with(".pdf") {
        return Classification::PdfUrl;
    }
    Classification::Web
}

/// Extract the document id from a Google Docs URL.
#[must_use]
pub fn google_doc_id(url: &str) -> Option<String> {
    GOOGLE_DOC_URL
        .captures(url)
        .map(|caps| caps[1].to_string())
}

fn maybe_local_path(input: &str) -> Option<PathBuf> {
    let candidate = input.strip_prefix("file://").unwrap_or(input);
    let path = PathBuf::from(candidate);
    path.exists().then_some(path)
}

fn is_restricted_host(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) => url
            .host_str()
            .is_some_and(|host| host.contains(RESTRICTED_HOST_MARKER)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_github_with_branch_and_subpath() {
        let classification = classify("https://github.com/acme/widgets/tree/dev/contracts");
        let Classification::GitHub(locator) = classification else {
            panic!("expected github classification");
        };
        assert_eq!(locator.owner, "acme");
        assert_eq!(locator.repo, "widgets");
        assert_eq!(locator.branch.as_deref(), Some("dev"));
        assert_eq!(locator.subpath.as_deref(), Some("contracts"));
    }

    #[test]
    fn test_github_bare_repo() {
        let locator = GitHubLocator::parse("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(locator.repo, "widgets");
        assert_eq!(locator.branch, None);
        assert_eq!(locator.subpath, None);
    }

    #[test]
    fn test_google_doc() {
        let classification =
            classify("https://docs.google.com/document/d/1AbC_d-9/edit?usp=sharing");
        assert_eq!(
            classification,
            Classification::GoogleDoc {
                doc_id: "1AbC_d-9".into()
            }
        );
    }

    #[test]
    fn test_restricted_host() {
        assert_eq!(
            classify("https://myteam.slite.com/api/s/note/abc"),
            Classification::Restricted
        );
        // The marker must appear in the host, not just anywhere in the URL.
        assert_eq!(
            classify("https://example.com/about-slite.com"),
            Classification::Web
        );
    }

    #[test]
    fn test_pdf_suffix_case_insensitive() {
        assert_eq!(classify("https://example.com/audit.PDF"), Classification::PdfUrl);
        assert_eq!(classify("https://example.com/audit.pdf"), Classification::PdfUrl);
    }

    #[test]
    fn test_generic_falls_through_to_web() {
        assert_eq!(classify("https://example.com/docs"), Classification::Web);
        assert_eq!(classify("not a url at all"), Classification::Web);
    }

    #[test]
    fn test_local_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("notes.md");
        fs::write(&md, "# notes").unwrap();

        let Classification::Local { path, format } = classify(md.to_str().unwrap()) else {
            panic!("expected local classification");
        };
        assert_eq!(path, md);
        assert_eq!(format, LocalFormat::Markdown);
    }

    #[test]
    fn test_local_file_uri_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, "plain").unwrap();

        let input = format!("file://{}", txt.display());
        let Classification::Local { format, .. } = classify(&input) else {
            panic!("expected local classification");
        };
        assert_eq!(format, LocalFormat::PlainText);
    }

    #[test]
    fn test_missing_local_path_is_not_local() {
        assert_eq!(
            classify("/definitely/not/a/real/path.md"),
            Classification::Web
        );
    }
}
