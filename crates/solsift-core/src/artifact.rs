use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Html,
    Markdown,
    Pdf,
    Github,
    GoogleDoc,
    Restricted,
    Local,
    Error,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Pdf => "pdf",
            Self::Github => "github",
            Self::GoogleDoc => "google_doc",
            Self::Restricted => "restricted",
            Self::Local => "local",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Self::Html),
            "markdown" => Ok(Self::Markdown),
            "pdf" => Ok(Self::Pdf),
            "github" => Ok(Self::Github),
            "google_doc" => Ok(Self::GoogleDoc),
            "restricted" => Ok(Self::Restricted),
            "local" => Ok(Self::Local),
            "error" => Ok(Self::Error),
            _ => Err(crate::Error::UnrecognizedFormat(s.to_string())),
        }
    }
}

/// One extracted code excerpt with an optional language tag.
///
/// Identity for deduplication is the hash of `code` alone; the language
/// tag does not participate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFragment {
    pub language: Option<String>,
    pub code: String,
}

impl CodeFragment {
    #[must_use]
    pub fn new(language: Option<String>, code: impl Into<String>) -> Self {
        Self {
            language,
            code: code.into(),
        }
    }

    #[must_use]
    pub fn tagged(language: &str, code: impl Into<String>) -> Self {
        Self {
            language: Some(language.to_string()),
            code: code.into(),
        }
    }
}

/// Normalized record of one ingested URL or path. Immutable after
/// assembly; one artifact is produced per input, even on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub url: String,
    pub kind: ContentKind,
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub raw_text: Option<String>,
    #[serde(default)]
    pub extracted_code: Vec<CodeFragment>,
    #[serde(default)]
    pub downloaded_files: Vec<String>,
    pub error: Option<String>,
}

impl Artifact {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            url: url.into(),
            kind,
            title: None,
            metadata: Map::new(),
            raw_text: None,
            extracted_code: Vec::new(),
            downloaded_files: Vec::new(),
            error: None,
        }
    }

    /// Failed ingestion of an input no strategy could make sense of.
    #[must_use]
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(url, ContentKind::Error).with_error(error)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, fragments: Vec<CodeFragment>) -> Self {
        self.extracted_code = fragments;
        self
    }

    #[must_use]
    pub fn with_downloads(mut self, paths: Vec<String>) -> Self {
        self.downloaded_files = paths;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Shorthand for single-entry metadata maps, e.g. `{"source": "local"}`.
pub(crate) fn metadata_entry(key: &str, value: impl Into<Value>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.into());
    map
}
