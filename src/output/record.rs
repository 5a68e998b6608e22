use serde::Serialize;

/// One output record per completed work item
///
/// Serialized without a tag, so the JSON shape is either
/// `{"url", "html"[, "page_content"]}` or `{"url", "error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageRecord {
    Success {
        url: String,
        html: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        page_content: Option<String>,
    },
    Error {
        url: String,
        error: String,
    },
}

impl PageRecord {
    pub fn success(url: impl Into<String>, html: impl Into<String>, page_content: Option<String>) -> Self {
        Self::Success {
            url: url.into(),
            html: html.into(),
            page_content,
        }
    }

    pub fn error(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            url: url.into(),
            error: error.into(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Error { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Serializes the record as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
