//! Types for the format catalog.

use serde::{Deserialize, Serialize};

/// A selectable conversion target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOption {
    /// Canonical format token sent to the backend (e.g. "png").
    pub value: String,
    /// Display name (e.g. "PNG").
    pub label: String,
}

/// Broad grouping of source formats, used to group choices for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Image,
    Document,
    Media,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Media => "media",
        }
    }

    /// Heading used when listing source formats.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Image => "Images",
            Self::Document => "Documents",
            Self::Media => "Video/Audio",
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    /// MIME type identifying the source format.
    pub mime_type: &'static str,
    pub label: &'static str,
    /// File extensions that map to this MIME type, most common first.
    pub extensions: &'static [&'static str],
}

impl InputFormat {
    pub fn category(&self) -> FileCategory {
        super::file_category(self.mime_type)
    }
}
