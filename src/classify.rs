// File classification by extension

use std::path::Path;
use crate::constants::{IMAGE_EXTENSIONS, RAW_EXTENSIONS};

/// What a source file is, judged by its extension alone.
/// No content sniffing: a mislabeled file imports as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Image,
    Raw,
    Other,
}

impl FileKind {
    /// Classify a bare extension, case-insensitively.
    pub fn from_extension(ext: &str) -> FileKind {
        let ext = ext.to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Image
        } else if RAW_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Raw
        } else {
            FileKind::Other
        }
    }

    /// Classify a path by its extension. Extensionless files are `Other`.
    pub fn from_path(path: &Path) -> FileKind {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => FileKind::from_extension(ext),
            None => FileKind::Other,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FileKind::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Raw => "raw",
            FileKind::Other => "other",
        }
    }
}
