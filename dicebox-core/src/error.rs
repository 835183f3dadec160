/// Error types for model import
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder path used when a model comes from memory instead of a file
pub const MEMORY_SOURCE: &str = "<memory>";

/// Which attribute array a corner index points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    Normal,
    TexCoord,
    Material,
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttributeKind::Position => "position",
            AttributeKind::Normal => "normal",
            AttributeKind::TexCoord => "texture coordinate",
            AttributeKind::Material => "material",
        };
        f.write_str(name)
    }
}

/// A model import failed. The previously loaded model is never touched.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read model {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported model format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to parse model {} at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to parse STL {}: {message}", path.display())]
    Stl { path: PathBuf, message: String },

    #[error("Model {} references {kind} {index} but only {len} exist", path.display())]
    IndexOutOfRange {
        path: PathBuf,
        kind: AttributeKind,
        index: usize,
        len: usize,
    },

    #[error("Model {} has {corners} triangle corners, not a multiple of 3", path.display())]
    IncompleteTriangle { path: PathBuf, corners: usize },
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
