use std::path::PathBuf;

/// Everything that can abort a lineage rendering run.
#[derive(thiserror::Error, Debug)]
pub enum LineageError {
    /// A cell name has no parent under the lineage naming rules.
    #[error("cannot resolve the parent of cell '{name}'")]
    LineageResolution { name: String },

    /// Palette levels or windows are inconsistent.
    #[error("invalid color levels: {message}")]
    PaletteConfig { message: String },

    /// An internal node has exactly one child.
    #[error("the data of cell '{node}' is not valid: it has only one child")]
    LayoutValidation { node: String },

    #[error("root '{root}' is not part of the lineage tree")]
    UnknownRoot { root: String },

    /// Malformed input table.
    #[error("{path}:{line}: {message}")]
    Records {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl LineageError {
    pub fn palette(message: impl Into<String>) -> Self {
        Self::PaletteConfig {
            message: message.into(),
        }
    }

    pub fn records(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Records {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LineageError>;
