//! All error types for the propkit crate.
//!
//! These are returned from all fallible operations (resolution, loading, coercion, etc.).

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TypeTag;

#[derive(Error, Debug)]
pub enum Error {
    #[error("resource file {} not found", path.display())]
    ResourceNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid integer for `{key}`: {value:?}")]
    InvalidInt {
        key: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("invalid float for `{key}`: {value:?}")]
    InvalidFloat {
        key: String,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("invalid resource descriptor `{0}`")]
    InvalidDescriptor(String),

    #[error("unknown language `{0}`")]
    UnknownLanguage(String),

    #[error("unknown resource type `{0}`")]
    UnknownResourceType(String),

    #[error("no path template for i18n key `{0}`")]
    MissingTemplate(String),

    #[error("type mismatch for `{key}`: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: TypeTag,
        found: TypeTag,
    },

    #[error("no factory declared for view `{0}`")]
    NoViewFactory(String),

    #[error("unknown view `{0}`")]
    UnknownView(String),

    #[error("view `{0}` was requested while its factory was running")]
    ViewReentered(String),
}

impl Error {
    /// Creates a new resource-not-found error for the given path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::ResourceNotFound { path: path.into() }
    }
}
