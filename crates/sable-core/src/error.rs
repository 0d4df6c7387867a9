use std::path::PathBuf;

use thiserror::Error;

use crate::ids::ClassType;
use crate::project::Language;

/// A located class source could not be materialized.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("io error reading {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed class data in {origin}: {message}")]
    Malformed { origin: String, message: String },

    #[error("{origin} declares `{found}` but was located as `{expected}`")]
    TypeMismatch {
        origin: String,
        expected: String,
        found: String,
    },

    #[error("frontend error in {origin}: {source}")]
    Frontend {
        origin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Location(#[from] LocationError),
}

/// Failure to read from an input location's backing store.
///
/// "Not present" is never an error; it is reported as `Ok(None)` by lookups.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive error in {path}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("{path} is not a module filesystem (expected `modules/` or `jmods/`)")]
    NotAModuleFs { path: PathBuf },

    #[error("no JDK installation found for the system module filesystem")]
    NoSystemModules,
}

impl LocationError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LocationError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("class `{class_type}` is already cached with a different definition")]
    DuplicateInsertion { class_type: ClassType },
}

/// Invalid project configuration, raised by [`crate::ProjectBuilder::build`].
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(
        "module input location `{location}` requires a language version of at least {required}, \
         but the project targets {language}"
    )]
    ModulesUnsupported {
        location: String,
        language: Language,
        required: u16,
    },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to build `{class_type}`: {source}")]
    Build {
        class_type: ClassType,
        #[source]
        source: BuildError,
    },

    #[error("lookup of `{class_type}` in {location} failed: {source}")]
    Lookup {
        class_type: ClassType,
        location: String,
        #[source]
        source: LocationError,
    },

    #[error("scanning {location} failed: {source}")]
    Scan {
        location: String,
        #[source]
        source: LocationError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("`{class_type}` cannot be resolved in this view")]
    UnknownType { class_type: ClassType },

    #[error("inheritance cycle through `{class_type}`")]
    Cycle { class_type: ClassType },
}
