use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the wrapper before, during or after invoking the
/// external design tool. Cleanup problems are deliberately absent here:
/// by the time cleanup runs the primary outputs are already archived, so
/// removal failures are logged as warnings instead of raised.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("simulation type must not be empty")]
    EmptySimulationType,

    #[error("unknown simulation type {0:?}, expected one of: CatalyticSite, DirectEvolution")]
    UnknownSimulationType(String),

    #[error("parameter source {0:?} does not exist")]
    ParamsSourceNotFound(PathBuf),

    #[error("failed to parse YAML file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error(
        "a constraint carries a reference but no rewrite strategy was chosen; \
         set reference_rewrite to mount_relative or literal_source"
    )]
    RewriteStrategyUnset,

    #[error("container runtime {0:?} requires a container_image")]
    MissingContainerImage(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read matched path: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl BlockError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BlockError> = std::result::Result<T, E>;
