use std::path::{Path, PathBuf};

use crate::error::{BlockError, Result};

/// Invocation-scoped working directory holding copies of every input the
/// external tool needs. The directory survives the `StagingArea` value;
/// removal happens through `remove_paths` during cleanup so the caller
/// decides whether temporaries are kept.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Creates a uniquely-named staging directory under `parent`.
    pub fn create(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent).map_err(|err| BlockError::io(parent, err))?;
        let dir = tempfile::Builder::new()
            .prefix("asitedesign_")
            .tempdir_in(parent)
            .map_err(|err| BlockError::io(parent, err))?
            .keep();
        // the tool runs with this directory as its cwd, so staged paths
        // handed to it must not depend on the wrapper's own cwd
        let dir = dir
            .canonicalize()
            .map_err(|err| BlockError::io(&dir, err))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Copies a required input file into the staging directory. Failure is
    /// fatal: the tool must never start with an incomplete staging area.
    pub fn stage_file(&self, source: &Path) -> Result<PathBuf> {
        let name = source
            .file_name()
            .ok_or_else(|| BlockError::io(source, std::io::Error::other("path has no file name")))?;
        let target = self.dir.join(name);
        std::fs::copy(source, &target).map_err(|err| BlockError::io(source, err))?;
        Ok(target)
    }

    /// The path a staged file is visible at inside the container.
    pub fn container_path(mount: &str, source: &Path) -> String {
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{mount}/{name}")
    }

    /// Lists the staged entries (files and directories) for archiving.
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|err| BlockError::io(&self.dir, err))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| BlockError::io(&self.dir, err))?;
            paths.push(entry.path());
        }
        Ok(paths)
    }
}

/// Best-effort removal of temporary artifacts. By this point the output
/// archive is already written, so failures are reported as warnings and
/// never propagated. Returns the number of paths actually removed.
pub fn remove_paths<I>(paths: I) -> usize
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    let mut removed = 0;
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            continue;
        }
        let result = if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        match result {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed temporary path");
                removed += 1;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to remove temporary path");
            }
        }
    }
    removed
}
