use std::fs::File;
use std::path::{Path, PathBuf};

use glob::glob;
use tempfile::TempDir;
use zip::ZipArchive;

use crate::error::{BlockError, Result};

/// The resolved force-field parameter files for one invocation.
///
/// When the source was a zip archive the extraction directory is owned here
/// so the files outlive resolution; it is removed on drop.
#[derive(Debug)]
pub struct ParameterFiles {
    files: Vec<PathBuf>,
    extracted: Option<TempDir>,
}

impl ParameterFiles {
    /// Normalizes a parameter source into a flat file list.
    ///
    /// A directory is walked recursively for `*.params` files, a zip
    /// archive is extracted into a fresh directory under `scratch_parent`,
    /// and a plain file is taken as the sole parameter file. A path that
    /// does not exist is an error rather than an empty list, so callers
    /// cannot run the tool with silently missing parameters.
    pub fn resolve(source: &Path, scratch_parent: &Path) -> Result<Self> {
        if source.is_dir() {
            let pattern = format!("{}/**/*.params", source.display());
            let files = glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
            return Ok(Self {
                files,
                extracted: None,
            });
        }
        if !source.exists() {
            return Err(BlockError::ParamsSourceNotFound(source.to_path_buf()));
        }
        let file = File::open(source).map_err(|err| BlockError::io(source, err))?;
        match ZipArchive::new(file) {
            Ok(mut archive) => {
                let extracted = tempfile::Builder::new()
                    .prefix("params_")
                    .tempdir_in(scratch_parent)
                    .map_err(|err| BlockError::io(scratch_parent, err))?;
                archive.extract(extracted.path())?;
                let files = archive
                    .file_names()
                    .filter(|name| !name.ends_with('/'))
                    .map(|name| extracted.path().join(name))
                    .collect();
                Ok(Self {
                    files,
                    extracted: Some(extracted),
                })
            }
            Err(_) => Ok(Self {
                files: vec![source.to_path_buf()],
                extracted: None,
            }),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Removes the extraction directory, reporting failure as a warning.
    pub fn cleanup(self) {
        if let Some(extracted) = self.extracted {
            let path = extracted.path().to_path_buf();
            if let Err(err) = extracted.close() {
                tracing::warn!(path = %path.display(), %err, "failed to remove extracted parameter files");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_params_dir(dir: &Path) {
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["LIG.params", "CU.params", "nested/FE.params"] {
            std::fs::write(dir.join(name), "NAME LIG\n").unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a params file\n").unwrap();
    }

    #[test]
    fn directory_source_collects_params_files_recursively() {
        let scratch = tempfile::tempdir().unwrap();
        let source = scratch.path().join("params");
        write_params_dir(&source);
        let resolved = ParameterFiles::resolve(&source, scratch.path()).unwrap();
        assert_eq!(resolved.files().len(), 3);
        assert!(resolved
            .files()
            .iter()
            .all(|path| path.extension().unwrap() == "params"));
    }

    #[test]
    fn zip_source_extracts_all_entries() {
        let scratch = tempfile::tempdir().unwrap();
        let zip_path = scratch.path().join("params.zip");
        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        for name in ["LIG.params", "CU.params", "FE.params"] {
            writer
                .start_file(name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"NAME LIG\n").unwrap();
        }
        writer.finish().unwrap();

        let resolved = ParameterFiles::resolve(&zip_path, scratch.path()).unwrap();
        assert_eq!(resolved.files().len(), 3);
        assert!(resolved.files().iter().all(|path| path.exists()));
        resolved.cleanup();
    }

    #[test]
    fn single_file_source_is_the_sole_entry() {
        let scratch = tempfile::tempdir().unwrap();
        let file = scratch.path().join("LIG.params");
        std::fs::write(&file, "NAME LIG\n").unwrap();
        let resolved = ParameterFiles::resolve(&file, scratch.path()).unwrap();
        assert_eq!(resolved.files(), [file]);
    }

    #[test]
    fn missing_source_is_an_explicit_error() {
        let scratch = tempfile::tempdir().unwrap();
        let result = ParameterFiles::resolve(&scratch.path().join("nowhere"), scratch.path());
        assert!(matches!(result, Err(BlockError::ParamsSourceNotFound(_))));
    }

    #[test]
    fn extraction_directory_is_removed_on_cleanup() {
        let scratch = tempfile::tempdir().unwrap();
        let zip_path = scratch.path().join("params.zip");
        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        writer
            .start_file("LIG.params", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"NAME LIG\n").unwrap();
        writer.finish().unwrap();

        let resolved = ParameterFiles::resolve(&zip_path, scratch.path()).unwrap();
        let extracted_file = resolved.files()[0].clone();
        assert!(extracted_file.exists());
        resolved.cleanup();
        assert!(!extracted_file.exists());
    }
}
