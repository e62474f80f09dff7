use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use glob::glob;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{BlockError, Result};

#[derive(Debug, Clone, Copy)]
pub struct ArchiveOptions {
    /// Whether files found by directory expansion participate in the same
    /// basename disambiguation applied to file-level sources. Off by
    /// default: expanded entries keep their source-relative path, which is
    /// already unique within one source directory.
    pub dedup_dir_entries: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            dedup_dir_entries: false,
        }
    }
}

/// Writes the output archive for one invocation.
///
/// Sources are sorted for deterministic member ordering. A source that
/// does not exist is skipped, not an error: the tool may have exited
/// before producing some named outputs and the archive must still be
/// written. A plain file is stored at its basename; when that basename
/// was already inserted the member is renamed `file_<index>_<basename>`
/// so nothing is silently overwritten. A directory is expanded
/// recursively, each contained file stored at its path relative to the
/// directory's parent.
///
/// There is no atomicity beyond the zip writer itself: a crash mid-write
/// leaves a truncated archive.
pub fn zip_list(zip_path: &Path, sources: &[PathBuf], options: ArchiveOptions) -> Result<()> {
    let mut sources = sources.to_vec();
    sources.sort();
    let file = File::create(zip_path).map_err(|err| BlockError::io(zip_path, err))?;
    let mut writer = ZipWriter::new(file);
    let entry_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut inserted: Vec<String> = Vec::new();

    for (index, source) in sources.iter().enumerate() {
        if !source.exists() {
            tracing::debug!(path = %source.display(), "skipping absent archive source");
            continue;
        }
        if source.is_dir() {
            let parent = source.parent().unwrap_or_else(|| Path::new(""));
            for contained in walk_files(source)? {
                let relative = contained
                    .strip_prefix(parent)
                    .unwrap_or(&contained)
                    .to_path_buf();
                let base_name = file_name(&contained);
                let member = if options.dedup_dir_entries && inserted.contains(&base_name) {
                    disambiguated(&relative, index)
                } else {
                    member_name(&relative)
                };
                inserted.push(base_name);
                add_file(&mut writer, &contained, &member, entry_options)?;
            }
        } else {
            let mut member = file_name(source);
            if inserted.contains(&member) {
                member = format!("file_{index}_{member}");
            }
            inserted.push(member.clone());
            add_file(&mut writer, source, &member, entry_options)?;
        }
    }
    writer.finish()?;
    tracing::info!(archive = %zip_path.display(), members = inserted.len(), "output archive written");
    Ok(())
}

fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*", dir.display());
    let mut files = Vec::new();
    for path in glob(&pattern)? {
        let path = path?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn add_file(
    writer: &mut ZipWriter<File>,
    source: &Path,
    member: &str,
    entry_options: SimpleFileOptions,
) -> Result<()> {
    writer.start_file(member, entry_options)?;
    let mut reader = File::open(source).map_err(|err| BlockError::io(source, err))?;
    io::copy(&mut reader, writer).map_err(|err| BlockError::io(source, err))?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn member_name(relative: &Path) -> String {
    relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn disambiguated(relative: &Path, index: usize) -> String {
    let renamed = relative.with_file_name(format!("file_{index}_{}", file_name(relative)));
    member_name(&renamed)
}
