use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::archive::{zip_list, ArchiveOptions};
use crate::command::{build_command, CommandLine, LOG_FILE};
use crate::config::{ContainerRuntime, Properties};
use crate::launch;
use crate::merge::{create_yaml, WorkflowFields};
use crate::params::ParameterFiles;
use crate::preset::yaml_preset;
use crate::staging::{remove_paths, StagingArea};

/// One invocation of the wrapped active-site design tool.
///
/// The pipeline is strictly linear: resolve parameters, stage inputs,
/// merge the configuration, build and run the command, archive the
/// outputs, clean up. Nothing here is reentrant or concurrent.
pub struct Asitedesign {
    input_pdb: PathBuf,
    input_yaml: PathBuf,
    params_source: PathBuf,
    output_path: PathBuf,
    properties: Properties,
}

/// Everything assembled before process launch, exposed separately so the
/// staging and merge results can be inspected without running the tool.
pub struct Prepared {
    pub staging: StagingArea,
    pub params: ParameterFiles,
    pub config_path: PathBuf,
    pub command: CommandLine,
}

impl Asitedesign {
    pub fn new(
        input_pdb: impl Into<PathBuf>,
        input_yaml: impl Into<PathBuf>,
        params_source: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        properties: Properties,
    ) -> Self {
        Self {
            input_pdb: input_pdb.into(),
            input_yaml: input_yaml.into(),
            params_source: params_source.into(),
            output_path: output_path.into(),
            properties,
        }
    }

    /// Resolves, stages and merges everything needed to run the tool.
    pub fn prepare(&self) -> crate::error::Result<Prepared> {
        let properties = &self.properties;
        let params = ParameterFiles::resolve(&self.params_source, &properties.sandbox_path)?;
        info!(
            count = params.files().len(),
            source = %self.params_source.display(),
            "resolved parameter files"
        );

        let staging = StagingArea::create(&properties.sandbox_path)?;
        let staged_pdb = staging.stage_file(&self.input_pdb)?;
        for file in params.files() {
            staging.stage_file(file)?;
        }
        info!(dir = %staging.path().display(), "staged input files");

        let mount = &properties.container_volume_path;
        let containerized = properties.container_path != ContainerRuntime::None;
        let tool_path = |staged: &Path| {
            if containerized {
                StagingArea::container_path(mount, staged)
            } else {
                staged.display().to_string()
            }
        };

        let workflow = WorkflowFields {
            pdb: Some(tool_path(&staged_pdb)),
            parameter_files: params.files().iter().map(|file| tool_path(file)).collect(),
            n_poses: Some(properties.n_poses),
            design_residues: properties.design_residues.clone(),
            catalytic_residues: properties.catalytic_residues.clone(),
            ligands: properties.ligands.clone(),
            constraints: properties.constraints.clone(),
            n_iterations: Some(properties.n_iterations),
            n_steps: Some(properties.n_steps),
            time: Some(properties.time),
        };

        let config_path = create_yaml(
            &staging.path().join("input.yaml"),
            &workflow,
            Some(&self.input_yaml),
            yaml_preset(&properties.simulation_type)?,
            mount,
            properties.reference_rewrite,
        )?;
        let command = build_command(properties, staging.path(), &tool_path(&config_path))?;
        Ok(Prepared {
            staging,
            params,
            config_path,
            command,
        })
    }

    /// Runs the whole pipeline and returns the tool's exit code.
    pub fn launch(&self) -> Result<i32> {
        if self.properties.restart && self.output_path.exists() {
            info!(
                output = %self.output_path.display(),
                "output already exists, restart guard skips execution"
            );
            return Ok(0);
        }

        let prepared = self.prepare()?;
        info!(command = %prepared.command.rendered(), "launching external design tool");
        let status = launch::run(&prepared.command, prepared.staging.path())?;
        if !status.success() {
            warn!(%status, "external tool exited with failure, archiving what was produced");
        }

        // the tool ran inside the staging directory, so its named output
        // folders and run log are picked up by the directory listing; the
        // bare names cover tools that write next to the wrapper instead,
        // and are skipped by the archiver when absent
        let mut to_zip = prepared.staging.entries()?;
        to_zip.push(self.final_pose_dir());
        to_zip.push(self.output_dir());
        to_zip.push(PathBuf::from(LOG_FILE));
        zip_list(
            &self.output_path,
            &to_zip,
            ArchiveOptions {
                dedup_dir_entries: self.properties.archive_dedup_dir_entries,
            },
        )
        .context("failed to write output archive")?;

        if self.properties.remove_tmp {
            let mut tmp = vec![
                prepared.staging.path().to_path_buf(),
                self.final_pose_dir(),
                self.output_dir(),
                PathBuf::from(LOG_FILE),
            ];
            tmp.extend(prepared.params.files().iter().cloned());
            remove_paths(&tmp);
            prepared.params.cleanup();
        }

        // signal-terminated children carry no code, report generic failure
        Ok(status.code().unwrap_or(1))
    }

    fn final_pose_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}_final_pose", self.properties.name))
    }

    fn output_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}_output", self.properties.name))
    }
}
