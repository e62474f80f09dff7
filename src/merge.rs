use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::config::{ConstraintSpec, LigandSpec};
use crate::error::{BlockError, Result};

/// How a constraint's `reference` field is rewritten when the constraint
/// comes from the user YAML or the preset. Historically there were two
/// divergent behaviors; the caller has to pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRewrite {
    /// `reference: foo.pdb` becomes `<mount>/foo.pdb`.
    MountRelative,
    /// The reference is replaced with the staged input PDB path.
    LiteralSource,
}

/// Fields computed by the wrapper itself. These take precedence over both
/// the user YAML and the preset, and are emitted in this fixed order.
#[derive(Debug, Default)]
pub struct WorkflowFields {
    pub pdb: Option<String>,
    pub parameter_files: Vec<String>,
    pub n_poses: Option<u32>,
    pub design_residues: Option<BTreeMap<String, String>>,
    pub catalytic_residues: Option<BTreeMap<String, String>>,
    pub ligands: Option<BTreeMap<String, LigandSpec>>,
    pub constraints: Option<BTreeMap<String, ConstraintSpec>>,
    pub n_iterations: Option<u32>,
    pub n_steps: Option<u32>,
    pub time: Option<u32>,
}

pub fn read_yaml(path: &Path) -> Result<Mapping> {
    let file = File::open(path).map_err(|source| BlockError::io(path, source))?;
    serde_yaml::from_reader(file).map_err(|source| BlockError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds the merged tool configuration and writes it to `output_path`.
///
/// Layering, lowest precedence first: preset, user YAML, workflow fields.
pub fn create_yaml(
    output_path: &Path,
    workflow: &WorkflowFields,
    input_yaml_path: Option<&Path>,
    preset: Mapping,
    container_volume_path: &str,
    rewrite: Option<ReferenceRewrite>,
) -> Result<PathBuf> {
    let mut overlay = preset;
    if let Some(path) = input_yaml_path {
        for (key, value) in read_yaml(path)? {
            overlay.insert(key, value);
        }
    }
    let merged = merged_mapping(workflow, overlay, container_volume_path, rewrite)?;
    let file = File::create(output_path).map_err(|source| BlockError::io(output_path, source))?;
    serde_yaml::to_writer(file, &merged)?;
    Ok(output_path.to_path_buf())
}

/// Merge core, separated from file I/O so precedence rules are testable on
/// plain mappings.
pub fn merged_mapping(
    workflow: &WorkflowFields,
    overlay: Mapping,
    container_volume_path: &str,
    rewrite: Option<ReferenceRewrite>,
) -> Result<Mapping> {
    let mut merged = Mapping::new();
    if let Some(pdb) = non_empty_str(&workflow.pdb) {
        merged.insert("PDB".into(), pdb.into());
    }
    if !workflow.parameter_files.is_empty() {
        merged.insert(
            "ParameterFiles".into(),
            serde_yaml::to_value(&workflow.parameter_files)?,
        );
    }
    if let Some(n_poses) = non_zero(workflow.n_poses) {
        merged.insert("nPoses".into(), n_poses.into());
    }
    insert_map(&mut merged, "DesignResidues", &workflow.design_residues)?;
    insert_map(&mut merged, "CatalyticResidues", &workflow.catalytic_residues)?;
    insert_map(&mut merged, "Ligands", &workflow.ligands)?;
    insert_map(&mut merged, "Constraints", &workflow.constraints)?;
    if let Some(n_iterations) = non_zero(workflow.n_iterations) {
        merged.insert("nIterations".into(), n_iterations.into());
    }
    if let Some(n_steps) = non_zero(workflow.n_steps) {
        merged.insert("nSteps".into(), n_steps.into());
    }
    if let Some(time) = non_zero(workflow.time) {
        merged.insert("Time".into(), time.into());
    }

    for (key, mut value) in overlay {
        if merged.contains_key(&key) {
            continue;
        }
        if key.as_str() == Some("Constraints") {
            rewrite_references(&mut value, workflow, container_volume_path, rewrite)?;
        }
        merged.insert(key, value);
    }
    Ok(merged)
}

fn rewrite_references(
    constraints: &mut Value,
    workflow: &WorkflowFields,
    container_volume_path: &str,
    rewrite: Option<ReferenceRewrite>,
) -> Result<()> {
    let Value::Mapping(constraints) = constraints else {
        return Ok(());
    };
    for (_, entry) in constraints.iter_mut() {
        let Value::Mapping(entry) = entry else {
            continue;
        };
        let Some(reference) = entry.get_mut("reference") else {
            continue;
        };
        let rewritten = match rewrite.ok_or(BlockError::RewriteStrategyUnset)? {
            ReferenceRewrite::MountRelative => {
                let name = reference
                    .as_str()
                    .map(|value| basename(value).to_string())
                    .unwrap_or_default();
                format!("{container_volume_path}/{name}")
            }
            ReferenceRewrite::LiteralSource => workflow.pdb.clone().unwrap_or_default(),
        };
        *reference = rewritten.into();
    }
    Ok(())
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn non_empty_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn non_zero(value: Option<u32>) -> Option<u32> {
    value.filter(|value| *value != 0)
}

fn insert_map<T: Serialize>(
    merged: &mut Mapping,
    key: &str,
    value: &Option<BTreeMap<String, T>>,
) -> Result<()> {
    if let Some(map) = value {
        if !map.is_empty() {
            merged.insert(key.into(), serde_yaml::to_value(map)?);
        }
    }
    Ok(())
}
