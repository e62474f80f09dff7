use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BlockError, Result};
use crate::merge::ReferenceRewrite;
use crate::serde_default::*;

/// Properties recognized by the building block, loaded from an optional
/// YAML file. Keys that end up in the tool configuration keep the wrapped
/// tool's spelling (`DesignResidues`, `nPoses`, ...); wrapper-level knobs
/// are snake_case.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Properties {
    /// Worker count passed to mpirun.
    #[serde(default = "default_cpus")]
    pub cpus: u32,
    /// Job name, used by the tool to name its output folders.
    #[serde(default = "default_job_name")]
    pub name: String,
    /// Selects the built-in preset bundle.
    #[serde(default = "default_simulation_type")]
    pub simulation_type: String,
    #[serde(default, rename = "DesignResidues")]
    pub design_residues: Option<BTreeMap<String, String>>,
    #[serde(default, rename = "CatalyticResidues")]
    pub catalytic_residues: Option<BTreeMap<String, String>>,
    #[serde(default, rename = "Ligands")]
    pub ligands: Option<BTreeMap<String, LigandSpec>>,
    #[serde(default, rename = "Constraints")]
    pub constraints: Option<BTreeMap<String, ConstraintSpec>>,
    #[serde(default = "default_iterations", rename = "nIterations")]
    pub n_iterations: u32,
    #[serde(default = "default_steps", rename = "nSteps")]
    pub n_steps: u32,
    #[serde(default = "default_poses", rename = "nPoses")]
    pub n_poses: u32,
    /// Queue time budget in hours, forwarded to the tool, not enforced here.
    #[serde(default = "default_time", rename = "Time")]
    pub time: u32,
    #[serde(default = "default_true")]
    pub remove_tmp: bool,
    /// Skip execution when the output archive already exists.
    #[serde(default)]
    pub restart: bool,
    /// Parent directory for staging and extraction directories.
    #[serde(default = "default_sandbox")]
    pub sandbox_path: PathBuf,
    /// Parallel launcher invoked in front of the tool module.
    #[serde(default = "default_binary_path")]
    pub binary_path: String,
    /// Apply basename disambiguation to files found by directory expansion
    /// when archiving, not only to file-level sources.
    #[serde(default)]
    pub archive_dedup_dir_entries: bool,
    #[serde(default)]
    pub container_path: ContainerRuntime,
    #[serde(default)]
    pub container_image: Option<String>,
    /// Path inside the container where the staging directory is mounted.
    #[serde(default = "default_volume_path")]
    pub container_volume_path: String,
    /// Subcommand used for singularity invocations.
    #[serde(default = "default_generic_command")]
    pub container_generic_command: String,
    /// How constraint `reference` fields coming from the user YAML or the
    /// preset are rewritten. There is no default: a configuration that
    /// carries references must pick one explicitly.
    #[serde(default)]
    pub reference_rewrite: Option<ReferenceRewrite>,
}

impl Default for Properties {
    fn default() -> Self {
        serde_yaml::from_str("{}").expect("empty properties mapping is valid")
    }
}

impl Properties {
    /// Loads properties from a YAML file, or returns the defaults when no
    /// file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let file = File::open(path).map_err(|source| BlockError::io(path, source))?;
                serde_yaml::from_reader(file).map_err(|source| BlockError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    /// Run the tool directly on the host.
    #[default]
    None,
    Docker,
    Singularity,
}

/// Per-ligand sampling parameters. Field names mirror the wrapped tool's
/// configuration schema, including its historical spellings; anything the
/// wrapper does not know about passes through untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LigandSpec {
    #[serde(rename = "RigidBody", skip_serializing_if = "Option::is_none")]
    pub rigid_body: Option<bool>,
    #[serde(rename = "Packing", skip_serializing_if = "Option::is_none")]
    pub packing: Option<bool>,
    #[serde(rename = "PerturbationMode", skip_serializing_if = "Option::is_none")]
    pub perturbation_mode: Option<String>,
    #[serde(rename = "PerturbationLoops", skip_serializing_if = "Option::is_none")]
    pub perturbation_loops: Option<u32>,
    #[serde(
        rename = "nRandomTorsionPurturbation",
        skip_serializing_if = "Option::is_none"
    )]
    pub n_random_torsion_perturbation: Option<u32>,
    #[serde(rename = "Energy", skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    #[serde(rename = "SimulationRadius", skip_serializing_if = "Option::is_none")]
    pub simulation_radius: Option<f64>,
    #[serde(rename = "SideChainCoupling", skip_serializing_if = "Option::is_none")]
    pub side_chain_coupling: Option<f64>,
    #[serde(rename = "TranslationSTD", skip_serializing_if = "Option::is_none")]
    pub translation_std: Option<f64>,
    #[serde(rename = "RotationSTD", skip_serializing_if = "Option::is_none")]
    pub rotation_std: Option<f64>,
    #[serde(rename = "TranslationLoops", skip_serializing_if = "Option::is_none")]
    pub translation_loops: Option<u32>,
    #[serde(rename = "RotationLoops", skip_serializing_if = "Option::is_none")]
    pub rotation_loops: Option<u32>,
    #[serde(rename = "ClashOverlap", skip_serializing_if = "Option::is_none")]
    pub clash_overlap: Option<f64>,
    #[serde(rename = "NeighbourCutoff", skip_serializing_if = "Option::is_none")]
    pub neighbour_cutoff: Option<f64>,
    #[serde(rename = "SasaConstraint", skip_serializing_if = "Option::is_none")]
    pub sasa_constraint: Option<f64>,
    #[serde(rename = "SasaScaling", skip_serializing_if = "Option::is_none")]
    pub sasa_scaling: Option<bool>,
    #[serde(rename = "SasaCutoff", skip_serializing_if = "Option::is_none")]
    pub sasa_cutoff: Option<f64>,
    #[serde(rename = "TranslationScale", skip_serializing_if = "Option::is_none")]
    pub translation_scale: Option<f64>,
    #[serde(rename = "RotationScale", skip_serializing_if = "Option::is_none")]
    pub rotation_scale: Option<f64>,
    #[serde(rename = "PackingLoops", skip_serializing_if = "Option::is_none")]
    pub packing_loops: Option<u32>,
    #[serde(
        rename = "NumberOfGridNeighborhoods",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_grid_neighborhoods: Option<u32>,
    #[serde(rename = "MaxGrid", skip_serializing_if = "Option::is_none")]
    pub max_grid: Option<i64>,
    #[serde(rename = "MinGrid", skip_serializing_if = "Option::is_none")]
    pub min_grid: Option<i64>,
    #[serde(rename = "GridInterval", skip_serializing_if = "Option::is_none")]
    pub grid_interval: Option<i64>,
    #[serde(rename = "ExcludedTorsions", skip_serializing_if = "Option::is_none")]
    pub excluded_torsions: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// One distance or sequence constraint between two residue atoms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atomi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atomj: Option<String>,
    /// Lower distance bound in angstroms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lb: Option<f64>,
    /// Upper distance bound in angstroms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hb: Option<f64>,
    /// Force constant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    /// Reference structure file; rewritten at merge time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let props = Properties::default();
        assert_eq!(props.cpus, 1);
        assert_eq!(props.name, "DesignCatalyticSite_job");
        assert_eq!(props.simulation_type, "CatalyticSite");
        assert_eq!(props.n_iterations, 5);
        assert_eq!(props.n_steps, 2);
        assert_eq!(props.n_poses, 3);
        assert_eq!(props.time, 48);
        assert!(props.remove_tmp);
        assert!(!props.restart);
        assert_eq!(props.container_path, ContainerRuntime::None);
        assert_eq!(props.container_volume_path, "/data");
        assert!(props.reference_rewrite.is_none());
    }

    #[test]
    fn loads_properties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("props.yaml");
        let mut file = File::create(&path).unwrap();
        file.write_all(
            concat!(
                "cpus: 21\n",
                "container_path: docker\n",
                "container_image: bsceapm/asitedesign:1.0\n",
                "reference_rewrite: mount_relative\n",
                "Constraints:\n",
                "  cst0:\n",
                "    type: B\n",
                "    resi: 1-L\n",
                "    atomi: C1\n",
                "    resj: RES1\n",
                "    atomj: OG\n",
                "    lb: 3.0\n",
                "    hb: 4.0\n",
                "    sd: 100.0\n",
            )
            .as_bytes(),
        )
        .unwrap();
        let props = Properties::load(Some(&path)).unwrap();
        assert_eq!(props.cpus, 21);
        assert_eq!(props.container_path, ContainerRuntime::Docker);
        assert_eq!(
            props.reference_rewrite,
            Some(ReferenceRewrite::MountRelative)
        );
        let cst = &props.constraints.unwrap()["cst0"];
        assert_eq!(cst.kind.as_deref(), Some("B"));
        assert_eq!(cst.lb, Some(3.0));
        assert!(cst.reference.is_none());
    }

    #[test]
    fn ligand_spec_passes_unknown_keys_through() {
        let yaml = concat!(
            "RigidBody: true\n",
            "PerturbationMode: MC\n",
            "FutureKnob: 7\n",
        );
        let spec: LigandSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.rigid_body, Some(true));
        assert_eq!(
            spec.extra.get("FutureKnob"),
            Some(&serde_yaml::Value::from(7))
        );
        let back = serde_yaml::to_value(&spec).unwrap();
        assert_eq!(back["FutureKnob"], serde_yaml::Value::from(7));
        assert!(back.get("Packing").is_none());
    }

    #[test]
    fn unknown_property_keys_are_rejected() {
        assert!(serde_yaml::from_str::<Properties>("cpuz: 4\n").is_err());
    }
}
