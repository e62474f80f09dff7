use std::collections::BTreeMap;

use lazy_static::lazy_static;
use serde_yaml::Mapping;

use crate::error::{BlockError, Result};

// Default bundles shipped with the wrapped tool. Key spellings follow the
// tool's own configuration schema and must not be "fixed" here.
const CATALYTIC_SITE: &str = r#"
ActiveSiteSampling: Coupled
LigandSampling: Coupled
DynamicSideChainCoupling: false
SoftRepulsion: false
MimimizeBackbone: true
nNoneCatalytic: 1
Ligands:
  1-L:
    RigidBody: true
    Packing: true
    PerturbationMode: MC
    PerturbationLoops: 1
    nRandomTorsionPurturbation: 2
    Energy: Reduced
    SimulationRadius: 5.0
    SideChainCoupling: 0.005
    TranslationSTD: 0.5
    RotationSTD: 2.0
    TranslationLoops: 20
    RotationLoops: 50
    ClashOverlap: 0.6
    NeighbourCutoff: 15.0
    SasaConstraint: 10
    SasaScaling: true
    SasaCutoff: 0.6
    TranslationScale: -1
    RotationScale: -1
    PackingLoops: 1
    NumberOfGridNeighborhoods: 2
    MaxGrid: 4
    MinGrid: 4
    GridInterval: -4
    ExcludedTorsions: [C11, C14, C16, C17]
Anneal: true
kT_high: 500
kT_low: 1
kT_decay: true
kT_highScale: true
WriteALL: true
RankingMetric: FullAtom
SpawningMethod: Adaptive
SpawningMetric: Split
SpawningMetricSteps:
  - 0.8 FullAtomWithConstraints
  - 1.0 FullAtom
Time: 48
"#;

const DIRECT_EVOLUTION: &str = r#"
ActiveSiteSampling: Coupled
LigandSampling: Coupled
DynamicSideChainCoupling: false
SoftRepulsion: false
MimimizeBackbone: true
Anneal: true
kT_high: 500
kT_low: 1
kT_decay: true
kT_highScale: true
WriteALL: true
RankingMetric: FullAtom
SpawningMethod: Adaptive
SpawningMetric: Split
SpawningMetricSteps:
  - 0.8 FullAtomWithConstraints
  - 1.0 FullAtom
Time: 48
"#;

lazy_static! {
    static ref PRESETS: BTreeMap<&'static str, Mapping> = {
        let mut presets = BTreeMap::new();
        presets.insert(
            "CatalyticSite",
            serde_yaml::from_str(CATALYTIC_SITE).expect("built-in CatalyticSite preset is valid"),
        );
        presets.insert(
            "DirectEvolution",
            serde_yaml::from_str(DIRECT_EVOLUTION)
                .expect("built-in DirectEvolution preset is valid"),
        );
        presets
    };
}

/// Returns the default configuration bundle for a simulation type.
///
/// Empty and unrecognized names are hard errors: proceeding with an empty
/// preset would hand the tool a silently degraded configuration.
pub fn yaml_preset(simulation_type: &str) -> Result<Mapping> {
    if simulation_type.is_empty() {
        return Err(BlockError::EmptySimulationType);
    }
    PRESETS
        .get(simulation_type)
        .cloned()
        .ok_or_else(|| BlockError::UnknownSimulationType(simulation_type.to_string()))
}

/// The simulation types `yaml_preset` accepts.
pub fn known_simulation_types() -> impl Iterator<Item = &'static str> {
    PRESETS.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    #[test]
    fn every_known_preset_is_non_empty() {
        for simulation_type in known_simulation_types() {
            let preset = yaml_preset(simulation_type).unwrap();
            assert!(!preset.is_empty(), "{simulation_type} preset is empty");
            assert_eq!(preset.get("Time"), Some(&Value::from(48)));
        }
    }

    #[test]
    fn catalytic_site_carries_ligand_defaults() {
        let preset = yaml_preset("CatalyticSite").unwrap();
        let ligand = &preset["Ligands"]["1-L"];
        assert_eq!(ligand["PerturbationMode"], Value::from("MC"));
        assert_eq!(ligand["RotationLoops"], Value::from(50));
        assert!(yaml_preset("DirectEvolution")
            .unwrap()
            .get("Ligands")
            .is_none());
    }

    #[test]
    fn empty_simulation_type_is_rejected() {
        assert!(matches!(
            yaml_preset(""),
            Err(BlockError::EmptySimulationType)
        ));
    }

    #[test]
    fn unrecognized_simulation_type_is_rejected() {
        assert!(matches!(
            yaml_preset("FoldFromScratch"),
            Err(BlockError::UnknownSimulationType(name)) if name == "FoldFromScratch"
        ));
    }
}
