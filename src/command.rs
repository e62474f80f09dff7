use std::path::Path;

use crate::config::{ContainerRuntime, Properties};
use crate::error::{BlockError, Result};

/// Module invocation understood by the wrapped software's image.
pub const TOOL_MODULE: &str = "ActiveSiteDesign";
/// The child's stdout is redirected here, mirroring the tool's own
/// convention for its run log.
pub const LOG_FILE: &str = "output.out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn rendered(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Assembles the argv for one invocation: an optional container prefix,
/// the mpirun parallel-launch prefix, the tool module and the merged
/// configuration file. Values are not validated beyond presence; the tool
/// itself is the sole validator of configuration semantics.
pub fn build_command(
    properties: &Properties,
    staging_host_dir: &Path,
    config_path: &str,
) -> Result<CommandLine> {
    let tool_args = [
        "-n".to_string(),
        properties.cpus.to_string(),
        "python".to_string(),
        "-m".to_string(),
        TOOL_MODULE.to_string(),
        config_path.to_string(),
    ];
    let bind = format!(
        "{}:{}",
        staging_host_dir.display(),
        properties.container_volume_path
    );
    match properties.container_path {
        ContainerRuntime::None => Ok(CommandLine {
            program: properties.binary_path.clone(),
            args: tool_args.to_vec(),
        }),
        ContainerRuntime::Docker => {
            let image = require_image(properties, "docker")?;
            let mut args = vec![
                "run".to_string(),
                "--rm".to_string(),
                "-v".to_string(),
                bind,
                "-w".to_string(),
                properties.container_volume_path.clone(),
                image,
                properties.binary_path.clone(),
            ];
            args.extend(tool_args);
            Ok(CommandLine {
                program: "docker".to_string(),
                args,
            })
        }
        ContainerRuntime::Singularity => {
            let image = require_image(properties, "singularity")?;
            let mut args = vec![
                properties.container_generic_command.clone(),
                "--bind".to_string(),
                bind,
                "--pwd".to_string(),
                properties.container_volume_path.clone(),
                image,
                properties.binary_path.clone(),
            ];
            args.extend(tool_args);
            Ok(CommandLine {
                program: "singularity".to_string(),
                args,
            })
        }
    }
}

fn require_image(properties: &Properties, runtime: &str) -> Result<String> {
    properties
        .container_image
        .clone()
        .ok_or_else(|| BlockError::MissingContainerImage(runtime.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Properties {
        Properties::default()
    }

    #[test]
    fn native_command_is_mpirun_prefixed() {
        let mut properties = props();
        properties.cpus = 4;
        let command =
            build_command(&properties, Path::new("/tmp/stage"), "/tmp/stage/input.yaml").unwrap();
        assert_eq!(command.program, "mpirun");
        assert_eq!(
            command.args,
            [
                "-n",
                "4",
                "python",
                "-m",
                "ActiveSiteDesign",
                "/tmp/stage/input.yaml"
            ]
        );
    }

    #[test]
    fn docker_command_mounts_staging_directory() {
        let mut properties = props();
        properties.container_path = ContainerRuntime::Docker;
        properties.container_image = Some("bsceapm/asitedesign:1.0".to_string());
        properties.cpus = 2;
        let command =
            build_command(&properties, Path::new("/host/stage"), "/data/input.yaml").unwrap();
        assert_eq!(command.program, "docker");
        assert_eq!(
            command.rendered(),
            "docker run --rm -v /host/stage:/data -w /data bsceapm/asitedesign:1.0 \
             mpirun -n 2 python -m ActiveSiteDesign /data/input.yaml"
        );
    }

    #[test]
    fn singularity_command_uses_generic_command_and_bind() {
        let mut properties = props();
        properties.container_path = ContainerRuntime::Singularity;
        properties.container_image = Some("/images/asitedesign.sif".to_string());
        let command =
            build_command(&properties, Path::new("/host/stage"), "/data/input.yaml").unwrap();
        assert_eq!(command.program, "singularity");
        assert_eq!(command.args[0], "exec");
        assert!(command.args.contains(&"/host/stage:/data".to_string()));
        assert!(command.args.contains(&"/images/asitedesign.sif".to_string()));
    }

    #[test]
    fn binary_path_overrides_the_parallel_launcher() {
        let mut properties = props();
        properties.binary_path = "srun".to_string();
        let command =
            build_command(&properties, Path::new("/tmp/stage"), "/tmp/stage/input.yaml").unwrap();
        assert_eq!(command.program, "srun");
    }

    #[test]
    fn container_runtime_without_image_is_rejected() {
        let mut properties = props();
        properties.container_path = ContainerRuntime::Docker;
        let result = build_command(&properties, Path::new("/host/stage"), "/data/input.yaml");
        assert!(matches!(
            result,
            Err(BlockError::MissingContainerImage(runtime)) if runtime == "docker"
        ));
    }
}
