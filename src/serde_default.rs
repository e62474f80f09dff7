use std::path::PathBuf;

pub fn default_true() -> bool {
    true
}

pub fn default_cpus() -> u32 {
    1
}

pub fn default_job_name() -> String {
    String::from("DesignCatalyticSite_job")
}

pub fn default_simulation_type() -> String {
    String::from("CatalyticSite")
}

pub fn default_iterations() -> u32 {
    5
}

pub fn default_steps() -> u32 {
    2
}

pub fn default_poses() -> u32 {
    3
}

pub fn default_time() -> u32 {
    48
}

pub fn default_volume_path() -> String {
    String::from("/data")
}

pub fn default_generic_command() -> String {
    String::from("exec")
}

pub fn default_sandbox() -> PathBuf {
    PathBuf::from(".")
}

pub fn default_binary_path() -> String {
    String::from("mpirun")
}
