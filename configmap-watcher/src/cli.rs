use crate::config::WatcherConfig;
use crate::errors::required;
use crate::errors::Error;
use configmap_watcher_api as api;

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_NAMESPACE: &str = "kube-system";

#[derive(Parser, Debug, Clone)]
#[command(name = "configmap-watcher", version)]
#[command(about = "This binary will watch a configmap and load the values in a pod volume")]
pub struct Args {
    #[arg(long = "kubeconfig-file", help = "Path to the kubeconfig")]
    pub kubeconfig_file: Option<PathBuf>,

    #[arg(long = "configmap-namespace", default_value = DEFAULT_NAMESPACE, help = "The configmap namespace")]
    pub configmap_namespace: String,

    #[arg(long = "configmap-name", help = "The configmap name")]
    pub configmap_name: Option<String>,

    #[arg(long = "settings-volume", help = "Directory where the settings files are written")]
    pub settings_volume: Option<PathBuf>,

    #[arg(long = "prune-stale-keys", help = "Also delete the files of keys removed from the configmap on update")]
    pub prune_stale_keys: bool,
}

fn non_empty<T: AsRef<std::ffi::OsStr>>(value: Option<T>, flag: &str) -> Result<T, Error> {
    match value {
	Some(v) if !v.as_ref().is_empty() => Ok(v),
	_ => Err(required(flag)),
    }
}

impl Args {

    /*
     * Check the flags in the order they are documented and build the
     * watcher configuration out of them.
     */
    pub fn validate(self) -> Result<WatcherConfig, Error> {
	let kubeconfig_file = non_empty(self.kubeconfig_file, "kubeconfig-file")?;
	let name = non_empty(self.configmap_name, "configmap-name")?;
	let settings_volume = non_empty(self.settings_volume, "settings-volume")?;

	if self.configmap_namespace.is_empty() {
	    return Err(required("configmap-namespace"));
	}

	if !settings_volume.is_dir() {
	    let errmsg = format!("--settings-volume {} is not a directory", settings_volume.display());
	    return Err(Error::InvalidParameter(errmsg));
	}

	Ok(WatcherConfig{
	    kubeconfig_file: kubeconfig_file,
	    target: api::ConfigMapRef::new(&self.configmap_namespace, &name),
	    settings_volume: settings_volume,
	    prune_stale_keys: self.prune_stale_keys,
	})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
	let argv = std::iter::once("configmap-watcher").chain(args.iter().copied());
	Args::try_parse_from(argv).expect("arguments parse")
    }

    fn error_of(args: &[&str]) -> String {
	parse(args).validate().expect_err("validation must fail").to_string()
    }

    #[test]
    fn kubeconfig_is_checked_first() {
	assert_eq!(error_of(&[]), "invalid parameter: --kubeconfig-file is required");
    }

    #[test]
    fn configmap_name_is_required() {
	assert_eq!(
	    error_of(&["--kubeconfig-file=/config/fake/kubeconfig", "--settings-volume=/tmp"]),
	    "invalid parameter: --configmap-name is required",
	);
    }

    #[test]
    fn empty_configmap_name_counts_as_missing() {
	assert_eq!(
	    error_of(&["--kubeconfig-file=/config/fake/kubeconfig", "--configmap-name=", "--settings-volume=/tmp"]),
	    "invalid parameter: --configmap-name is required",
	);
    }

    #[test]
    fn settings_volume_is_required() {
	assert_eq!(
	    error_of(&["--kubeconfig-file=/config/fake/kubeconfig", "--configmap-name=settings"]),
	    "invalid parameter: --settings-volume is required",
	);
    }

    #[test]
    fn settings_volume_must_be_a_directory() {
	let volume = TempDir::new().expect("volume");
	let missing = volume.path().join("nope");
	let flag = format!("--settings-volume={}", missing.display());

	let err = error_of(&["--kubeconfig-file=/config/fake/kubeconfig", "--configmap-name=settings", flag.as_str()]);
	assert_eq!(err, format!("invalid parameter: --settings-volume {} is not a directory", missing.display()));
    }

    #[test]
    fn valid_flags_build_the_config() {
	let volume = TempDir::new().expect("volume");
	let flag = format!("--settings-volume={}", volume.path().display());

	let config = parse(&["--kubeconfig-file=/config/fake/kubeconfig", "--configmap-name=ama-metrics-settings-configmap", flag.as_str()])
	    .validate()
	    .expect("valid config");

	assert_eq!(config.kubeconfig_file, PathBuf::from("/config/fake/kubeconfig"));
	assert_eq!(config.target, api::ConfigMapRef::new(DEFAULT_NAMESPACE, "ama-metrics-settings-configmap"));
	assert_eq!(config.settings_volume, volume.path());
	assert!(!config.prune_stale_keys);
    }

    #[test]
    fn namespace_and_prune_can_be_overridden() {
	let volume = TempDir::new().expect("volume");
	let flag = format!("--settings-volume={}", volume.path().display());

	let config = parse(&[
	    "--kubeconfig-file=/config/fake/kubeconfig",
	    "--configmap-namespace=monitoring",
	    "--configmap-name=settings",
	    "--prune-stale-keys",
	    flag.as_str(),
	]).validate().expect("valid config");

	assert_eq!(config.target.to_string(), "monitoring/settings");
	assert!(config.prune_stale_keys);
    }
}
