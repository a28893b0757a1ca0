use configmap_watcher_api as api;

use std::path::PathBuf;

/*
 * Everything one watch loop needs to know, resolved from the command line
 * before any cluster traffic happens.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    pub kubeconfig_file: PathBuf,
    pub target: api::ConfigMapRef,

    // directory (usually a shared emptyDir) receiving one file per key
    pub settings_volume: PathBuf,

    pub prune_stale_keys: bool,
}
