/*
 * FileSync mirrors configmap data into the settings volume, one regular file
 * per data key, and owns the marker file whose presence tells the consumers
 * in the pod that the volume holds a complete snapshot.
 *
 * Every operation runs the same three steps:
 *
 *  1. remove the marker (already absent is fine)
 *  2. write or remove the per-key files
 *  3. recreate the marker
 *
 * When step 2 fails the marker stays absent and the error is returned, so a
 * half-applied volume is never advertised as ready.
 */
use crate::errors::io_err;
use crate::errors::Error;
use configmap_watcher_api as api;

use log;
use std::fs;
use std::io;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;

/* owner/group read-write, nothing for others */
pub const FILE_MODE: u32 = 0o640;

pub const MARKER_FILE: &str = "inotifysettingscreated";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub written: usize,
    pub removed: usize,
}

#[derive(Debug)]
pub struct FileSync {
    settings_volume: PathBuf,
}

fn remove_if_exists(path: &Path) -> Result<bool, Error> {
    match fs::remove_file(path) {
	Ok(()) => Ok(true),
	Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
	Err(err) => Err(io_err("remove", path, err)),
    }
}

impl FileSync {

    pub fn marker_path(&self) -> PathBuf {
	self.settings_volume.join(MARKER_FILE)
    }

    /*
     * Create (or truncate) the marker file.
     */
    pub fn signal_ready(&self) -> Result<(), Error> {
	let marker = self.marker_path();
	fs::File::create(&marker).map_err(|err| io_err("create", &marker, err))?;
	log::debug!("Created marker file {}", marker.display());
	Ok(())
    }

    fn clear_ready(&self) -> Result<(), Error> {
	remove_if_exists(&self.marker_path())?;
	Ok(())
    }

    /*
     * Runs `change` between taking the marker down and putting it back. The
     * marker is only recreated when `change` succeeds.
     */
    pub(crate) fn reconcile<F>(&self, change: F) -> Result<SyncReport, Error>
    where
	F: FnOnce(&Self) -> Result<SyncReport, Error>,
    {
	self.clear_ready()?;
	let report = change(self)?;
	self.signal_ready()?;
	Ok(report)
    }

    /*
     * Write every key of the snapshot. Files of keys that are no longer in
     * the configmap are left alone.
     */
    pub fn apply_snapshot(&self, snapshot: &api::ConfigMapSnapshot) -> Result<SyncReport, Error> {
	self.apply_snapshot_pruning(snapshot, None)
    }

    /*
     * Like apply_snapshot(), but also removes the files of keys that were in
     * `previous` and are gone from `snapshot`. Only keys this process wrote
     * before are candidates, unrelated files in the volume are never touched.
     */
    pub fn apply_snapshot_pruning(&self, snapshot: &api::ConfigMapSnapshot, previous: Option<&api::ConfigMapSnapshot>) -> Result<SyncReport, Error> {
	self.reconcile(|sync| {
	    let mut report = SyncReport::default();

	    for (key, value) in &snapshot.data {
		if sync.write_setting(key, value)? {
		    report.written += 1;
		}
	    }

	    if let Some(previous) = previous {
		for key in previous.keys().filter(|key| !snapshot.contains_key(key)) {
		    log::info!("Pruning stale settings file: {}", key);
		    if sync.remove_setting(key)? {
			report.removed += 1;
		    }
		}
	    }

	    Ok(report)
	})
    }

    /*
     * Remove the file of every key in the snapshot; files that are already
     * gone are not an error.
     */
    pub fn remove_snapshot(&self, snapshot: &api::ConfigMapSnapshot) -> Result<SyncReport, Error> {
	self.reconcile(|sync| {
	    let mut report = SyncReport::default();

	    for key in snapshot.keys() {
		if sync.remove_setting(key)? {
		    report.removed += 1;
		}
	    }

	    Ok(report)
	})
    }

    fn write_setting(&self, key: &str, value: &str) -> Result<bool, Error> {
	if key == MARKER_FILE {
	    log::warn!("Skipping settings key '{}': it collides with the marker file", key);
	    return Ok(false);
	}

	let path = self.settings_volume.join(key);
	log::debug!("Creating/updating settings file: {}", path.display());

	let mut file = fs::OpenOptions::new()
	    .write(true)
	    .create(true)
	    .truncate(true)
	    .mode(FILE_MODE)
	    .open(&path)
	    .map_err(|err| io_err("create/update", &path, err))?;
	file.write_all(value.as_bytes()).map_err(|err| io_err("write", &path, err))?;

	// mode() only applies on creation
	fs::set_permissions(&path, fs::Permissions::from_mode(FILE_MODE))
	    .map_err(|err| io_err("chmod", &path, err))?;

	Ok(true)
    }

    fn remove_setting(&self, key: &str) -> Result<bool, Error> {
	if key == MARKER_FILE {
	    return Ok(false);
	}

	let path = self.settings_volume.join(key);
	log::debug!("Deleting settings file: {}", path.display());
	remove_if_exists(&path)
    }

    pub fn new(settings_volume: impl Into<PathBuf>) -> Self {
	Self{
	    settings_volume: settings_volume.into(),
	}
    }
}
