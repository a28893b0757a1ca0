use crate::errors::Error;
use crate::filesync::FileSync;
use crate::filesync::SyncReport;
use configmap_watcher_api as api;

use futures::Stream;
use futures::StreamExt;
use log;
use std::sync::Arc;
use tokio::sync::Mutex;

/*
 * The settings volume is only reachable through this lock, so at most one
 * FileSync operation runs at any time no matter how many writers exist.
 */
pub type ReconciliationLock = Arc<Mutex<FileSync>>;

pub fn reconciliation_lock(sync: FileSync) -> ReconciliationLock {
    Arc::new(Mutex::new(sync))
}

/* Whether the current watch session can keep going after an event */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Resync,
}

/*
 * EventProcessor applies watch events to the settings volume, one at a time
 * and in arrival order. It remembers the last applied snapshot (to serve
 * Deleted events without data, and for pruning) and the resource version a
 * new session should resume from.
 */
pub struct EventProcessor {
    sync: ReconciliationLock,
    prune_stale_keys: bool,

    last_known: Option<api::ConfigMapSnapshot>,
    resource_version: Option<String>,
}

impl EventProcessor {

    pub fn resource_version(&self) -> Option<&str> {
	self.resource_version.as_deref()
    }

    #[cfg(test)]
    pub fn last_known(&self) -> Option<&api::ConfigMapSnapshot> {
	self.last_known.as_ref()
    }

    /*
     * Consume the events of one watch session. Returns Ok(()) when the
     * stream ends or the session expired, which both mean "reconnect". A
     * transport or reconciliation error stops consumption right away.
     */
    pub async fn process<S>(&mut self, mut events: S) -> Result<(), Error>
    where
	S: Stream<Item = Result<api::WatchEvent, Error>> + Unpin,
    {
	while let Some(event) = events.next().await {
	    if self.handle(event?).await? == Flow::Resync {
		return Ok(());
	    }
	}

	log::info!("Channel closed. Server has closed the connection.");
	Ok(())
    }

    pub async fn handle(&mut self, event: api::WatchEvent) -> Result<Flow, Error> {
	let lock = Arc::clone(&self.sync);
	let sync = lock.lock().await;

	let kind = event.kind();
	let resource_version = event.resource_version().map(str::to_owned);

	match event {
	    api::WatchEvent::Added(snapshot) | api::WatchEvent::Modified(snapshot) => {
		log::info!("Configmap {} {}, updating settings files", self.describe(snapshot.as_ref()), kind);

		let report = self.apply(&sync, snapshot.as_ref())
		    .map_err(|err| self.failed(kind, snapshot.as_ref(), err))?;
		self.applied(kind, report);

		if snapshot.is_some() {
		    self.last_known = snapshot;
		}
	    },
	    api::WatchEvent::Deleted(snapshot) => {
		log::info!("Configmap {} deleted, removing settings files", self.describe(snapshot.as_ref()));

		let removed = snapshot.or_else(|| self.last_known.clone()).unwrap_or_default();
		let report = sync.remove_snapshot(&removed)
		    .map_err(|err| self.failed(kind, Some(&removed), err))?;
		self.applied(kind, report);

		self.last_known = None;
	    },
	    api::WatchEvent::Bookmark(_) => {
		log::debug!("Bookmark at resource version {:?}", resource_version);
	    },
	    api::WatchEvent::Expired(reason) => {
		log::warn!("Watch on configmap {} expired ({}), starting over", self.describe(None), reason);
		self.resource_version = None;
		return Ok(Flow::Resync);
	    },
	    api::WatchEvent::Other(what) => {
		log::error!("Unsupported event type '{}'", what);
		return Ok(Flow::Continue);
	    },
	}

	if resource_version.is_some() {
	    self.resource_version = resource_version;
	}
	Ok(Flow::Continue)
    }

    fn apply(&self, sync: &FileSync, snapshot: Option<&api::ConfigMapSnapshot>) -> Result<SyncReport, Error> {
	let empty = api::ConfigMapSnapshot::default();
	let current = snapshot.unwrap_or(&empty);

	if self.prune_stale_keys {
	    sync.apply_snapshot_pruning(current, self.last_known.as_ref())
	} else {
	    sync.apply_snapshot(current)
	}
    }

    fn applied(&self, kind: &str, report: SyncReport) {
	log::info!("Applied {} event: {} file(s) written, {} file(s) removed", kind, report.written, report.removed);
    }

    fn failed(&self, kind: &str, snapshot: Option<&api::ConfigMapSnapshot>, err: Error) -> Error {
	log::error!("Failed to apply {} event for configmap {}: {}", kind, self.describe(snapshot), err);
	err
    }

    fn describe(&self, snapshot: Option<&api::ConfigMapSnapshot>) -> String {
	match snapshot.or(self.last_known.as_ref()) {
	    Some(s) => s.target.to_string(),
	    None => String::from("<unknown>"),
	}
    }

    pub fn new(sync: ReconciliationLock, prune_stale_keys: bool) -> Self {
	Self{
	    sync: sync,
	    prune_stale_keys: prune_stale_keys,

	    last_known: None,
	    resource_version: None,
	}
    }
}
