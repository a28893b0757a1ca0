/*
 * WatchSupervisor owns the watch-reconcile loop for one configmap:
 *
 *  1. probe whether the configmap exists, and signal "ready" right away when
 *     it doesn't so consumers aren't left waiting for a first snapshot
 *  2. open a WatchSession (Connecting -> Streaming)
 *  3. feed its events to the EventProcessor until the session ends
 *  4. go back to 2
 *
 * A session ending (server closed the stream, expired resource version,
 * transport or reconciliation error) is never fatal. Failing to open a watch
 * or to probe the configmap is: the error is returned so the process exits
 * and the orchestrator restarts it.
 */
use crate::client::ConfigMapClient;
use crate::client::EventStream;
use crate::config::WatcherConfig;
use crate::errors::Error;
use crate::filesync::FileSync;
use crate::filesync::MARKER_FILE;
use crate::probe;
use crate::processor::reconciliation_lock;
use crate::processor::EventProcessor;
use crate::processor::ReconciliationLock;
use configmap_watcher_api as api;

use log;
use std::future::Future;

/* resource version meaning "whatever the server has" */
const ANY_VERSION: &str = "0";

pub struct WatchSession {
    target: api::ConfigMapRef,
    events: EventStream,
}

impl WatchSession {

    pub async fn open<C: ConfigMapClient>(client: &C, target: &api::ConfigMapRef, resource_version: Option<&str>) -> Result<Self, Error> {
	let version = resource_version.unwrap_or(ANY_VERSION);
	log::info!("Watch for changes in configmap {} from resource version {}", target, version);

	let events = match client.watch(target, version).await {
	    Ok(events) => events,
	    Err(err) => {
		log::error!("Unable to create watcher for configmap {}: {}", target, err);
		return Err(err);
	    }
	};

	Ok(Self{
	    target: target.clone(),
	    events: events,
	})
    }

    /*
     * Drive the session to its end. Whatever happened is logged here, the
     * caller always reconnects.
     */
    pub async fn run(self, processor: &mut EventProcessor) {
	match processor.process(self.events).await {
	    Ok(()) => {
		log::info!("Watch session for configmap {} ended, reconnecting", self.target);
	    },
	    Err(err) => {
		log::error!("Watch session for configmap {} failed, reconnecting: {}", self.target, err);
	    },
	}
    }
}

pub struct WatchSupervisor<C> {
    client: C,
    target: api::ConfigMapRef,

    sync: ReconciliationLock,
    processor: EventProcessor,
}

impl<C: ConfigMapClient> WatchSupervisor<C> {

    #[cfg(test)]
    pub fn reconciliation_lock(&self) -> ReconciliationLock {
	self.sync.clone()
    }

    async fn probe(&self) -> Result<(), Error> {
	if !probe::exists(&self.client, &self.target).await? {
	    log::info!("Configmap {} does not exist. Creating {} file.", self.target, MARKER_FILE);
	    self.sync.lock().await.signal_ready()?;
	}
	Ok(())
    }

    /*
     * Runs forever unless the configmap can't be read at startup or a watch
     * can't be opened.
     */
    pub async fn run(&mut self) -> Result<(), Error> {
	self.probe().await?;

	loop {
	    let session = WatchSession::open(&self.client, &self.target, self.processor.resource_version()).await?;
	    session.run(&mut self.processor).await;
	}
    }

    /*
     * Like run(), but returns Ok(()) once `shutdown` resolves. The watch
     * stream is dropped with the run() future, which also releases the
     * reconciliation lock if it was held.
     */
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), Error>
    where
	F: Future<Output = ()>,
    {
	let target = self.target.clone();

	tokio::select! {
	    result = self.run() => result,
	    _ = shutdown => {
		log::info!("Stopping watch on configmap {}", target);
		Ok(())
	    },
	}
    }

    pub fn new(client: C, config: &WatcherConfig) -> Self {
	let sync = reconciliation_lock(FileSync::new(config.settings_volume.clone()));

	Self{
	    client: client,
	    target: config.target.clone(),

	    sync: sync.clone(),
	    processor: EventProcessor::new(sync, config.prune_stale_keys),
	}
    }
}
