use crate::errors::Error;
use configmap_watcher_api as api;

use futures::stream::BoxStream;
use futures::StreamExt;
use futures::TryStreamExt;
use k8s_openapi::api::core::v1::ConfigMap as KubeConfigMap;
use kube::Api as KubeApi;
use kube::Client as KubeClient;
use kube::Config as KubeConfig;
use kube::api::WatchParams as KubeWatchParams;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use log;
use std::future::Future;
use std::path::Path;

/* server side watch timeout, kept below the api server's 5 minute cap */
pub const WATCH_TIMEOUT_SECS: u32 = 290;

pub type EventStream = BoxStream<'static, Result<api::WatchEvent, Error>>;

/*
 * The operations the watch loop needs from the cluster: a point read of the
 * configmap and a watch scoped to it. The stream ending means the server
 * closed the session.
 */
pub trait ConfigMapClient {
    fn get_opt(&self, target: &api::ConfigMapRef) -> impl Future<Output = Result<Option<api::ConfigMapSnapshot>, Error>>;

    fn watch(&self, target: &api::ConfigMapRef, resource_version: &str) -> impl Future<Output = Result<EventStream, Error>>;
}

/*
 * Builds a ConfigMapClient out of a kubeconfig file.
 */
pub trait ClientProvider {
    type Client: ConfigMapClient;

    fn create_client(&self, kubeconfig_file: &Path) -> impl Future<Output = Result<Self::Client, Error>>;
}

#[derive(Clone)]
pub struct KubeConfigMaps {
    kube_client: KubeClient,
}

impl KubeConfigMaps {

    fn api(&self, target: &api::ConfigMapRef) -> KubeApi<KubeConfigMap> {
	KubeApi::namespaced(self.kube_client.clone(), &target.namespace)
    }

    pub fn new(kube_client: KubeClient) -> Self {
	Self{
	    kube_client: kube_client,
	}
    }
}

impl ConfigMapClient for KubeConfigMaps {

    async fn get_opt(&self, target: &api::ConfigMapRef) -> Result<Option<api::ConfigMapSnapshot>, Error> {
	let configmap = self.api(target).get_opt(&target.name).await?;
	Ok(configmap.map(api::ConfigMapSnapshot::from))
    }

    async fn watch(&self, target: &api::ConfigMapRef, resource_version: &str) -> Result<EventStream, Error> {
	let params = KubeWatchParams::default()
	    .fields(&target.field_selector())
	    .timeout(WATCH_TIMEOUT_SECS);

	let stream = self.api(target).watch(&params, resource_version).await?;
	Ok(stream
	   .map_ok(api::WatchEvent::from)
	   .map_err(Error::from)
	   .boxed())
    }
}

pub struct KubeProvider;

impl ClientProvider for KubeProvider {
    type Client = KubeConfigMaps;

    async fn create_client(&self, kubeconfig_file: &Path) -> Result<KubeConfigMaps, Error> {
	log::debug!("Loading kubeconfig from {}", kubeconfig_file.display());

	let kubeconfig = Kubeconfig::read_from(kubeconfig_file)?;
	let config = KubeConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
	let kube_client = KubeClient::try_from(config)?;

	Ok(KubeConfigMaps::new(kube_client))
    }
}

/*
 * In-memory stand-in for the api server: every watch() call consumes the next
 * scripted session, and once they run out the watch just hangs like an idle
 * server would.
 */
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    pub fn transport_error(what: &str) -> Error {
	Error::Kube(kube::Error::Service(what.to_string().into()))
    }

    #[derive(Default)]
    pub struct FakeConfigMaps {
	existing: Option<api::ConfigMapSnapshot>,
	fail_get: bool,
	fail_watch: bool,
	sessions: Mutex<VecDeque<Vec<Result<api::WatchEvent, Error>>>>,
	watch_calls: Mutex<Vec<String>>,
    }

    impl FakeConfigMaps {

	pub fn with_existing(mut self, snapshot: api::ConfigMapSnapshot) -> Self {
	    self.existing = Some(snapshot);
	    self
	}

	pub fn with_session(self, events: Vec<Result<api::WatchEvent, Error>>) -> Self {
	    self.sessions.lock().expect("sessions lock").push_back(events);
	    self
	}

	pub fn failing_get(mut self) -> Self {
	    self.fail_get = true;
	    self
	}

	pub fn failing_watch(mut self) -> Self {
	    self.fail_watch = true;
	    self
	}

	/* resource versions requested by each watch() call, in order */
	pub fn watch_calls(&self) -> Vec<String> {
	    self.watch_calls.lock().expect("watch calls lock").clone()
	}

	pub fn new() -> Self {
	    Self::default()
	}
    }

    impl ConfigMapClient for FakeConfigMaps {

	async fn get_opt(&self, _target: &api::ConfigMapRef) -> Result<Option<api::ConfigMapSnapshot>, Error> {
	    if self.fail_get {
		return Err(transport_error("connection refused"));
	    }
	    Ok(self.existing.clone())
	}

	async fn watch(&self, _target: &api::ConfigMapRef, resource_version: &str) -> Result<EventStream, Error> {
	    self.watch_calls.lock().expect("watch calls lock").push(resource_version.to_string());

	    if self.fail_watch {
		return Err(transport_error("unable to create watcher"));
	    }

	    let next = self.sessions.lock().expect("sessions lock").pop_front();
	    match next {
		Some(events) => Ok(futures::stream::iter(events).boxed()),
		None => Ok(futures::stream::pending::<Result<api::WatchEvent, Error>>().boxed()),
	    }
	}
    }

    impl<'a> ConfigMapClient for &'a FakeConfigMaps {

	async fn get_opt(&self, target: &api::ConfigMapRef) -> Result<Option<api::ConfigMapSnapshot>, Error> {
	    (**self).get_opt(target).await
	}

	async fn watch(&self, target: &api::ConfigMapRef, resource_version: &str) -> Result<EventStream, Error> {
	    (**self).watch(target, resource_version).await
	}
    }

    /*
     * Hands out a borrowed fake and remembers which kubeconfig was asked for.
     */
    pub struct FakeProvider<'a> {
	pub client: &'a FakeConfigMaps,
	pub requested: Mutex<Vec<PathBuf>>,
    }

    impl<'a> FakeProvider<'a> {
	pub fn new(client: &'a FakeConfigMaps) -> Self {
	    Self{
		client: client,
		requested: Mutex::new(Vec::new()),
	    }
	}
    }

    impl<'a> ClientProvider for FakeProvider<'a> {
	type Client = &'a FakeConfigMaps;

	async fn create_client(&self, kubeconfig_file: &Path) -> Result<&'a FakeConfigMaps, Error> {
	    self.requested.lock().expect("requested lock").push(kubeconfig_file.to_path_buf());
	    Ok(self.client)
	}
    }
}
