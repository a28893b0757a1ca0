use crate::cli::Args;
use crate::client::ClientProvider;
use crate::errors::Error;
use crate::supervisor::WatchSupervisor;

use log;
use std::future::Future;

/*
 * Validate the flags, build the client and run the watch loop until
 * `shutdown` resolves. Only returns Ok(()) on shutdown.
 */
pub async fn run<P, F>(provider: &P, args: Args, shutdown: F) -> Result<(), Error>
where
    P: ClientProvider,
    F: Future<Output = ()>,
{
    let config = args.validate()?;

    let client = match provider.create_client(&config.kubeconfig_file).await {
	Ok(client) => client,
	Err(err) => {
	    log::error!("failed to create kube client from {}: {}", config.kubeconfig_file.display(), err);
	    return Err(err);
	}
    };

    log::info!("starting configmap-watcher for {} into {}", config.target, config.settings_volume.display());
    let mut supervisor = WatchSupervisor::new(client, &config);
    supervisor.run_until(shutdown).await
}
