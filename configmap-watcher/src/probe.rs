use crate::client::ConfigMapClient;
use crate::errors::Error;
use configmap_watcher_api as api;

use log;

/*
 * Point read of the watched configmap: Ok(false) when it doesn't exist,
 * Ok(true) when it does, Err for anything the transport couldn't answer.
 */
pub async fn exists<C: ConfigMapClient>(client: &C, target: &api::ConfigMapRef) -> Result<bool, Error> {
    match client.get_opt(target).await {
	Ok(found) => Ok(found.is_some()),
	Err(err) => {
	    log::error!("Unable to read configmap {}: {}", target, err);
	    Err(err)
	}
    }
}
