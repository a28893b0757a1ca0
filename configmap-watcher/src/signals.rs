use log;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;

/* 143=128+SIGTERM, https://tldp.org/LDP/abs/html/exitcodes.html */
pub const EXIT_TERMINATED: i32 = 128 + 15;

/*
 * Resolves once the process receives SIGTERM or SIGINT.
 */
pub async fn terminated() {
    let mut sigterm = match signal(SignalKind::terminate()) {
	Ok(sigterm) => sigterm,
	Err(err) => {
	    log::warn!("Unable to listen for SIGTERM, only SIGINT will stop the watcher: {}", err);
	    if let Err(err) = tokio::signal::ctrl_c().await {
		log::error!("Unable to listen for SIGINT: {}", err);
		std::future::pending::<()>().await;
	    }
	    return;
	}
    };

    tokio::select! {
	_ = sigterm.recv() => log::info!("os interrupt SIGTERM, exiting..."),
	_ = tokio::signal::ctrl_c() => log::info!("os interrupt SIGINT, exiting..."),
    }
}
