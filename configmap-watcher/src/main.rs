mod app;
mod cli;
mod client;
mod config;
mod errors;
mod filesync;
mod probe;
mod processor;
mod signals;
mod supervisor;

use clap::Parser;
use client::KubeProvider;
use log;

/*
 * configmap-watcher mirrors one configmap into a directory, one file per key,
 * and drops a marker file next to them every time the directory holds a
 * complete copy. It runs until SIGTERM/SIGINT (exit code 143); any fatal
 * error exits with 1 so the pod gets restarted.
 */
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    match app::run(&KubeProvider, args, signals::terminated()).await {
	Ok(()) => std::process::exit(signals::EXIT_TERMINATED),
	Err(err) => {
	    log::error!("{}", err);
	    std::process::exit(1);
	}
    }
}
