use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {

    /* encapsulate a kube-rust error */
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),

    /* the kubeconfig file couldn't be read or resolved */
    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /* a settings file or the marker couldn't be written/removed */
    #[error("unable to {op} {}: {source}", path.display())]
    Io {
	op: &'static str,
	path: PathBuf,
	#[source]
	source: std::io::Error,
    },
}

pub fn io_err(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::Io{
	op: op,
	path: path.to_path_buf(),
	source: source,
    }
}

pub fn required(flag: &str) -> Error {
    Error::InvalidParameter(format!("--{} is required", flag))
}
