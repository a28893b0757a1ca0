/*
 * configmap-watcher/api - defines the objects exchanged between the kubernetes
 * watch transport and the reconciliation loop that mirrors a configmap on disk
 */

pub mod snapshot;
pub use snapshot::ConfigMapRef;
pub use snapshot::ConfigMapSnapshot;

pub mod event;
pub use event::WatchEvent;
