use crate::snapshot::ConfigMapSnapshot;

use k8s_openapi::api::core::v1::ConfigMap as KubeConfigMap;
use kube::core::WatchEvent as KubeWatchEvent;

/* The api server answers a watch on a compacted resource version with 410 Gone */
pub const HTTP_GONE: u16 = 410;

/*
 * WatchEvent is the closed set of notifications a configmap watch can deliver.
 *
 * Added/Modified/Deleted carry the configmap snapshot when the transport
 * provides one. Bookmark only advances the resource version, Expired means
 * the session can't be resumed and must start over, and Other covers
 * anything else the server sends.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Added(Option<ConfigMapSnapshot>),
    Modified(Option<ConfigMapSnapshot>),
    Deleted(Option<ConfigMapSnapshot>),
    Bookmark(String),
    Expired(String),
    Other(String),
}

impl WatchEvent {

    pub fn kind(&self) -> &'static str {
	match self {
	    WatchEvent::Added(_) => "added",
	    WatchEvent::Modified(_) => "modified",
	    WatchEvent::Deleted(_) => "deleted",
	    WatchEvent::Bookmark(_) => "bookmark",
	    WatchEvent::Expired(_) => "expired",
	    WatchEvent::Other(_) => "other",
	}
    }

    pub fn snapshot(&self) -> Option<&ConfigMapSnapshot> {
	match self {
	    WatchEvent::Added(snapshot) |
	    WatchEvent::Modified(snapshot) |
	    WatchEvent::Deleted(snapshot) => snapshot.as_ref(),
	    _ => None,
	}
    }

    /*
     * The resource version a watch can be resumed from once this event
     * has been handled.
     */
    pub fn resource_version(&self) -> Option<&str> {
	match self {
	    WatchEvent::Bookmark(version) => Some(version.as_str()),
	    _ => self.snapshot().and_then(|s| s.resource_version.as_deref()),
	}
    }
}

impl From<KubeWatchEvent<KubeConfigMap>> for WatchEvent {
    fn from(event: KubeWatchEvent<KubeConfigMap>) -> Self {
	match event {
	    KubeWatchEvent::Added(cm) => WatchEvent::Added(Some(cm.into())),
	    KubeWatchEvent::Modified(cm) => WatchEvent::Modified(Some(cm.into())),
	    KubeWatchEvent::Deleted(cm) => WatchEvent::Deleted(Some(cm.into())),
	    KubeWatchEvent::Bookmark(bookmark) => WatchEvent::Bookmark(bookmark.metadata.resource_version),
	    KubeWatchEvent::Error(err) if err.code == HTTP_GONE => WatchEvent::Expired(err.message),
	    KubeWatchEvent::Error(err) => WatchEvent::Other(format!("error {}: {}", err.code, err.message)),
	}
    }
}
