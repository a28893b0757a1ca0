use k8s_openapi::api::core::v1::ConfigMap as KubeConfigMap;
use std::collections::BTreeMap;
use std::fmt;

/*
 * Identity of the single configmap being mirrored.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigMapRef {
    pub namespace: String,
    pub name: String,
}

impl ConfigMapRef {

    /*
     * The field selector that scopes a list/watch to exactly this object.
     */
    pub fn field_selector(&self) -> String {
	format!("metadata.name={}", self.name)
    }

    pub fn new(namespace: &str, name: &str) -> Self {
	Self{
	    namespace: namespace.to_string(),
	    name: name.to_string(),
	}
    }
}

impl fmt::Display for ConfigMapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	write!(f, "{}/{}", self.namespace, self.name)
    }
}

/*
 * ConfigMapSnapshot is the read-only view of a configmap's data at the time
 * an event was emitted. A configmap without `.data` yields an empty snapshot.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMapSnapshot {
    pub target: ConfigMapRef,
    pub resource_version: Option<String>,
    pub data: BTreeMap<String, String>,
}

impl ConfigMapSnapshot {

    pub fn keys(&self) -> impl Iterator<Item = &str> {
	self.data.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
	self.data.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
	self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
	self.data.len()
    }

    pub fn is_empty(&self) -> bool {
	self.data.is_empty()
    }

    pub fn with_resource_version(mut self, resource_version: &str) -> Self {
	self.resource_version = Some(resource_version.to_string());
	self
    }

    pub fn new(target: ConfigMapRef, data: BTreeMap<String, String>) -> Self {
	Self{
	    target: target,
	    resource_version: None,
	    data: data,
	}
    }
}

impl From<KubeConfigMap> for ConfigMapSnapshot {
    fn from(configmap: KubeConfigMap) -> Self {
	let target = ConfigMapRef{
	    namespace: configmap.metadata.namespace.unwrap_or_default(),
	    name: configmap.metadata.name.unwrap_or_default(),
	};

	Self{
	    target: target,
	    resource_version: configmap.metadata.resource_version,
	    data: configmap.data.unwrap_or_default(),
	}
    }
}
