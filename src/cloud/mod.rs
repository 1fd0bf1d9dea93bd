// Cloud provider collaborator interfaces
// Compute operations consumed via request/response calls

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A region and its API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: String,
    pub endpoint: String,
}

/// Instance lifecycle state as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// One instance as listed by describe calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub id: String,
    /// Value of the Name tag, when present
    pub name: Option<String>,
    pub state: InstanceState,
    pub instance_type: String,
}

/// Parameters for launching one or more instances
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub image_id: String,
    pub instance_type: String,
    pub key_pair: String,
    pub security_group: String,
    pub name_tag: String,
    pub count: usize,
}

/// One bucket as listed by the storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    pub name: String,
    pub region: String,
}

/// One object as listed within a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size_bytes: u64,
}

/// Failure modes surfaced by the compute and storage collaborators
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("no instance found with id or name '{0}'")]
    InstanceNotFound(String),

    #[error("instance {id} is {state} and cannot be {action}")]
    InvalidState {
        id: String,
        state: InstanceState,
        action: &'static str,
    },

    #[error("key pair '{0}' already exists")]
    KeyPairExists(String),

    #[error("bucket '{0}' already exists")]
    BucketExists(String),

    #[error("bucket '{0}' not found")]
    BucketNotFound(String),

    #[error("object '{key}' not found in bucket '{bucket}'")]
    ObjectNotFound { bucket: String, key: String },

    #[error("provider error: {0}")]
    Provider(String),
}

/// Compute operations: one outbound call per method, no local state
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn list_regions(&self) -> Result<Vec<RegionInfo>, CloudError>;

    async fn describe_instances(&self, region: &str) -> Result<Vec<InstanceSummary>, CloudError>;

    async fn launch_instances(
        &self,
        region: &str,
        request: &LaunchRequest,
    ) -> Result<Vec<String>, CloudError>;

    async fn start_instance(&self, region: &str, instance_id: &str) -> Result<(), CloudError>;

    async fn stop_instance(&self, region: &str, instance_id: &str) -> Result<(), CloudError>;

    async fn list_key_pairs(&self, region: &str) -> Result<Vec<String>, CloudError>;

    /// Create a key pair and return its private key material
    async fn create_key_pair(&self, region: &str, name: &str) -> Result<String, CloudError>;

    async fn list_security_groups(&self, region: &str) -> Result<Vec<String>, CloudError>;

    /// Find instances matching either an instance id or a Name tag
    async fn resolve_instances(
        &self,
        region: &str,
        identifier: &str,
    ) -> Result<Vec<InstanceSummary>, CloudError> {
        let matches: Vec<InstanceSummary> = self
            .describe_instances(region)
            .await?
            .into_iter()
            .filter(|instance| {
                instance.id == identifier || instance.name.as_deref() == Some(identifier)
            })
            .collect();

        if matches.is_empty() {
            Err(CloudError::InstanceNotFound(identifier.to_string()))
        } else {
            Ok(matches)
        }
    }
}

/// Object storage operations: buckets and the objects within them
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Create a bucket homed in the given region
    async fn create_bucket(&self, region: &str, name: &str) -> Result<(), CloudError>;

    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, CloudError>;

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, CloudError>;

    /// Store an object under the given key, replacing any existing body
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), CloudError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), CloudError>;
}
