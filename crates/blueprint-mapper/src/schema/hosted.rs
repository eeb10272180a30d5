//! Hosted-dialect schema
//!
//! This is the wire format of the primary image-builder backend: the
//! export/import document, blueprint create/update requests, and the
//! blueprint responses returned for editing. Customizations are a flat bag of
//! optional fields; an absent field is always `None`, never an empty list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::repositories::ApiRepositoryRequest;

/// Keys with no typed counterpart, carried through unchanged
pub type Extra = Map<String, Value>;

/// Blueprint document as exported for download and accepted on import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintExport {
    /// Blueprint name
    pub name: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Distribution identifier (e.g. "rhel-9")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,

    /// Image customizations
    #[serde(default)]
    pub customizations: Customizations,

    /// Export metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Repository definitions the blueprint depends on, to be imported on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_sources: Option<Vec<ApiRepositoryRequest>>,

    /// Repository snapshot date used when building
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub exported_at: String,

    /// Set when the document was translated from the on-prem dialect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on_prem: Option<bool>,
}

/// Request body for creating or updating a blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBlueprintRequest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub distribution: String,

    pub image_requests: Vec<ImageRequest>,

    pub customizations: Customizations,
}

/// Blueprint as returned by the backend for editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintResponse {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub distribution: String,

    #[serde(default)]
    pub image_requests: Vec<ImageRequest>,

    #[serde(default)]
    pub customizations: Customizations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<String>,
}

/// Response to blueprint creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBlueprintResponse {
    pub id: String,
}

/// One compose started from a blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeResponse {
    pub id: String,
}

/// Blueprint summary as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub last_modified_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintsResponse {
    pub data: Vec<BlueprintItem>,
}

/// A single build target within a blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub architecture: String,

    /// Kept as a string so that unknown image types can be reported
    pub image_type: String,

    pub upload_request: UploadRequest,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_date: Option<String>,
}

/// Upload destination, tagged by `type` with the options under `options`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options")]
pub enum UploadRequest {
    #[serde(rename = "aws")]
    Aws(AwsUploadRequestOptions),
    #[serde(rename = "azure")]
    Azure(AzureUploadRequestOptions),
    #[serde(rename = "gcp")]
    Gcp(GcpUploadRequestOptions),
    #[serde(rename = "aws.s3")]
    AwsS3(EmptyOptions),
    #[serde(rename = "oci.objectstorage")]
    OciObjectStorage(EmptyOptions),
}

/// Exactly one of the two fields is set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsUploadRequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_with_accounts: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_with_sources: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AzureUploadRequestOptions {
    /// Target resolved through a configured cloud source
    Source {
        source_id: String,
        resource_group: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hyper_v_generation: Option<String>,
    },
    /// Target given as raw tenant and subscription
    Tenant {
        tenant_id: String,
        subscription_id: String,
        resource_group: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hyper_v_generation: Option<String>,
    },
}

/// `None` means the image is shared with the insights account only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcpUploadRequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_with_accounts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyOptions {}

/// Customizations of a hosted blueprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customizations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<Container>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<File>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,

    /// Package names; package groups are prefixed with `@`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_repositories: Option<Vec<PayloadRepository>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_repositories: Option<Vec<CustomRepository>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openscap: Option<OpenScap>,

    /// Mutually exclusive with `disk`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Vec<Filesystem>>,

    /// Mutually exclusive with `filesystem`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<Disk>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitioning_mode: Option<PartitioningMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Services>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<Kernel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Timezone>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall: Option<Firewall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fips: Option<Fips>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_device: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        alias = "tls-verify",
        skip_serializing_if = "Option::is_none"
    )]
    pub tls_verify: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_encoding: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure_parents: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub organization: u64,

    pub activation_key: String,

    #[serde(rename = "server-url")]
    pub server_url: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    pub insights: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhc: Option<bool>,
}

/// A user-defined repository, referenced by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomRepository {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseurl: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrorlist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metalink: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpgkey: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_gpg: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_repo_gpg: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_verify: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hotfixes: Option<bool>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A repository whose packages end up in the image but not the build root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadRepository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseurl: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrorlist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metalink: Option<String>,

    #[serde(default)]
    pub rhsm: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpgkey: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_gpg: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_repo_gpg: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_ssl: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hotfixes: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenScap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_description: Option<String>,

    /// Compliance policy the profile was selected through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filesystem {
    pub mountpoint: String,

    /// Minimum size in bytes
    pub min_size: u64,
}

/// Disk layout customization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minsize: Option<DiskSize>,

    #[serde(default)]
    pub partitions: Vec<Value>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Disk size as written by the author: a byte count or a size string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiskSize {
    Bytes(u64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitioningMode {
    Raw,
    Lvm,
    AutoLvm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,

    /// Reported by the backend instead of the password itself
    #[serde(
        rename = "hasPassword",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub has_password: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Services {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Space separated kernel command line arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timezone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntpservers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Firewall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<FirewallServices>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirewallServices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fips {
    pub enabled: bool,
}
