//! Normalized wizard state
//!
//! UI-agnostic representation of one blueprint in progress. Created empty or
//! from an import/edit response, mutated step by step, and consumed once when
//! the create request is built.

use blueprint_common::{from_bytes, to_bytes, Error, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::hosted::{
    Container, CustomRepository, Disk, Extra, File, Group, PartitioningMode, PayloadRepository,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardState {
    pub name: String,
    pub description: String,
    pub distribution: String,
    pub architecture: Architecture,

    /// Selected image types, in selection order
    pub image_types: Vec<ImageType>,
    pub aws: AwsTarget,
    pub azure: AzureTarget,
    pub gcp: GcpTarget,

    /// `None` builds against the latest repository content
    pub snapshot_date: Option<String>,

    pub packages: Vec<String>,
    /// Package groups, without the `@` prefix
    pub package_groups: Vec<String>,
    pub custom_repositories: Vec<CustomRepository>,
    pub payload_repositories: Vec<PayloadRepository>,

    pub registration: Registration,

    pub file_system: FileSystemConfig,
    pub disk: Option<Disk>,
    pub partitioning_mode: Option<PartitioningMode>,

    pub first_boot: FirstBoot,
    pub compliance: Option<ComplianceSelection>,

    pub users: Vec<UserState>,
    pub groups: Vec<Group>,
    pub hostname: Option<String>,
    pub kernel: KernelState,
    pub firewall: FirewallState,
    pub services: ServicesState,
    pub timezone: TimezoneState,
    pub locale: LocaleState,
    pub fips: bool,

    pub containers: Vec<Container>,
    /// Files other than the first-boot script and its unit
    pub files: Vec<File>,
    pub installation_device: Option<String>,

    /// Customizations this state has no step for, kept for the round trip
    pub extra_customizations: Extra,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "aarch64")]
    Aarch64,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Aarch64 => "aarch64",
        }
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(Architecture::X86_64),
            "aarch64" => Ok(Architecture::Aarch64),
            other => Err(Error::Validation(format!(
                "unsupported architecture '{}'",
                other
            ))),
        }
    }
}

/// Known image types. The set is closed: anything else is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageType {
    Aws,
    Ami,
    Azure,
    Vhd,
    Gcp,
    Oci,
    GuestImage,
    ImageInstaller,
    NetworkInstaller,
    Vsphere,
    VsphereOva,
    Wsl,
}

impl ImageType {
    pub const ALL: [ImageType; 12] = [
        ImageType::Aws,
        ImageType::Ami,
        ImageType::Azure,
        ImageType::Vhd,
        ImageType::Gcp,
        ImageType::Oci,
        ImageType::GuestImage,
        ImageType::ImageInstaller,
        ImageType::NetworkInstaller,
        ImageType::Vsphere,
        ImageType::VsphereOva,
        ImageType::Wsl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::Aws => "aws",
            ImageType::Ami => "ami",
            ImageType::Azure => "azure",
            ImageType::Vhd => "vhd",
            ImageType::Gcp => "gcp",
            ImageType::Oci => "oci",
            ImageType::GuestImage => "guest-image",
            ImageType::ImageInstaller => "image-installer",
            ImageType::NetworkInstaller => "network-installer",
            ImageType::Vsphere => "vsphere",
            ImageType::VsphereOva => "vsphere-ova",
            ImageType::Wsl => "wsl",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownImageType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AwsShareMethod {
    /// Share with the account behind a configured cloud source
    #[default]
    Sources,
    /// Share with explicitly entered account ids
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsTarget {
    pub share_method: AwsShareMethod,
    pub source_id: Option<String>,
    pub account_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AzureShareMethod {
    #[default]
    Sources,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureTarget {
    pub share_method: AzureShareMethod,
    pub source_id: Option<String>,
    pub tenant_id: Option<String>,
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub hyper_v_generation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GcpShareMethod {
    WithGoogle,
    /// Share with the insights account only
    #[default]
    WithInsights,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GcpAccountType {
    #[default]
    User,
    Service,
    Group,
    Domain,
}

impl GcpAccountType {
    /// Principal kind used in `share_with_accounts` entries
    pub fn principal_kind(self) -> &'static str {
        match self {
            GcpAccountType::User => "user",
            GcpAccountType::Service => "serviceAccount",
            GcpAccountType::Group => "group",
            GcpAccountType::Domain => "domain",
        }
    }

    pub fn from_principal_kind(kind: &str) -> Option<Self> {
        match kind {
            "user" => Some(GcpAccountType::User),
            "serviceAccount" => Some(GcpAccountType::Service),
            "group" => Some(GcpAccountType::Group),
            "domain" => Some(GcpAccountType::Domain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcpTarget {
    pub share_method: GcpShareMethod,
    pub account_type: GcpAccountType,
    /// Used by every account type except `Domain`
    pub email: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationMode {
    #[default]
    RegisterLater,
    RegisterNow,
    RegisterNowInsights,
    RegisterNowRhc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub mode: RegistrationMode,
    pub activation_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSystemMode {
    #[default]
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSystemConfig {
    pub mode: FileSystemMode,
    pub partitions: Vec<Partition>,
}

/// A manually configured partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub id: String,
    pub mountpoint: String,
    /// Canonical size in bytes
    pub min_size: u64,
    /// Unit the size is displayed in
    pub unit: Unit,
}

impl Partition {
    /// Partition from a size the user entered in `unit`
    pub fn new(mountpoint: impl Into<String>, size: f64, unit: Unit) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mountpoint: mountpoint.into(),
            min_size: to_bytes(size, unit),
            unit,
        }
    }

    /// Partition from a byte count, displayed in the largest exact unit
    pub fn from_bytes(mountpoint: impl Into<String>, min_size: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mountpoint: mountpoint.into(),
            min_size,
            unit: Unit::preferred_for(min_size),
        }
    }

    pub fn display_size(&self) -> f64 {
        from_bytes(self.min_size, self.unit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirstBoot {
    /// Script body, empty when no first-boot script is configured
    pub script: String,
}

/// Either id may be absent when the selection came through a policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceSelection {
    pub profile_id: Option<String>,
    pub profile_name: Option<String>,
    pub profile_description: Option<String>,
    pub policy_id: Option<String>,
    /// OpenSCAP keys with no wizard field, such as `datastream`
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserState {
    pub name: String,
    pub password: Option<String>,
    pub ssh_key: Option<String>,
    /// Supplementary groups, `wheel` excluded
    pub groups: Vec<String>,
    pub is_administrator: bool,
    /// The backend holds a password this state does not know
    pub has_password: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelState {
    pub name: Option<String>,
    pub append: Vec<String>,
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallState {
    pub ports: Vec<String>,
    pub enabled_services: Vec<String>,
    pub disabled_services: Vec<String>,
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesState {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    pub masked: Vec<String>,
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneState {
    pub timezone: Option<String>,
    pub ntp_servers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleState {
    pub languages: Vec<String>,
    pub keyboard: Option<String>,
}
