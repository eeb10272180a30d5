//! On-prem dialect schema
//!
//! Blueprints written for the self-hosted composer, as TOML or JSON. Only
//! read by this crate; fields that have an identical hosted counterpart reuse
//! the hosted types.

use blueprint_common::units::parse_size;
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::hosted::{
    Container, Disk, Extra, File, Firewall, Group, Kernel, Locale, OpenScap, PartitioningMode,
    Services, Timezone,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnPremBlueprint {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<OnPremPackage>>,

    /// Top-level in this dialect, nested under customizations when hosted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<Container>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customizations: Option<OnPremCustomizations>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnPremPackage {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnPremCustomizations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Vec<OnPremUser>>,

    /// Sparse key list, merged into users after `user`
    #[serde(
        default,
        alias = "sshkey",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssh_key: Option<Vec<OnPremSshKey>>,

    /// Package groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<OnPremPackageGroup>>,

    /// User groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<Group>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<OnPremRepository>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Vec<OnPremFilesystem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fips: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Timezone>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<Kernel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Services>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall: Option<Firewall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openscap: Option<OpenScap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<Disk>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitioning_mode: Option<PartitioningMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<File>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_device: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnPremUser {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Public SSH key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnPremSshKey {
    pub user: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnPremPackageGroup {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnPremRepository {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseurls: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrorlist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metalink: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hotfixes: Option<bool>,

    /// Remaining keys (`gpgkeys`, `gpgcheck`, `repo_gpgcheck`, `sslverify`, ...)
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnPremFilesystem {
    pub mountpoint: String,

    /// Bytes; written either as an integer or as a size string like `"20 GiB"`
    #[serde(deserialize_with = "deserialize_size")]
    pub minsize: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Text(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Bytes(bytes) => Ok(bytes),
        SizeRepr::Text(text) => parse_size(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size '{}'", text))),
    }
}
