//! Hosted documents to wizard state (edit and import paths)

use blueprint_common::{Error, Result};

use crate::mapper::first_boot::{extract_first_boot, FIRST_BOOT_SERVICE};
use crate::mapper::to_request::{non_blank, ADMIN_GROUP};
use crate::schema::hosted::{
    AwsUploadRequestOptions, AzureUploadRequestOptions, BlueprintExport, BlueprintResponse,
    Customizations, GcpUploadRequestOptions, ImageRequest, Subscription, UploadRequest, User,
};
use crate::schema::state::{
    AwsShareMethod, AzureShareMethod, ComplianceSelection, FileSystemConfig, FileSystemMode,
    FirewallState, GcpAccountType, GcpShareMethod, ImageType, KernelState, LocaleState,
    Partition, Registration, RegistrationMode, ServicesState, TimezoneState, UserState,
    WizardState,
};

/// Wizard state for editing an existing blueprint.
///
/// Every image request must name a known image type with a matching upload
/// shape; anything else is reported rather than dropped.
pub fn map_request_to_state(blueprint: &BlueprintResponse) -> Result<WizardState> {
    let mut state = WizardState {
        name: blueprint.name.clone(),
        description: blueprint.description.clone().unwrap_or_default(),
        distribution: blueprint.distribution.clone(),
        ..WizardState::default()
    };

    for (idx, request) in blueprint.image_requests.iter().enumerate() {
        apply_image_request(&mut state, request, idx == 0)?;
    }

    apply_customizations(&mut state, &blueprint.customizations);
    Ok(state)
}

/// Wizard state for an imported document. Imports carry no image requests.
pub fn map_export_to_state(export: &BlueprintExport) -> Result<WizardState> {
    let mut state = WizardState {
        name: export.name.clone(),
        description: export.description.clone().unwrap_or_default(),
        distribution: export.distribution.clone().unwrap_or_default(),
        snapshot_date: export.snapshot_date.clone(),
        ..WizardState::default()
    };

    apply_customizations(&mut state, &export.customizations);
    Ok(state)
}

fn apply_image_request(state: &mut WizardState, request: &ImageRequest, first: bool) -> Result<()> {
    let image_type: ImageType = request.image_type.parse()?;

    if first {
        state.architecture = request.architecture.parse()?;
        state.snapshot_date = request.snapshot_date.clone();
    }
    if !state.image_types.contains(&image_type) {
        state.image_types.push(image_type);
    }

    match (image_type, &request.upload_request) {
        (ImageType::Aws | ImageType::Ami, UploadRequest::Aws(options)) => {
            apply_aws(state, options)
        }
        (ImageType::Azure | ImageType::Vhd, UploadRequest::Azure(options)) => {
            apply_azure(state, options);
            Ok(())
        }
        (ImageType::Gcp, UploadRequest::Gcp(options)) => apply_gcp(state, options),
        (ImageType::Oci, UploadRequest::OciObjectStorage(_)) => Ok(()),
        (
            ImageType::GuestImage
            | ImageType::ImageInstaller
            | ImageType::NetworkInstaller
            | ImageType::Vsphere
            | ImageType::VsphereOva
            | ImageType::Wsl,
            UploadRequest::AwsS3(_),
        ) => Ok(()),
        (image_type, _) => Err(Error::InvalidUploadOptions(format!(
            "upload request does not match image type '{}'",
            image_type
        ))),
    }
}

fn apply_aws(state: &mut WizardState, options: &AwsUploadRequestOptions) -> Result<()> {
    if let Some(source) = options.share_with_sources.as_ref().and_then(|s| s.first()) {
        state.aws.share_method = AwsShareMethod::Sources;
        state.aws.source_id = Some(source.clone());
        return Ok(());
    }
    match options.share_with_accounts.as_ref() {
        Some(accounts) if !accounts.is_empty() => {
            state.aws.share_method = AwsShareMethod::Manual;
            state.aws.account_ids = accounts.clone();
            Ok(())
        }
        _ => Err(Error::InvalidUploadOptions(
            "AWS upload shares with neither sources nor accounts".to_string(),
        )),
    }
}

fn apply_azure(state: &mut WizardState, options: &AzureUploadRequestOptions) {
    let azure = &mut state.azure;
    match options {
        AzureUploadRequestOptions::Source {
            source_id,
            resource_group,
            hyper_v_generation,
        } => {
            azure.share_method = AzureShareMethod::Sources;
            azure.source_id = Some(source_id.clone());
            azure.resource_group = Some(resource_group.clone());
            azure.hyper_v_generation = hyper_v_generation.clone();
        }
        AzureUploadRequestOptions::Tenant {
            tenant_id,
            subscription_id,
            resource_group,
            hyper_v_generation,
        } => {
            azure.share_method = AzureShareMethod::Manual;
            azure.tenant_id = Some(tenant_id.clone());
            azure.subscription_id = Some(subscription_id.clone());
            azure.resource_group = Some(resource_group.clone());
            azure.hyper_v_generation = hyper_v_generation.clone();
        }
    }
}

fn apply_gcp(state: &mut WizardState, options: &GcpUploadRequestOptions) -> Result<()> {
    let Some(principal) = options.share_with_accounts.as_ref().and_then(|a| a.first()) else {
        state.gcp.share_method = GcpShareMethod::WithInsights;
        return Ok(());
    };

    let (kind, account) = principal
        .split_once(':')
        .ok_or_else(|| invalid_gcp_principal(principal))?;
    let account_type =
        GcpAccountType::from_principal_kind(kind).ok_or_else(|| invalid_gcp_principal(principal))?;

    state.gcp.share_method = GcpShareMethod::WithGoogle;
    state.gcp.account_type = account_type;
    match account_type {
        GcpAccountType::Domain => state.gcp.domain = Some(account.to_string()),
        _ => state.gcp.email = Some(account.to_string()),
    }
    Ok(())
}

fn invalid_gcp_principal(principal: &str) -> Error {
    Error::InvalidUploadOptions(format!("invalid Google account '{}'", principal))
}

fn apply_customizations(state: &mut WizardState, customizations: &Customizations) {
    for package in customizations.packages.iter().flatten() {
        match package.strip_prefix('@') {
            Some(group) => state.package_groups.push(group.to_string()),
            None => state.packages.push(package.clone()),
        }
    }

    state.custom_repositories = customizations.custom_repositories.clone().unwrap_or_default();
    state.payload_repositories = customizations.payload_repositories.clone().unwrap_or_default();
    state.registration = map_registration(customizations.subscription.as_ref());

    state.file_system = match customizations.filesystem.as_ref() {
        Some(fs) if !fs.is_empty() => FileSystemConfig {
            mode: FileSystemMode::Manual,
            partitions: fs
                .iter()
                .map(|f| Partition::from_bytes(f.mountpoint.clone(), f.min_size))
                .collect(),
        },
        _ => FileSystemConfig::default(),
    };
    state.disk = customizations.disk.clone();
    state.partitioning_mode = customizations.partitioning_mode;

    let (script, files) = extract_first_boot(customizations.files.as_deref().unwrap_or_default());
    let has_first_boot = script.is_some();
    state.first_boot.script = script.unwrap_or_default();
    state.files = files;

    if let Some(services) = customizations.services.as_ref() {
        state.services = ServicesState {
            enabled: services
                .enabled
                .iter()
                .flatten()
                .filter(|s| !(has_first_boot && s.as_str() == FIRST_BOOT_SERVICE))
                .cloned()
                .collect(),
            disabled: services.disabled.clone().unwrap_or_default(),
            masked: services.masked.clone().unwrap_or_default(),
            extra: services.extra.clone(),
        };
    }

    state.compliance = customizations.openscap.as_ref().and_then(|scap| {
        let profile_id = scap.profile_id.as_deref().and_then(non_blank);
        let policy_id = scap.policy_id.as_deref().and_then(non_blank);
        if profile_id.is_none() && policy_id.is_none() {
            return None;
        }
        Some(ComplianceSelection {
            profile_id,
            profile_name: scap.profile_name.clone(),
            profile_description: scap.profile_description.clone(),
            policy_id,
            extra: scap.extra.clone(),
        })
    });

    state.users = customizations
        .users
        .iter()
        .flatten()
        .map(map_user_state)
        .collect();
    state.groups = customizations.groups.clone().unwrap_or_default();
    state.hostname = customizations.hostname.clone();

    if let Some(kernel) = customizations.kernel.as_ref() {
        state.kernel = KernelState {
            name: kernel.name.clone(),
            append: kernel
                .append
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            extra: kernel.extra.clone(),
        };
    }

    if let Some(firewall) = customizations.firewall.as_ref() {
        let services = firewall.services.clone().unwrap_or_default();
        state.firewall = FirewallState {
            ports: firewall.ports.clone().unwrap_or_default(),
            enabled_services: services.enabled.unwrap_or_default(),
            disabled_services: services.disabled.unwrap_or_default(),
            extra: firewall.extra.clone(),
        };
    }

    if let Some(timezone) = customizations.timezone.as_ref() {
        state.timezone = TimezoneState {
            timezone: timezone.timezone.clone(),
            ntp_servers: timezone.ntpservers.clone().unwrap_or_default(),
        };
    }

    if let Some(locale) = customizations.locale.as_ref() {
        state.locale = LocaleState {
            languages: locale.languages.clone().unwrap_or_default(),
            keyboard: locale.keyboard.clone(),
        };
    }

    state.fips = customizations.fips.map(|f| f.enabled).unwrap_or(false);
    state.containers = customizations.containers.clone().unwrap_or_default();
    state.installation_device = customizations.installation_device.clone();
    state.extra_customizations = customizations.extra.clone();
}

/// Inverse of the registration-mode table used on submit
fn map_registration(subscription: Option<&Subscription>) -> Registration {
    let Some(subscription) = subscription else {
        return Registration::default();
    };

    let mode = match (subscription.insights, subscription.rhc.unwrap_or(false)) {
        (_, true) => RegistrationMode::RegisterNowRhc,
        (true, false) => RegistrationMode::RegisterNowInsights,
        (false, false) => RegistrationMode::RegisterNow,
    };

    Registration {
        mode,
        activation_key: Some(subscription.activation_key.clone()),
    }
}

fn map_user_state(user: &User) -> UserState {
    let groups = user.groups.clone().unwrap_or_default();
    UserState {
        name: user.name.clone(),
        password: user.password.clone(),
        ssh_key: user.ssh_key.clone(),
        is_administrator: groups.iter().any(|g| g == ADMIN_GROUP),
        groups: groups.into_iter().filter(|g| g != ADMIN_GROUP).collect(),
        has_password: user.has_password.unwrap_or(user.password.is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::to_request::{map_request_from_state, SubmitContext};
    use crate::schema::state::Architecture;
    use blueprint_common::Unit;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(value: serde_json::Value) -> BlueprintResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_unknown_image_type_is_reported() {
        let blueprint = response(json!({
            "id": "bp-1",
            "name": "edge",
            "distribution": "rhel-9",
            "image_requests": [{
                "architecture": "x86_64",
                "image_type": "edge-commit",
                "upload_request": {"type": "aws.s3", "options": {}}
            }],
            "customizations": {}
        }));

        let err = map_request_to_state(&blueprint).unwrap_err();
        assert!(matches!(err, Error::UnknownImageType(t) if t == "edge-commit"));
    }

    #[test]
    fn test_targets_are_restored() {
        let blueprint = response(json!({
            "id": "bp-2",
            "name": "clouds",
            "distribution": "rhel-9",
            "image_requests": [
                {
                    "architecture": "aarch64",
                    "image_type": "aws",
                    "upload_request": {"type": "aws", "options": {"share_with_accounts": ["123456789012"]}},
                    "snapshot_date": "2024-05-01"
                },
                {
                    "architecture": "aarch64",
                    "image_type": "azure",
                    "upload_request": {"type": "azure", "options": {
                        "tenant_id": "t", "subscription_id": "s", "resource_group": "rg"
                    }}
                },
                {
                    "architecture": "aarch64",
                    "image_type": "gcp",
                    "upload_request": {"type": "gcp", "options": {"share_with_accounts": ["group:devs@example.com"]}}
                }
            ],
            "customizations": {}
        }));

        let state = map_request_to_state(&blueprint).unwrap();
        assert_eq!(state.architecture, Architecture::Aarch64);
        assert_eq!(
            state.image_types,
            vec![ImageType::Aws, ImageType::Azure, ImageType::Gcp]
        );
        assert_eq!(state.snapshot_date.as_deref(), Some("2024-05-01"));
        assert_eq!(state.aws.share_method, AwsShareMethod::Manual);
        assert_eq!(state.aws.account_ids, vec!["123456789012".to_string()]);
        assert_eq!(state.azure.share_method, AzureShareMethod::Manual);
        assert_eq!(state.azure.tenant_id.as_deref(), Some("t"));
        assert_eq!(state.gcp.share_method, GcpShareMethod::WithGoogle);
        assert_eq!(state.gcp.account_type, GcpAccountType::Group);
        assert_eq!(state.gcp.email.as_deref(), Some("devs@example.com"));
    }

    #[test]
    fn test_mismatched_upload_is_reported() {
        let blueprint = response(json!({
            "id": "bp-3",
            "name": "odd",
            "distribution": "rhel-9",
            "image_requests": [{
                "architecture": "x86_64",
                "image_type": "gcp",
                "upload_request": {"type": "aws.s3", "options": {}}
            }]
        }));
        assert!(matches!(
            map_request_to_state(&blueprint),
            Err(Error::InvalidUploadOptions(_))
        ));
    }

    #[test]
    fn test_malformed_gcp_principal() {
        let blueprint = response(json!({
            "id": "bp-4",
            "name": "gcp",
            "distribution": "rhel-9",
            "image_requests": [{
                "architecture": "x86_64",
                "image_type": "gcp",
                "upload_request": {"type": "gcp", "options": {"share_with_accounts": ["robot:a@b.com"]}}
            }]
        }));
        assert!(matches!(
            map_request_to_state(&blueprint),
            Err(Error::InvalidUploadOptions(_))
        ));
    }

    #[test]
    fn test_policy_only_compliance_survives_edit() {
        let blueprint = response(json!({
            "id": "bp-5",
            "name": "compliant",
            "distribution": "rhel-9",
            "image_requests": [{
                "architecture": "x86_64",
                "image_type": "guest-image",
                "upload_request": {"type": "aws.s3", "options": {}}
            }],
            "customizations": {
                "openscap": {
                    "policy_id": "0c3c1ea6-policy",
                    "datastream": "/usr/share/xml/scap/ssg/content/ssg-rhel9-ds.xml"
                },
                "kernel": {"append": "quiet", "cmdline_extra": true}
            }
        }));

        let state = map_request_to_state(&blueprint).unwrap();
        let compliance = state.compliance.as_ref().unwrap();
        assert_eq!(compliance.profile_id, None);
        assert_eq!(compliance.policy_id.as_deref(), Some("0c3c1ea6-policy"));

        let request = map_request_from_state(&state, &SubmitContext::default()).unwrap();
        let value = serde_json::to_value(&request.customizations).unwrap();
        assert_eq!(
            value["openscap"],
            json!({
                "policy_id": "0c3c1ea6-policy",
                "datastream": "/usr/share/xml/scap/ssg/content/ssg-rhel9-ds.xml"
            })
        );
        assert_eq!(value["kernel"], json!({"append": "quiet", "cmdline_extra": true}));
    }

    #[test]
    fn test_blank_profile_id_is_not_a_selection() {
        let blueprint = response(json!({
            "id": "bp-6",
            "name": "blank",
            "distribution": "rhel-9",
            "customizations": {"openscap": {"profile_id": ""}}
        }));
        assert_eq!(map_request_to_state(&blueprint).unwrap().compliance, None);
    }

    #[test]
    fn test_customizations_are_restored() {
        let export: BlueprintExport = serde_json::from_value(json!({
            "name": "restored",
            "distribution": "centos-9",
            "customizations": {
                "packages": ["vim", "@development-tools"],
                "filesystem": [{"mountpoint": "/var", "min_size": 1073741824u64}],
                "users": [{"name": "ops", "groups": ["wheel", "docker"], "hasPassword": true}],
                "kernel": {"append": "nosmt quiet"},
                "subscription": {
                    "organization": 1,
                    "activation_key": "ak",
                    "server-url": "subscription.rhsm.redhat.com",
                    "base-url": "https://cdn.redhat.com/",
                    "insights": true,
                    "rhc": false
                },
                "fips": {"enabled": true}
            }
        }))
        .unwrap();

        let state = map_export_to_state(&export).unwrap();
        assert_eq!(state.packages, vec!["vim".to_string()]);
        assert_eq!(state.package_groups, vec!["development-tools".to_string()]);
        assert_eq!(state.file_system.mode, FileSystemMode::Manual);
        assert_eq!(state.file_system.partitions[0].unit, Unit::GiB);
        assert!(state.users[0].is_administrator);
        assert!(state.users[0].has_password);
        assert_eq!(state.users[0].groups, vec!["docker".to_string()]);
        assert_eq!(state.kernel.append, vec!["nosmt".to_string(), "quiet".to_string()]);
        assert_eq!(state.registration.mode, RegistrationMode::RegisterNowInsights);
        assert!(state.image_types.is_empty());
        assert!(state.fips);
    }

    #[test]
    fn test_state_request_round_trip() {
        let mut state = WizardState {
            name: "round-trip".to_string(),
            distribution: "rhel-9".to_string(),
            image_types: vec![ImageType::Gcp],
            packages: vec!["tmux".to_string()],
            package_groups: vec!["core".to_string()],
            hostname: Some("host".to_string()),
            ..WizardState::default()
        };
        state.gcp.share_method = GcpShareMethod::WithGoogle;
        state.gcp.account_type = GcpAccountType::Service;
        state.gcp.email = Some("builder@project.iam.gserviceaccount.com".to_string());
        state.first_boot.script = "#!/bin/sh\necho first\n".to_string();
        state.services.enabled = vec!["sshd".to_string()];
        state.registration = Registration {
            mode: RegistrationMode::RegisterNowRhc,
            activation_key: Some("ak".to_string()),
        };

        let request = map_request_from_state(
            &state,
            &SubmitContext {
                organization_id: Some(42),
            },
        )
        .unwrap();
        let response = BlueprintResponse {
            id: "bp".to_string(),
            name: request.name.clone(),
            description: request.description.clone(),
            distribution: request.distribution.clone(),
            image_requests: request.image_requests.clone(),
            customizations: request.customizations.clone(),
            last_modified_at: None,
        };

        let restored = map_request_to_state(&response).unwrap();
        assert_eq!(restored.first_boot.script, state.first_boot.script);
        assert_eq!(restored.services.enabled, vec!["sshd".to_string()]);
        assert!(restored.files.is_empty());
        assert_eq!(restored.gcp, state.gcp);
        assert_eq!(restored.registration, state.registration);
        assert_eq!(restored.packages, state.packages);
        assert_eq!(restored.package_groups, state.package_groups);
        assert_eq!(restored.hostname, state.hostname);
    }
}
