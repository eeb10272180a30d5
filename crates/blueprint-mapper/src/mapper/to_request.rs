//! Wizard state to hosted request (submit path)

use blueprint_common::{Error, Result};
use std::collections::HashSet;
use std::hash::Hash;
use tracing::debug;

use crate::mapper::first_boot::{first_boot_files, FIRST_BOOT_SERVICE};
use crate::schema::hosted::{
    AwsUploadRequestOptions, AzureUploadRequestOptions, CreateBlueprintRequest, Customizations,
    EmptyOptions, Filesystem, Firewall, FirewallServices, Fips, GcpUploadRequestOptions,
    ImageRequest, Kernel, Locale, OpenScap, Services, Subscription, Timezone, UploadRequest, User,
};
use crate::schema::state::{
    AwsShareMethod, AzureShareMethod, FileSystemMode, GcpAccountType, GcpShareMethod, ImageType,
    Registration, RegistrationMode, UserState, WizardState,
};
use crate::validation;

pub const RHSM_SERVER_URL: &str = "subscription.rhsm.redhat.com";
pub const RHSM_BASE_URL: &str = "https://cdn.redhat.com/";

/// Group granting administrator rights
pub const ADMIN_GROUP: &str = "wheel";

/// Values fetched outside the wizard that the request depends on
#[derive(Debug, Clone, Default)]
pub struct SubmitContext {
    /// Organization the activation key belongs to
    pub organization_id: Option<u64>,
}

/// Build the create/update request for `state`.
///
/// Fails before producing anything when registration was requested without
/// an activation key or organization, when a selected target lacks the
/// options its upload needs, or when the customizations violate an invariant.
pub fn map_request_from_state(
    state: &WizardState,
    context: &SubmitContext,
) -> Result<CreateBlueprintRequest> {
    let subscription = map_subscription(&state.registration, context.organization_id)?;

    if state.name.trim().is_empty() {
        return Err(Error::Validation("blueprint name is required".to_string()));
    }
    if state.distribution.trim().is_empty() {
        return Err(Error::Validation("distribution is required".to_string()));
    }
    if state.image_types.is_empty() {
        return Err(Error::Validation(
            "at least one image type must be selected".to_string(),
        ));
    }

    let image_requests = dedup(state.image_types.iter().copied())
        .into_iter()
        .map(|image_type| map_image_request(state, image_type))
        .collect::<Result<Vec<_>>>()?;

    let mut customizations = map_customizations_from_state(state);
    customizations.subscription = subscription;
    validation::validate(&customizations)?;

    debug!(
        "Built request for blueprint '{}' with {} image request(s)",
        state.name,
        image_requests.len()
    );

    Ok(CreateBlueprintRequest {
        name: state.name.clone(),
        description: non_blank(&state.description),
        distribution: state.distribution.clone(),
        image_requests,
        customizations,
    })
}

/// Map every customization the state carries, except the subscription
pub fn map_customizations_from_state(state: &WizardState) -> Customizations {
    let packages = dedup(
        state
            .packages
            .iter()
            .cloned()
            .chain(state.package_groups.iter().map(|g| format!("@{}", g))),
    );

    let mut custom_repositories = Vec::new();
    let mut seen_ids = HashSet::new();
    for repo in &state.custom_repositories {
        if seen_ids.insert(repo.id.as_str()) {
            custom_repositories.push(repo.clone());
        }
    }

    let filesystem = match state.file_system.mode {
        FileSystemMode::Manual => non_empty(
            state
                .file_system
                .partitions
                .iter()
                .map(|p| Filesystem {
                    mountpoint: p.mountpoint.clone(),
                    min_size: p.min_size,
                })
                .collect(),
        ),
        FileSystemMode::Automatic => None,
    };

    let has_first_boot = !state.first_boot.script.trim().is_empty();
    let mut files = state.files.clone();
    files.extend(first_boot_files(&state.first_boot.script));

    let mut enabled_services = state.services.enabled.clone();
    if has_first_boot {
        enabled_services.push(FIRST_BOOT_SERVICE.to_string());
    }
    let services = Services {
        enabled: non_empty(dedup(enabled_services)),
        disabled: non_empty(state.services.disabled.clone()),
        masked: non_empty(state.services.masked.clone()),
        extra: state.services.extra.clone(),
    };

    let kernel = Kernel {
        name: state.kernel.name.as_deref().and_then(non_blank),
        append: non_blank(&state.kernel.append.join(" ")),
        extra: state.kernel.extra.clone(),
    };

    let firewall_services = FirewallServices {
        enabled: non_empty(state.firewall.enabled_services.clone()),
        disabled: non_empty(state.firewall.disabled_services.clone()),
    };
    let firewall = Firewall {
        ports: non_empty(state.firewall.ports.clone()),
        services: (firewall_services != FirewallServices::default()).then_some(firewall_services),
        extra: state.firewall.extra.clone(),
    };

    let timezone = Timezone {
        timezone: state.timezone.timezone.as_deref().and_then(non_blank),
        ntpservers: non_empty(state.timezone.ntp_servers.clone()),
    };
    let locale = Locale {
        languages: non_empty(state.locale.languages.clone()),
        keyboard: state.locale.keyboard.as_deref().and_then(non_blank),
    };

    Customizations {
        containers: non_empty(state.containers.clone()),
        files: non_empty(files),
        subscription: None,
        packages: non_empty(packages),
        payload_repositories: non_empty(state.payload_repositories.clone()),
        custom_repositories: non_empty(custom_repositories),
        openscap: state.compliance.as_ref().map(|c| OpenScap {
            profile_id: c.profile_id.as_deref().and_then(non_blank),
            profile_name: c.profile_name.clone(),
            profile_description: c.profile_description.clone(),
            policy_id: c.policy_id.as_deref().and_then(non_blank),
            extra: c.extra.clone(),
        }),
        filesystem,
        disk: state.disk.clone(),
        partitioning_mode: state.partitioning_mode,
        users: non_empty(state.users.iter().map(map_user).collect()),
        groups: non_empty(state.groups.clone()),
        services: (services != Services::default()).then_some(services),
        hostname: state.hostname.as_deref().and_then(non_blank),
        kernel: (kernel != Kernel::default()).then_some(kernel),
        locale: (locale != Locale::default()).then_some(locale),
        timezone: (timezone != Timezone::default()).then_some(timezone),
        firewall: (firewall != Firewall::default()).then_some(firewall),
        fips: state.fips.then_some(Fips { enabled: true }),
        installation_device: state.installation_device.as_deref().and_then(non_blank),
        extra: state.extra_customizations.clone(),
    }
}

/// Derive the subscription block from the registration step.
pub fn map_subscription(
    registration: &Registration,
    organization_id: Option<u64>,
) -> Result<Option<Subscription>> {
    let (insights, rhc) = match registration.mode {
        RegistrationMode::RegisterLater => return Ok(None),
        RegistrationMode::RegisterNow => (false, false),
        RegistrationMode::RegisterNowInsights => (true, false),
        RegistrationMode::RegisterNowRhc => (true, true),
    };

    let activation_key = registration
        .activation_key
        .as_deref()
        .and_then(non_blank)
        .ok_or_else(|| {
            Error::SubscriptionPrecondition(
                "registration was requested but no activation key is selected".to_string(),
            )
        })?;
    let organization = organization_id.ok_or_else(|| {
        Error::SubscriptionPrecondition("organization id is not available".to_string())
    })?;

    Ok(Some(Subscription {
        organization,
        activation_key,
        server_url: RHSM_SERVER_URL.to_string(),
        base_url: RHSM_BASE_URL.to_string(),
        insights,
        rhc: Some(rhc),
    }))
}

fn map_image_request(state: &WizardState, image_type: ImageType) -> Result<ImageRequest> {
    Ok(ImageRequest {
        architecture: state.architecture.as_str().to_string(),
        image_type: image_type.as_str().to_string(),
        upload_request: map_upload_request(state, image_type)?,
        snapshot_date: state.snapshot_date.clone(),
    })
}

/// Target-specific upload options for one image type
pub fn map_upload_request(state: &WizardState, image_type: ImageType) -> Result<UploadRequest> {
    let request = match image_type {
        ImageType::Aws | ImageType::Ami => UploadRequest::Aws(aws_options(state)?),
        ImageType::Azure | ImageType::Vhd => UploadRequest::Azure(azure_options(state)?),
        ImageType::Gcp => UploadRequest::Gcp(gcp_options(state)?),
        ImageType::Oci => UploadRequest::OciObjectStorage(EmptyOptions {}),
        ImageType::GuestImage
        | ImageType::ImageInstaller
        | ImageType::NetworkInstaller
        | ImageType::Vsphere
        | ImageType::VsphereOva
        | ImageType::Wsl => UploadRequest::AwsS3(EmptyOptions {}),
    };
    Ok(request)
}

fn aws_options(state: &WizardState) -> Result<AwsUploadRequestOptions> {
    let aws = &state.aws;
    match aws.share_method {
        AwsShareMethod::Sources => Ok(AwsUploadRequestOptions {
            share_with_accounts: None,
            share_with_sources: Some(vec![required(&aws.source_id, "AWS source")?]),
        }),
        AwsShareMethod::Manual => {
            let accounts: Vec<String> = aws
                .account_ids
                .iter()
                .filter_map(|id| non_blank(id))
                .collect();
            if accounts.is_empty() {
                return Err(Error::InvalidUploadOptions(
                    "AWS account id is required".to_string(),
                ));
            }
            Ok(AwsUploadRequestOptions {
                share_with_accounts: Some(accounts),
                share_with_sources: None,
            })
        }
    }
}

fn azure_options(state: &WizardState) -> Result<AzureUploadRequestOptions> {
    let azure = &state.azure;
    let resource_group = required(&azure.resource_group, "Azure resource group")?;
    match azure.share_method {
        AzureShareMethod::Sources => Ok(AzureUploadRequestOptions::Source {
            source_id: required(&azure.source_id, "Azure source")?,
            resource_group,
            hyper_v_generation: azure.hyper_v_generation.clone(),
        }),
        AzureShareMethod::Manual => Ok(AzureUploadRequestOptions::Tenant {
            tenant_id: required(&azure.tenant_id, "Azure tenant id")?,
            subscription_id: required(&azure.subscription_id, "Azure subscription id")?,
            resource_group,
            hyper_v_generation: azure.hyper_v_generation.clone(),
        }),
    }
}

fn gcp_options(state: &WizardState) -> Result<GcpUploadRequestOptions> {
    let gcp = &state.gcp;
    match gcp.share_method {
        GcpShareMethod::WithInsights => Ok(GcpUploadRequestOptions::default()),
        GcpShareMethod::WithGoogle => {
            let principal = match gcp.account_type {
                GcpAccountType::Domain => required(&gcp.domain, "Google domain")?,
                _ => required(&gcp.email, "Google account email")?,
            };
            Ok(GcpUploadRequestOptions {
                share_with_accounts: Some(vec![format!(
                    "{}:{}",
                    gcp.account_type.principal_kind(),
                    principal
                )]),
            })
        }
    }
}

fn map_user(user: &UserState) -> User {
    let groups = dedup(
        user.is_administrator
            .then(|| ADMIN_GROUP.to_string())
            .into_iter()
            .chain(user.groups.iter().cloned()),
    );

    User {
        name: user.name.clone(),
        ssh_key: user.ssh_key.as_deref().and_then(non_blank),
        password: user.password.as_deref().and_then(non_blank),
        groups: non_empty(groups),
        has_password: None,
    }
}

fn required(value: &Option<String>, what: &str) -> Result<String> {
    value
        .as_deref()
        .and_then(non_blank)
        .ok_or_else(|| Error::InvalidUploadOptions(format!("{} is required", what)))
}

pub(crate) fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Keep the first occurrence of each item, preserving order
fn dedup<T: Clone + Eq + Hash>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::state::{ComplianceSelection, Partition};
    use blueprint_common::Unit;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base_state() -> WizardState {
        WizardState {
            name: "web-server".to_string(),
            distribution: "rhel-9".to_string(),
            image_types: vec![ImageType::GuestImage],
            ..WizardState::default()
        }
    }

    fn upload_json(state: &WizardState, image_type: ImageType) -> serde_json::Value {
        serde_json::to_value(map_upload_request(state, image_type).unwrap()).unwrap()
    }

    #[test]
    fn test_gcp_service_account() {
        let mut state = base_state();
        state.gcp.share_method = GcpShareMethod::WithGoogle;
        state.gcp.account_type = GcpAccountType::Service;
        state.gcp.email = Some("a@b.com".to_string());

        assert_eq!(
            upload_json(&state, ImageType::Gcp)["options"],
            json!({"share_with_accounts": ["serviceAccount:a@b.com"]})
        );
    }

    #[test]
    fn test_gcp_domain_and_insights() {
        let mut state = base_state();
        state.gcp.share_method = GcpShareMethod::WithGoogle;
        state.gcp.account_type = GcpAccountType::Domain;
        state.gcp.domain = Some("example.com".to_string());
        assert_eq!(
            upload_json(&state, ImageType::Gcp)["options"],
            json!({"share_with_accounts": ["domain:example.com"]})
        );

        state.gcp.share_method = GcpShareMethod::WithInsights;
        assert_eq!(upload_json(&state, ImageType::Gcp)["options"], json!({}));
    }

    #[test]
    fn test_aws_sources_xor_accounts() {
        let mut state = base_state();
        state.aws.source_id = Some("123".to_string());
        assert_eq!(
            upload_json(&state, ImageType::Aws),
            json!({"type": "aws", "options": {"share_with_sources": ["123"]}})
        );

        state.aws.share_method = AwsShareMethod::Manual;
        state.aws.account_ids = vec!["123456789012".to_string()];
        assert_eq!(
            upload_json(&state, ImageType::Aws),
            json!({"type": "aws", "options": {"share_with_accounts": ["123456789012"]}})
        );
    }

    #[test]
    fn test_aws_missing_source_fails() {
        let state = base_state();
        let err = map_upload_request(&state, ImageType::Aws).unwrap_err();
        assert!(matches!(err, Error::InvalidUploadOptions(_)));
    }

    #[test]
    fn test_azure_shapes() {
        let mut state = base_state();
        state.azure.source_id = Some("7".to_string());
        state.azure.resource_group = Some("images".to_string());
        assert_eq!(
            upload_json(&state, ImageType::Azure)["options"],
            json!({"source_id": "7", "resource_group": "images"})
        );

        state.azure.share_method = AzureShareMethod::Manual;
        state.azure.tenant_id = Some("tenant".to_string());
        state.azure.subscription_id = Some("sub".to_string());
        assert_eq!(
            upload_json(&state, ImageType::Azure)["options"],
            json!({"tenant_id": "tenant", "subscription_id": "sub", "resource_group": "images"})
        );
    }

    #[test]
    fn test_other_targets_upload_to_s3() {
        let state = base_state();
        assert_eq!(
            upload_json(&state, ImageType::Vsphere),
            json!({"type": "aws.s3", "options": {}})
        );
        assert_eq!(
            upload_json(&state, ImageType::Oci),
            json!({"type": "oci.objectstorage", "options": {}})
        );
    }

    #[test]
    fn test_register_now_without_key_fails() {
        let mut state = base_state();
        state.registration.mode = RegistrationMode::RegisterNow;

        let err = map_request_from_state(
            &state,
            &SubmitContext {
                organization_id: Some(5),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::SubscriptionPrecondition(_)));
    }

    #[test]
    fn test_subscription_modes() {
        let context_org = Some(13);
        let cases = [
            (RegistrationMode::RegisterNow, false, false),
            (RegistrationMode::RegisterNowInsights, true, false),
            (RegistrationMode::RegisterNowRhc, true, true),
        ];

        for (mode, insights, rhc) in cases {
            let registration = Registration {
                mode,
                activation_key: Some("key".to_string()),
            };
            let subscription = map_subscription(&registration, context_org).unwrap().unwrap();
            assert_eq!(subscription.insights, insights);
            assert_eq!(subscription.rhc, Some(rhc));
            assert_eq!(subscription.organization, 13);
        }

        let later = Registration::default();
        assert_eq!(map_subscription(&later, None).unwrap(), None);
    }

    #[test]
    fn test_missing_organization_fails() {
        let registration = Registration {
            mode: RegistrationMode::RegisterNowRhc,
            activation_key: Some("key".to_string()),
        };
        let err = map_subscription(&registration, None).unwrap_err();
        assert!(matches!(err, Error::SubscriptionPrecondition(_)));
    }

    #[test]
    fn test_packages_and_groups_are_merged() {
        let mut state = base_state();
        state.packages = vec!["vim".to_string(), "git".to_string(), "vim".to_string()];
        state.package_groups = vec!["core".to_string()];

        let customizations = map_customizations_from_state(&state);
        assert_eq!(
            customizations.packages,
            Some(vec!["vim".to_string(), "git".to_string(), "@core".to_string()])
        );
    }

    #[test]
    fn test_admin_user_joins_wheel() {
        let mut state = base_state();
        state.users = vec![UserState {
            name: "ops".to_string(),
            password: Some("".to_string()),
            ssh_key: Some("ssh-ed25519 KEY".to_string()),
            groups: vec!["docker".to_string(), "wheel".to_string()],
            is_administrator: true,
            has_password: false,
        }];

        let users = map_customizations_from_state(&state).users.unwrap();
        assert_eq!(
            users[0].groups,
            Some(vec!["wheel".to_string(), "docker".to_string()])
        );
        assert_eq!(users[0].password, None);
    }

    #[test]
    fn test_manual_partitions_in_bytes() {
        let mut state = base_state();
        state.file_system.partitions = vec![Partition::new("/var", 2.0, Unit::GiB)];
        assert_eq!(map_customizations_from_state(&state).filesystem, None);

        state.file_system.mode = FileSystemMode::Manual;
        assert_eq!(
            map_customizations_from_state(&state).filesystem,
            Some(vec![Filesystem {
                mountpoint: "/var".to_string(),
                min_size: 2_147_483_648,
            }])
        );
    }

    #[test]
    fn test_first_boot_enables_service() {
        let mut state = base_state();
        state.first_boot.script = "#!/bin/sh\ntrue\n".to_string();

        let customizations = map_customizations_from_state(&state);
        assert_eq!(customizations.files.unwrap().len(), 2);
        assert_eq!(
            customizations.services.unwrap().enabled,
            Some(vec![FIRST_BOOT_SERVICE.to_string()])
        );
    }

    #[test]
    fn test_full_request() {
        let mut state = base_state();
        state.image_types = vec![ImageType::GuestImage, ImageType::Gcp, ImageType::GuestImage];
        state.snapshot_date = Some("2024-06-01".to_string());
        state.compliance = Some(ComplianceSelection {
            profile_id: Some("xccdf_org.ssgproject.content_profile_cis".to_string()),
            ..Default::default()
        });
        state.fips = true;

        let request = map_request_from_state(&state, &SubmitContext::default()).unwrap();
        assert_eq!(request.image_requests.len(), 2);
        assert_eq!(request.image_requests[0].image_type, "guest-image");
        assert_eq!(request.image_requests[1].image_type, "gcp");
        assert_eq!(
            request.image_requests[0].snapshot_date.as_deref(),
            Some("2024-06-01")
        );
        assert_eq!(request.description, None);
        assert_eq!(request.customizations.subscription, None);

        let value = serde_json::to_value(&request.customizations).unwrap();
        assert_eq!(
            value,
            json!({
                "openscap": {"profile_id": "xccdf_org.ssgproject.content_profile_cis"},
                "fips": {"enabled": true}
            })
        );
    }

    #[test]
    fn test_request_requires_image_type() {
        let mut state = base_state();
        state.image_types.clear();
        let err = map_request_from_state(&state, &SubmitContext::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
