//! On-prem to hosted translation
//!
//! Pure and total over any structurally valid on-prem blueprint. Absent source
//! fields stay absent in the output; "specified but empty" stays empty.

use crate::schema::hosted::{
    BlueprintExport, CustomRepository, Customizations, Filesystem, Fips, Locale, Metadata,
    Timezone, User,
};
use crate::schema::onprem::{OnPremBlueprint, OnPremCustomizations, OnPremRepository};

/// Translate an on-prem blueprint into a hosted export document.
///
/// The result is flagged with `metadata.is_on_prem = true`.
pub fn map_onprem_to_hosted(blueprint: &OnPremBlueprint) -> BlueprintExport {
    let empty = OnPremCustomizations::default();
    let source = blueprint.customizations.as_ref().unwrap_or(&empty);

    let mut customizations = Customizations {
        containers: blueprint.containers.clone(),
        packages: map_packages(blueprint, source),
        users: map_users(source),
        groups: source.group.clone(),
        custom_repositories: source
            .repositories
            .as_ref()
            .map(|repos| repos.iter().map(map_repository).collect()),
        filesystem: source.filesystem.as_ref().map(|fs| {
            fs.iter()
                .map(|f| Filesystem {
                    mountpoint: f.mountpoint.clone(),
                    min_size: f.minsize,
                })
                .collect()
        }),
        fips: source.fips.map(|enabled| Fips { enabled }),
        timezone: source.timezone.as_ref().map(|tz| Timezone {
            timezone: tz.timezone.clone(),
            ntpservers: tz.ntpservers.clone(),
        }),
        locale: source.locale.as_ref().map(|locale| Locale {
            languages: locale.languages.clone(),
            keyboard: locale.keyboard.clone(),
        }),
        ..Customizations::default()
    };

    // Identity fields
    customizations.hostname = source.hostname.clone();
    customizations.kernel = source.kernel.clone();
    customizations.services = source.services.clone();
    customizations.firewall = source.firewall.clone();
    customizations.openscap = source.openscap.clone();
    customizations.disk = source.disk.clone();
    customizations.partitioning_mode = source.partitioning_mode;
    customizations.files = source.files.clone();
    customizations.installation_device = source.installation_device.clone();
    customizations.extra = source.extra.clone();

    BlueprintExport {
        name: blueprint.name.clone(),
        description: blueprint.description.clone(),
        distribution: blueprint.distro.clone(),
        customizations,
        metadata: Some(Metadata {
            parent_id: None,
            exported_at: String::new(),
            is_on_prem: Some(true),
        }),
        content_sources: None,
        snapshot_date: None,
    }
}

/// Package names first, then `@`-prefixed package groups.
fn map_packages(blueprint: &OnPremBlueprint, source: &OnPremCustomizations) -> Option<Vec<String>> {
    let packages = blueprint
        .packages
        .as_ref()
        .map(|pkgs| pkgs.iter().map(|p| p.name.clone()).collect());
    let groups = source
        .groups
        .as_ref()
        .map(|groups| groups.iter().map(|g| format!("@{}", g.name)).collect());

    concat_present(packages, groups)
}

/// Users from `user` first, then the sparse `ssh_key` list.
fn map_users(source: &OnPremCustomizations) -> Option<Vec<User>> {
    let users = source.user.as_ref().map(|users| {
        users
            .iter()
            .map(|u| User {
                name: u.name.clone(),
                ssh_key: u.key.clone(),
                password: u.password.clone(),
                groups: u.groups.clone(),
                has_password: None,
            })
            .collect()
    });
    let keys = source.ssh_key.as_ref().map(|keys| {
        keys.iter()
            .map(|k| User {
                name: k.user.clone(),
                ssh_key: Some(k.key.clone()),
                ..User::default()
            })
            .collect()
    });

    concat_present(users, keys)
}

fn map_repository(repo: &OnPremRepository) -> CustomRepository {
    CustomRepository {
        id: repo.id.clone(),
        name: repo.name.clone(),
        filename: repo.filename.clone(),
        baseurl: repo.baseurls.clone(),
        mirrorlist: repo.mirrorlist.clone(),
        metalink: repo.metalink.clone(),
        enabled: repo.enabled,
        priority: repo.priority,
        module_hotfixes: repo.module_hotfixes,
        extra: repo.extra.clone(),
        ..CustomRepository::default()
    }
}

/// `None` only when both inputs are absent.
fn concat_present<T>(first: Option<Vec<T>>, second: Option<Vec<T>>) -> Option<Vec<T>> {
    match (first, second) {
        (None, None) => None,
        (first, second) => Some(
            first
                .unwrap_or_default()
                .into_iter()
                .chain(second.unwrap_or_default())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::onprem::{
        OnPremFilesystem, OnPremPackage, OnPremPackageGroup, OnPremSshKey, OnPremUser,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn blueprint(customizations: OnPremCustomizations) -> OnPremBlueprint {
        OnPremBlueprint {
            name: "test".to_string(),
            customizations: Some(customizations),
            ..OnPremBlueprint::default()
        }
    }

    #[test]
    fn test_absent_lists_stay_absent() {
        let mapped = map_onprem_to_hosted(&blueprint(OnPremCustomizations::default()));

        assert_eq!(mapped.customizations.users, None);
        assert_eq!(mapped.customizations.packages, None);
        assert_eq!(mapped.customizations.custom_repositories, None);
        assert_eq!(mapped.customizations.filesystem, None);
        assert_eq!(mapped.customizations.fips, None);
        assert_eq!(mapped.metadata.unwrap().is_on_prem, Some(true));
    }

    #[test]
    fn test_missing_customizations_block() {
        let mapped = map_onprem_to_hosted(&OnPremBlueprint {
            name: "bare".to_string(),
            ..OnPremBlueprint::default()
        });
        assert_eq!(mapped.customizations, Customizations::default());
    }

    #[test]
    fn test_users_then_ssh_keys() {
        let mapped = map_onprem_to_hosted(&blueprint(OnPremCustomizations {
            user: Some(vec![OnPremUser {
                name: "alice".to_string(),
                key: Some("ssh-ed25519 A".to_string()),
                ..OnPremUser::default()
            }]),
            ssh_key: Some(vec![OnPremSshKey {
                user: "bob".to_string(),
                key: "ssh-ed25519 B".to_string(),
            }]),
            ..OnPremCustomizations::default()
        }));

        let users = mapped.customizations.users.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(users[0].ssh_key.as_deref(), Some("ssh-ed25519 A"));
        assert_eq!(users[1].ssh_key.as_deref(), Some("ssh-ed25519 B"));
    }

    #[test]
    fn test_packages_then_groups() {
        let mut bp = blueprint(OnPremCustomizations {
            groups: Some(vec![OnPremPackageGroup {
                name: "development-tools".to_string(),
            }]),
            ..OnPremCustomizations::default()
        });
        bp.packages = Some(vec![OnPremPackage {
            name: "tmux".to_string(),
            version: None,
        }]);

        let mapped = map_onprem_to_hosted(&bp);
        assert_eq!(
            mapped.customizations.packages,
            Some(vec!["tmux".to_string(), "@development-tools".to_string()])
        );
    }

    #[test]
    fn test_only_groups_still_produces_packages() {
        let mapped = map_onprem_to_hosted(&blueprint(OnPremCustomizations {
            groups: Some(vec![OnPremPackageGroup {
                name: "core".to_string(),
            }]),
            ..OnPremCustomizations::default()
        }));
        assert_eq!(mapped.customizations.packages, Some(vec!["@core".to_string()]));
    }

    #[test]
    fn test_field_renames() {
        let mapped = map_onprem_to_hosted(&blueprint(OnPremCustomizations {
            filesystem: Some(vec![OnPremFilesystem {
                mountpoint: "/var".to_string(),
                minsize: 2_147_483_648,
            }]),
            repositories: Some(vec![OnPremRepository {
                id: "epel".to_string(),
                baseurls: Some(vec!["https://example.com/epel".to_string()]),
                ..OnPremRepository::default()
            }]),
            fips: Some(true),
            ..OnPremCustomizations::default()
        }));

        let value = serde_json::to_value(&mapped.customizations).unwrap();
        assert_eq!(value["filesystem"][0]["min_size"], json!(2_147_483_648u64));
        assert!(value["filesystem"][0].get("minsize").is_none());
        assert_eq!(value["custom_repositories"][0]["baseurl"][0], "https://example.com/epel");
        assert!(value["custom_repositories"][0].get("baseurls").is_none());
        assert_eq!(value["fips"], json!({"enabled": true}));
    }

    #[test]
    fn test_containers_move_under_customizations() {
        let bp: OnPremBlueprint = serde_json::from_value(json!({
            "name": "with-containers",
            "containers": [{"source": "quay.io/fedora/fedora:latest", "tls-verify": false}]
        }))
        .unwrap();

        let mapped = map_onprem_to_hosted(&bp);
        let containers = mapped.customizations.containers.unwrap();
        assert_eq!(containers[0].source, "quay.io/fedora/fedora:latest");
        assert_eq!(containers[0].tls_verify, Some(false));
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let bp: OnPremBlueprint = serde_json::from_value(json!({
            "name": "passthrough",
            "customizations": {
                "hostname": "edge-1",
                "directories": [{"path": "/srv/data"}],
                "repositories": [{"id": "r", "baseurls": ["https://r"], "gpgkeys": ["KEY"]}]
            }
        }))
        .unwrap();

        let mapped = map_onprem_to_hosted(&bp);
        assert_eq!(mapped.customizations.hostname.as_deref(), Some("edge-1"));
        assert_eq!(
            mapped.customizations.extra.get("directories"),
            Some(&json!([{"path": "/srv/data"}]))
        );
        let repo = &mapped.customizations.custom_repositories.unwrap()[0];
        assert_eq!(repo.extra.get("gpgkeys"), Some(&json!(["KEY"])));
    }

    #[test]
    fn test_timezone_and_locale_keep_only_known_keys() {
        let bp: OnPremBlueprint = serde_json::from_value(json!({
            "name": "regional",
            "customizations": {
                "timezone": {"timezone": "Europe/Prague", "ntpservers": ["pool.ntp.org"], "utc": true},
                "locale": {"languages": ["cs_CZ.UTF-8"], "keyboard": "cz", "fallback": "en_US"}
            }
        }))
        .unwrap();

        let value = serde_json::to_value(map_onprem_to_hosted(&bp).customizations).unwrap();
        assert_eq!(
            value["timezone"],
            json!({"timezone": "Europe/Prague", "ntpservers": ["pool.ntp.org"]})
        );
        assert_eq!(
            value["locale"],
            json!({"languages": ["cs_CZ.UTF-8"], "keyboard": "cz"})
        );
    }

    #[test]
    fn test_identity_blocks_keep_undeclared_keys() {
        let bp: OnPremBlueprint = toml::from_str(
            r#"
name = "hardened"

[customizations]
hostname = "scap-1"

[customizations.openscap]
datastream = "/usr/share/xml/scap/ssg/content/ssg-rhel9-ds.xml"
profile_id = "cis"

[customizations.openscap.tailoring]
selected = ["xccdf_org.ssgproject.content_rule_grub2_password"]

[customizations.disk]
minsize = 10737418240

[customizations.services]
enabled = ["sshd"]
"#,
        )
        .unwrap();

        let value = serde_json::to_value(map_onprem_to_hosted(&bp).customizations).unwrap();
        assert_eq!(
            value["openscap"],
            json!({
                "profile_id": "cis",
                "datastream": "/usr/share/xml/scap/ssg/content/ssg-rhel9-ds.xml",
                "tailoring": {"selected": ["xccdf_org.ssgproject.content_rule_grub2_password"]}
            })
        );
        assert_eq!(value["disk"]["minsize"], json!(10_737_418_240u64));
        assert_eq!(value["services"], json!({"enabled": ["sshd"]}));
    }
}
