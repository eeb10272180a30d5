//! First-boot script encoding
//!
//! The wizard holds the script as text. On the wire it becomes an executable
//! file plus a oneshot systemd unit, and the unit is enabled as a service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::schema::hosted::File;

pub const FIRST_BOOT_SERVICE: &str = "custom-first-boot";
pub const FIRST_BOOT_SERVICE_PATH: &str = "/etc/systemd/system/custom-first-boot.service";
pub const FIRST_BOOT_SCRIPT_PATH: &str = "/usr/local/sbin/custom-first-boot";

const FIRST_BOOT_UNIT: &str = "[Unit]
Description=Custom first boot script
ConditionFileIsExecutable=/usr/local/sbin/custom-first-boot
ConditionPathExists=!/var/local/.custom-first-boot-done
Wants=network-online.target
After=network-online.target
After=osbuild-first-boot.service

[Service]
Type=oneshot
ExecStart=/usr/local/sbin/custom-first-boot
ExecStartPost=/usr/bin/touch /var/local/.custom-first-boot-done
RemainAfterExit=yes

[Install]
WantedBy=basic.target
";

/// Files carrying `script`, or nothing for a blank script
pub fn first_boot_files(script: &str) -> Vec<File> {
    if script.trim().is_empty() {
        return Vec::new();
    }

    vec![
        File {
            path: FIRST_BOOT_SERVICE_PATH.to_string(),
            data: Some(STANDARD.encode(FIRST_BOOT_UNIT)),
            data_encoding: Some("base64".to_string()),
            mode: None,
            user: None,
            group: None,
            ensure_parents: Some(true),
        },
        File {
            path: FIRST_BOOT_SCRIPT_PATH.to_string(),
            data: Some(STANDARD.encode(script)),
            data_encoding: Some("base64".to_string()),
            mode: Some("0774".to_string()),
            user: None,
            group: None,
            ensure_parents: Some(true),
        },
    ]
}

/// Split `files` into the first-boot script and everything else.
///
/// The unit file is dropped since it is regenerated on submit. A script whose
/// payload cannot be decoded is kept as an ordinary file.
pub fn extract_first_boot(files: &[File]) -> (Option<String>, Vec<File>) {
    let mut script = None;
    let mut rest = Vec::new();

    for file in files {
        match file.path.as_str() {
            FIRST_BOOT_SERVICE_PATH => {}
            FIRST_BOOT_SCRIPT_PATH => match decode(file) {
                Some(body) => script = Some(body),
                None => {
                    warn!("First boot script could not be decoded, keeping it as a file");
                    rest.push(file.clone());
                }
            },
            _ => rest.push(file.clone()),
        }
    }

    (script, rest)
}

fn decode(file: &File) -> Option<String> {
    let data = file.data.as_deref().unwrap_or_default();
    match file.data_encoding.as_deref() {
        Some("base64") => {
            let bytes = STANDARD.decode(data).ok()?;
            String::from_utf8(bytes).ok()
        }
        _ => Some(data.to_string()),
    }
}
