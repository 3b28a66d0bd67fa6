//! Systemd unit rendering for reboot persistence.
//!
//! The unit keeps warden itself alive across reboots and crashes; warden in
//! turn keeps the service alive. `Restart=always` at the unit level covers
//! warden, the supervisor's restart policy covers the service.

use std::path::Path;

use tracing::info;

use crate::error::Result;

/// Default install location for the rendered unit.
pub const DEFAULT_UNIT_PATH: &str = "/etc/systemd/system/warden.service";

/// Render the unit file contents.
///
/// `binary` is the absolute path systemd should execute; `config` pins an
/// explicit config file, otherwise `~/.warden/config.json` of the unit's
/// user applies.
pub fn render_unit(binary: &Path, config: Option<&Path>) -> String {
    let exec_start = match config {
        Some(path) => format!("{} run --config {}", binary.display(), path.display()),
        None => format!("{} run", binary.display()),
    };

    format!(
        "[Unit]\n\
         Description=warden process supervisor\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={}\n\
         Restart=always\n\
         RestartSec=3\n\
         KillSignal=SIGTERM\n\
         TimeoutStopSec=30\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        exec_start
    )
}

/// Write the unit file, creating parent directories as needed.
pub fn install_unit(unit_path: &Path, binary: &Path, config: Option<&Path>) -> Result<()> {
    if let Some(parent) = unit_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(unit_path, render_unit(binary, config))?;
    info!(path = %unit_path.display(), "systemd unit written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_unit_basic() {
        let unit = render_unit(Path::new("/usr/local/bin/warden"), None);
        assert!(unit.contains("ExecStart=/usr/local/bin/warden run\n"));
        assert!(unit.contains("Restart=always"));
        assert!(unit.contains("WantedBy=multi-user.target"));
    }

    #[test]
    fn test_render_unit_with_config() {
        let unit = render_unit(
            Path::new("/usr/local/bin/warden"),
            Some(Path::new("/etc/warden/config.json")),
        );
        assert!(unit
            .contains("ExecStart=/usr/local/bin/warden run --config /etc/warden/config.json"));
    }

    #[test]
    fn test_install_unit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let unit_path = dir.path().join("system").join("warden.service");
        install_unit(&unit_path, Path::new("/usr/local/bin/warden"), None).unwrap();

        let written = std::fs::read_to_string(&unit_path).unwrap();
        assert!(written.contains("[Service]"));
        assert!(written.contains("Restart=always"));
    }

    #[test]
    fn test_default_unit_path() {
        assert_eq!(
            PathBuf::from(DEFAULT_UNIT_PATH).file_name().unwrap(),
            "warden.service"
        );
    }
}
