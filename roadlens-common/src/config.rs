//! Configuration loading and root folder resolution
//!
//! The root folder holds the shared roadlens database and any service
//! working files. Resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable consulted when no CLI argument is given
pub const ROOT_FOLDER_ENV: &str = "ROADLENS_ROOT_FOLDER";

/// File name of the shared SQLite database inside the root folder
pub const DATABASE_FILE: &str = "roadlens.db";

/// Resolve the root folder following the priority order above.
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = root_folder_from_config_file() {
        return path;
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Probe the platform config locations for a `root_folder` key.
fn root_folder_from_config_file() -> Option<PathBuf> {
    let config_path = find_config_file()?;
    let toml_content = std::fs::read_to_string(&config_path).ok()?;
    let config: toml::Value = toml::from_str(&toml_content).ok()?;
    config
        .get("root_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

/// Locate `config.toml`: user config dir first, then /etc on Linux.
fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("roadlens").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/roadlens/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/roadlens (or /var/lib/roadlens for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("roadlens"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/roadlens"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("roadlens"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/roadlens"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("roadlens"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\roadlens"))
    } else {
        PathBuf::from("./roadlens_data")
    }
}

/// Create the root folder if missing.
///
/// A root folder that cannot be created is a fatal pre-flight error: no
/// batch work may start without a reachable database location.
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    if root.exists() {
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "Root folder path exists but is not a directory: {}",
                root.display()
            )));
        }
        return Ok(());
    }
    std::fs::create_dir_all(root).map_err(|e| {
        Error::Config(format!(
            "Failed to create root folder {}: {}",
            root.display(),
            e
        ))
    })
}

/// Path of the shared database inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join(DATABASE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let root = resolve_root_folder(Some("/tmp/roadlens-cli"));
        assert_eq!(root, PathBuf::from("/tmp/roadlens-cli"));
    }

    #[test]
    fn default_is_nonempty() {
        // With no CLI argument and (typically) no env/config in test
        // environments, resolution must still land on a usable default.
        let root = resolve_root_folder(None);
        assert!(!root.as_os_str().is_empty());
    }

    #[test]
    fn database_path_appends_file_name() {
        let db = database_path(Path::new("/var/lib/roadlens"));
        assert_eq!(db, PathBuf::from("/var/lib/roadlens/roadlens.db"));
    }

    #[test]
    fn ensure_root_folder_rejects_file_path() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let err = ensure_root_folder(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn ensure_root_folder_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_root_folder(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
