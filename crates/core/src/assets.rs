//! Files cbtprobe reads and writes outside the working directory.
use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "cbtprobe";
pub const CONFIG_FILE: &str = "cbtprobe.yml";
const LOG_FILE: &str = "cbtprobe.log";
const LOG_BACKUP_FILE: &str = "cbtprobe.log.old";

/// Built-in configuration, also the base every config file is merged onto.
pub fn get_default_config() -> &'static str {
    include_str!("../data/config.yml")
}

// An empty XDG variable counts as unset.
fn app_dir(xdg_home: Option<OsString>, platform: Option<PathBuf>) -> Option<PathBuf> {
    xdg_home
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or(platform)
        .map(|base| base.join(APP_DIR))
}

/// Location of the optional `cbtprobe.yml`.
///
/// `XDG_CONFIG_HOME` wins over the platform config directory. `None` when
/// neither is known, in which case only the built-in defaults apply.
pub fn config_file_path() -> Option<PathBuf> {
    app_dir(std::env::var_os("XDG_CONFIG_HOME"), dirs::config_dir())
        .map(|dir| dir.join(CONFIG_FILE))
}

/// The run log and its single rotated backup.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPaths {
    pub current: PathBuf,
    pub backup: PathBuf,
}

impl LogPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            current: dir.join(LOG_FILE),
            backup: dir.join(LOG_BACKUP_FILE),
        }
    }

    /// Moves the log over the backup once it grows past `max_bytes`.
    ///
    /// Returns whether a rotation happened.
    pub fn rotate(&self, max_bytes: u64) -> io::Result<bool> {
        match fs::metadata(&self.current) {
            Ok(meta) if meta.len() > max_bytes => {}
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        }
        if self.backup.exists() {
            fs::remove_file(&self.backup)?;
        }
        fs::rename(&self.current, &self.backup)?;
        Ok(true)
    }
}

/// Log locations under the data directory, which is created on demand.
///
/// `XDG_DATA_HOME` wins over the platform local data directory.
pub fn log_paths() -> io::Result<LogPaths> {
    let dir = app_dir(std::env::var_os("XDG_DATA_HOME"), dirs::data_local_dir()).ok_or_else(
        || io::Error::new(io::ErrorKind::NotFound, "No data directory for this platform"),
    )?;
    fs::create_dir_all(&dir)?;
    Ok(LogPaths::in_dir(&dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_xdg_home_wins_over_platform_dir() {
        let dir = app_dir(
            Some(OsString::from("/xdg/config")),
            Some(PathBuf::from("/platform/config")),
        );
        assert_eq!(dir, Some(PathBuf::from("/xdg/config/cbtprobe")));
    }

    #[test]
    fn test_empty_xdg_home_falls_back() {
        let dir = app_dir(Some(OsString::new()), Some(PathBuf::from("/platform/data")));
        assert_eq!(dir, Some(PathBuf::from("/platform/data/cbtprobe")));
        assert_eq!(app_dir(None, None), None);
    }

    #[test]
    fn test_small_log_is_not_rotated() {
        let dir = tempdir().unwrap();
        let paths = LogPaths::in_dir(dir.path());
        assert!(!paths.rotate(10).unwrap());

        File::create(&paths.current)
            .unwrap()
            .write_all(b"short")
            .unwrap();
        assert!(!paths.rotate(10).unwrap());
        assert!(paths.current.exists());
        assert!(!paths.backup.exists());
    }

    #[test]
    fn test_large_log_replaces_backup() {
        let dir = tempdir().unwrap();
        let paths = LogPaths::in_dir(dir.path());
        fs::write(&paths.backup, "previous run").unwrap();
        fs::write(&paths.current, "x".repeat(32)).unwrap();

        assert!(paths.rotate(10).unwrap());
        assert!(!paths.current.exists());
        assert_eq!(fs::read_to_string(&paths.backup).unwrap(), "x".repeat(32));
    }

    #[test]
    fn test_get_default_config() {
        let config = get_default_config();
        assert!(config.contains("base_url:"));
        assert!(config.contains("admin:"));
        assert!(config.contains("student:"));
    }
}
