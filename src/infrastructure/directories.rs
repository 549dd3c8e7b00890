use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::config::{ChromeConfig, DirectoryConfig};

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    /// Profile handed to a browser we spawn ourselves. Keeping it under the
    /// data dir means the logged-in session survives between scans.
    pub browser_profile_dir: PathBuf,
}

pub fn ensure_directories(cfg: &DirectoryConfig, chrome: &ChromeConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&cfg.logs_dir)?;
    let data_dir = ensure_dir(&cfg.data_dir)?;
    let db_path = data_dir.join(&cfg.db_filename);

    let browser_profile_dir = match &chrome.profile_dir {
        Some(dir) => ensure_dir(dir)?,
        None => {
            let default = data_dir.join("browser-profile");
            ensure_dir(&default.to_string_lossy())?
        }
    };

    let probe_file = data_dir.join(".write-test");
    fs::write(&probe_file, b"ok")?;
    fs::remove_file(&probe_file)?;
    Ok(ResolvedPaths {
        logs_dir,
        data_dir,
        db_path,
        browser_profile_dir,
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {}", path))?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(&dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o755);
            let _ = fs::set_permissions(&dir, perms);
        }
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_browser_profile_under_data_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg = DirectoryConfig {
            logs_dir: tmp.path().join("logs").to_string_lossy().into_owned(),
            data_dir: tmp.path().join("data").to_string_lossy().into_owned(),
            db_filename: "allowlist.db".to_string(),
        };
        let chrome = ChromeConfig {
            executable: None,
            debug_port: 9222,
            profile_dir: None,
            ws_url: None,
            headless: false,
        };

        let paths = ensure_directories(&cfg, &chrome).expect("directories");
        assert!(paths.logs_dir.is_dir());
        assert!(paths.browser_profile_dir.is_dir());
        assert!(paths.browser_profile_dir.starts_with(&paths.data_dir));
        assert_eq!(paths.db_path.file_name().unwrap(), "allowlist.db");
    }
}
