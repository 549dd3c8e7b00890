use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    process,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

const LOCK_FILENAME: &str = ".hateblock.lock";

/// One scan per data directory. Two scans sharing a browser profile would
/// fight over the same tab and the same devtools port.
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

impl InstanceGuard {
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        let lock_path = data_dir.join(LOCK_FILENAME);
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to ensure data dir {}", data_dir.display()))?;

        for attempt in 0..2 {
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .open(&lock_path)
                .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    write_lock_info(&mut file, process::id())?;
                    tracing::info!(
                        target: "lifecycle",
                        pid = process::id(),
                        path = %lock_path.display(),
                        "acquired scan lock"
                    );
                    return Ok(Self {
                        file,
                        path: lock_path,
                    });
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    reject_or_clear_stale(&lock_path)?;
                    if attempt == 0 {
                        continue;
                    }
                    return Err(anyhow!(
                        "could not acquire scan lock at {}",
                        lock_path.display()
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }
        unreachable!("lock acquisition loop always returns")
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    target: "lifecycle",
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove lock file on shutdown"
                );
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    started_at: i64,
}

fn write_lock_info(file: &mut File, pid: u32) -> Result<()> {
    let info = LockInfo {
        pid,
        started_at: Utc::now().timestamp_millis(),
    };
    let payload = serde_json::to_vec(&info)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&payload)?;
    file.sync_all()?;
    Ok(())
}

/// Bail out when the holder is alive; clear the file when it is stale so the
/// caller can retry once.
fn reject_or_clear_stale(lock_path: &Path) -> Result<()> {
    match read_lock_info(lock_path)? {
        Some(info) if info.pid == process::id() => Err(anyhow!(
            "a scan is already running in this process (pid {})",
            info.pid
        )),
        Some(info) if is_process_alive(info.pid) => Err(anyhow!(
            "another scan is already running (pid {})",
            info.pid
        )),
        Some(info) => {
            tracing::warn!(
                target: "lifecycle",
                pid = info.pid,
                "clearing stale scan lock left by a dead process"
            );
            let _ = fs::remove_file(lock_path);
            Ok(())
        }
        None => {
            let _ = fs::remove_file(lock_path);
            Ok(())
        }
    }
}

fn read_lock_info(lock_path: &Path) -> Result<Option<LockInfo>> {
    match fs::read_to_string(lock_path) {
        Ok(contents) => {
            if contents.trim().is_empty() {
                return Ok(None);
            }
            match serde_json::from_str(&contents) {
                Ok(info) => Ok(Some(info)),
                Err(err) => {
                    tracing::warn!(
                        target: "lifecycle",
                        path = %lock_path.display(),
                        error = %err,
                        "failed to parse lock file metadata"
                    );
                    Ok(None)
                }
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn is_process_alive(pid: u32) -> bool {
    let sys_pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_process(sys_pid);
    system.process(sys_pid).is_some()
}
