//! Ephemeral per-request databases
//!
//! Every grading call gets its own SQLite file with a random name. The file
//! and any journal SQLite left beside it are removed when the
//! [`ScratchDatabase`] is dropped, whichever way the call ends.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::database::core::DatabaseConn;

/// Journal files SQLite may create next to a database
const SIDECAR_SUFFIXES: &[&str] = &["-journal", "-wal", "-shm"];

/// A uniquely named SQLite database deleted on drop
pub struct ScratchDatabase {
    // Field order matters: the connection closes before the file is unlinked
    db: DatabaseConn,
    file: ScratchFile,
}

impl ScratchDatabase {
    /// Create a fresh scratch database inside `dir`
    pub fn create_in(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| anyhow!("Failed to create scratch directory {:?}: {}", dir, e))?;

        let name = format!("sqlspell-{}.sqlite3", uuid::Uuid::new_v4().simple());
        let file = ScratchFile {
            path: dir.join(name),
        };
        let path_str = file
            .path
            .to_str()
            .ok_or_else(|| anyhow!("Scratch path {:?} is not valid UTF-8", file.path))?;

        let db = DatabaseConn::open_scratch(path_str)?;
        debug!("Provisioned scratch database {:?}", file.path);

        Ok(Self { db, file })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.file.path
    }

    /// The open connection
    pub fn conn(&self) -> &Connection {
        &self.db.conn
    }

    /// Interrupt any statement still running once `timeout` has elapsed
    ///
    /// The deadline holds for as long as the returned guard is alive.
    pub fn arm_deadline(&self, timeout: Duration) -> Result<DeadlineGuard> {
        let handle = self.conn().get_interrupt_handle();
        let (cancel, cancelled) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("sqlspell-deadline".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(timeout) {
                    debug!("Grading deadline of {:?} reached, interrupting", timeout);
                    handle.interrupt();
                }
            })
            .map_err(|e| anyhow!("Failed to start deadline watcher: {}", e))?;

        Ok(DeadlineGuard {
            cancel: Some(cancel),
            worker: Some(worker),
        })
    }
}

/// Path of a scratch database; removes the file and its sidecars on drop
struct ScratchFile {
    path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let mut targets = vec![self.path.clone()];
        for suffix in SIDECAR_SUFFIXES {
            let mut sidecar = self.path.clone().into_os_string();
            sidecar.push(suffix);
            targets.push(PathBuf::from(sidecar));
        }

        for target in targets {
            match std::fs::remove_file(&target) {
                Ok(()) => debug!("Removed scratch file {:?}", target),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {:?}: {}", target, e),
            }
        }
    }
}

/// Keeps a deadline armed; dropping it disarms the deadline
pub struct DeadlineGuard {
    cancel: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the watcher before its timeout
        drop(self.cancel.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
