//! Home-directory resolution and atomic directory creation.
//!
//! A thread-local override for tests, an environment variable for
//! operators, and a default relative to the current directory otherwise.

use std::cell::RefCell;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

const HOME_ENV_VAR: &str = "AUTOPLAN_HOME";
const DEFAULT_HOME_DIR: &str = ".autoplan";

/// Resolve the autoplan home directory.
///
/// Precedence: thread-local override (tests) > `AUTOPLAN_HOME` env var >
/// `.autoplan` relative to the current directory.
#[must_use]
pub fn autoplan_home() -> Utf8PathBuf {
    if let Some(path) = THREAD_HOME.with(|cell| cell.borrow().clone()) {
        return path;
    }
    if let Ok(value) = std::env::var(HOME_ENV_VAR) {
        if !value.is_empty() {
            return Utf8PathBuf::from(value);
        }
    }
    Utf8PathBuf::from(DEFAULT_HOME_DIR)
}

/// Directory holding one workflow's checkpoints, plan, and artifacts.
#[must_use]
pub fn workflow_root(workflow_id: &str) -> Utf8PathBuf {
    autoplan_home().join("workflows").join(workflow_id)
}

/// Shared cache directory (classifier embeddings, tech-stack scans).
#[must_use]
pub fn cache_dir() -> Utf8PathBuf {
    autoplan_home().join("cache")
}

/// Create a directory and all of its ancestors, tolerating an existing
/// directory (unlike a bare `create_dir_all` failure on some platforms).
pub fn ensure_dir_all(path: &Utf8Path) -> io::Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// RAII guard that points [`autoplan_home`] at a temporary directory for
/// the lifetime of a test, restoring the previous value on drop.
pub struct HomeGuard {
    _tempdir: tempfile::TempDir,
    previous: Option<Utf8PathBuf>,
}

impl HomeGuard {
    pub fn path(&self) -> Utf8PathBuf {
        autoplan_home()
    }
}

impl Drop for HomeGuard {
    fn drop(&mut self) {
        THREAD_HOME.with(|cell| {
            *cell.borrow_mut() = self.previous.take();
        });
    }
}

/// Isolate `autoplan_home()` to a fresh temporary directory, returning a
/// guard that restores the previous value when dropped. Intended for tests.
pub fn with_isolated_home() -> HomeGuard {
    let tempdir = tempfile::tempdir().expect("failed to create temp dir for isolated home");
    let path = Utf8PathBuf::from_path_buf(tempdir.path().to_path_buf())
        .expect("temp dir path is not valid UTF-8");
    let previous = THREAD_HOME.with(|cell| cell.borrow_mut().replace(path));
    HomeGuard {
        _tempdir: tempdir,
        previous,
    }
}
