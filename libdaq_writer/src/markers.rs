//! Host-visible run markers: the pid file written at startup and the
//! finished marker written at teardown. Both are advisory for the test
//! harness; failure to create either is logged and ignored.

use std::path::{Path, PathBuf};

/// Write the pid file advertising this writer to the surrounding harness.
pub fn write_pid_file(path: &Path, group: &str, id: i32) {
    let host = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| String::from("--unknown--"));
    let line = format!(
        "group={} idx={} hostname={} pid={}\n",
        group,
        id,
        host,
        std::process::id()
    );
    if let Err(e) = std::fs::write(path, line) {
        spdlog::error!("Could not create pid file {:?}: {}", path, e);
    }
}

/// Drop guard whose destructor records that the writer is done with the
/// run. Held as the last field of the writer so every HDF5 handle is
/// closed before the marker appears. A run that aborts hard (or hangs on
/// the debug flag) leaves no marker, which is what signals an incomplete
/// run to the harness.
#[derive(Debug)]
pub struct FinishedMarker {
    path: PathBuf,
}

impl FinishedMarker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for FinishedMarker {
    fn drop(&mut self) {
        if let Err(e) = std::fs::write(&self.path, "done.\n") {
            spdlog::error!("Could not create finished file {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pid_file_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daq-s0003.pid");
        write_pid_file(&path, "daq", 3);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("group=daq idx=3 hostname="));
        assert!(contents.contains(&format!(" pid={}\n", std::process::id())));
    }

    #[test]
    fn test_finished_marker_written_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daq-s0003.finished");
        let marker = FinishedMarker::new(path.clone());
        assert!(!path.exists());
        drop(marker);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "done.\n");
    }
}
