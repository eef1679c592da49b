//! Open a written chart with the platform's default viewer

use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Launch the viewer without waiting for it. Returns whether it started.
pub fn open(path: &Path) -> bool {
    open_with(path, |p| open::that_detached(p))
}

fn open_with(path: &Path, launch: impl FnOnce(&Path) -> io::Result<()>) -> bool {
    match launch(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Opened chart");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not open chart viewer");
            false
        }
    }
}
