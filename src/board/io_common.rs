use std::path::Path;

use crate::board::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Relative paths are taken from `root`, absolute paths are kept.
pub fn resolve_path(root: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        return path.to_string();
    }
    root.join(p).display().to_string()
}

/// Fails with a message meant for the user when the data file is missing.
pub fn ensure_available(path: &str) -> BoardResult<()> {
    if !Path::new(path).is_file() {
        warn!("ensure_available: {:?} is not a file", path);
        return SourceUnavailableSnafu { path }.fail();
    }
    Ok(())
}
