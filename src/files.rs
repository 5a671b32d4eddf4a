use anyhow::{anyhow, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

use crate::data::handle_retry;
use crate::gallery::{History, WallpaperRecord};

pub const HISTORY_FILE_NAME: &str = "db.json";

/// The data path names either a directory holding `db.json` or the history file itself.
pub fn resolve_history_path(path: &Path) -> PathBuf {
  let raw = path.as_os_str().to_string_lossy();
  let names_a_dir = raw.is_empty() || raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR);
  if names_a_dir || path.is_dir() { path.join(HISTORY_FILE_NAME) }
  else { path.to_path_buf() }
}

/// Loads the history at `path`. A missing or unreadable file counts as an empty history.
pub fn read_history(path: &Path) -> History {
  let contents = match fs::read_to_string(path) {
    Ok(s) => s,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      log::info!("no history at {} yet, starting from scratch", path.display());
      return vec![];
    },
    Err(e) => {
      log::warn!("could not read history file {}: {}", path.display(), e);
      return vec![];
    }
  };
  match serde_json::from_str::<History>(&contents) {
    Ok(history) => {
      log::debug!("read {} records from {}", history.len(), path.display());
      history
    },
    Err(e) => {
      log::warn!("history file {} is not valid, ignoring it: {}", path.display(), e);
      set_aside(path);
      vec![]
    }
  }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
  let mut name = path.as_os_str().to_os_string();
  name.push(suffix);
  PathBuf::from(name)
}

/// Renames an undecodable history to `<path>.bak` so the next write does not destroy it.
fn set_aside(path: &Path) {
  let backup = sibling(path, ".bak");
  match fs::rename(path, &backup) {
    Ok(()) => log::warn!("kept the unreadable history as {}", backup.display()),
    Err(e) => log::warn!("could not move {} to {}: {}", path.display(), backup.display(), e),
  }
}

/// Compact JSON followed by a newline. `<`, `>` and `&` are written as is.
pub fn encode_history(history: &[WallpaperRecord]) -> Result<String> {
  let mut json = serde_json::to_string(history).map_err(|e| anyhow!("could not encode history: {}", e))?;
  json.push('\n');
  Ok(json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(|e| anyhow!("could not create directory {}: {}", parent.display(), e))?;
  }
  // the history is replaced in one rename, never truncated in place
  let tmp_path = sibling(path, ".tmp");
  fs::write(&tmp_path, contents).map_err(|e| anyhow!("could not write to file {}: {}", tmp_path.display(), e))?;
  fs::rename(&tmp_path, path).map_err(|e| anyhow!("could not replace file {}: {}", path.display(), e))
}

/// Overwrites the history file at `path` with `history`.
pub fn write_history(path: &Path, history: &[WallpaperRecord], retries: u8, retry_interval: Duration) -> Result<()> {
  let json = encode_history(history)?;
  handle_retry(retries, retry_interval, || write_file(path, &json))?;
  log::info!("wrote {} records to {}", history.len(), path.display());
  Ok(())
}
