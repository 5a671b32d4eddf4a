use anyhow::{bail, Result};

use crate::config::Settings;
use crate::data::HttpClient;
use crate::downloader::Downloader;
use crate::{files, gallery, merge};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub fetched: usize,
  pub new_records: usize,
  pub history_len: usize,
  pub downloaded: usize,
}

/// One full pass: read history, fetch the gallery, merge, persist, then download what was fetched.
/// The history is written before any download starts, so a failed download leaves it updated.
pub fn run(settings: &Settings, client: &HttpClient) -> Result<RunSummary> {
  let history_path = files::resolve_history_path(&settings.data_path);
  let local = files::read_history(&history_path);

  let fetched = gallery::fetch(client, &settings.domain)?;
  let new_records = merge::count_new(&fetched, &local);
  let merged = merge::merge(&fetched, &local);
  log::info!("{} of {} fetched wallpapers are new, history grows to {}", new_records, fetched.len(), merged.len());

  files::write_history(&history_path, &merged, settings.retries, settings.retry_interval)?;

  let report = Downloader::new(client, &settings.save_dir, settings.workers).download_all(&fetched)?;
  for failure in &report.failures {
    log::warn!("could not download {}: {:#}", failure.url, failure.error);
  }
  if !report.is_success() {
    bail!("{} of {} downloads failed", report.failures.len(), fetched.len());
  }

  Ok(RunSummary {
    fetched: fetched.len(),
    new_records,
    history_len: merged.len(),
    downloaded: report.saved.len(),
  })
}

#[cfg(test)]
mod tests {

use super::*;
use crate::gallery::{GALLERY_PATH, WallpaperRecord};
use crate::gallery::tests::SAMPLE;
use crate::testserver;
use std::{fs, time::Duration};

  const OWL: &str = "/th?id=OHR.SnowyOwl_UHD.jpg&rf=LaDigue_UHD.jpg";
  const COVE: &str = "/th?id=OHR.PeggysCove_UHD.jpg&rf=LaDigue_UHD.jpg";

  fn settings(base: &str, dir: &std::path::Path) -> Settings {
    Settings {
      domain: base.to_string(),
      data_path: dir.join("data/"),
      save_dir: dir.join("images"),
      ..Settings::default()
    }
  }

  fn client() -> HttpClient {
    HttpClient::new(Duration::from_secs(5), 0, Duration::ZERO).unwrap()
  }

  fn stored(date: &str) -> WallpaperRecord {
    WallpaperRecord {
      title: format!("stored {}", date),
      caption: String::new(),
      description: String::new(),
      date: date.to_string(),
      url: format!("https://cn.bing.com/th?id={}.jpg", date),
    }
  }

  #[test]
  fn test_full_run() {
    let base = testserver::serve(vec![
      (GALLERY_PATH, 200, SAMPLE.as_bytes().to_vec()),
      (COVE, 200, b"cove".to_vec()),
      (OWL, 200, b"owl".to_vec()),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&base, dir.path());
    let history_path = dir.path().join("data").join("db.json");
    files::write_history(&history_path, &[stored("2024-01-02"), stored("2024-01-01")], 0, Duration::ZERO).unwrap();

    let summary = run(&settings, &client()).unwrap();
    assert_eq!(summary, RunSummary { fetched: 2, new_records: 1, history_len: 3, downloaded: 2 });

    let history = files::read_history(&history_path);
    let dates: Vec<_> = history.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-03", "2024-01-02", "2024-01-01"]);
    assert_eq!(history[1].title, "stored 2024-01-02");
    assert_eq!(fs::read(dir.path().join("images").join("OHR.SnowyOwl_UHD.jpg")).unwrap(), b"owl".to_vec());
    assert_eq!(fs::read(dir.path().join("images").join("OHR.PeggysCove_UHD.jpg")).unwrap(), b"cove".to_vec());
  }

  #[test]
  fn test_failed_download_still_writes_history() {
    let base = testserver::serve(vec![
      (GALLERY_PATH, 200, SAMPLE.as_bytes().to_vec()),
      (COVE, 200, b"cove".to_vec()),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&base, dir.path());

    let error = run(&settings, &client()).unwrap_err();
    assert!(error.to_string().contains("1 of 2 downloads failed"));
    assert_eq!(files::read_history(&dir.path().join("data").join("db.json")).len(), 2);
    assert!(dir.path().join("images").join("OHR.PeggysCove_UHD.jpg").exists());
  }

  #[test]
  fn test_unreachable_gallery_leaves_history_alone() {
    let base = testserver::serve(vec![]);
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&base, dir.path());
    assert!(run(&settings, &client()).is_err());
    assert!(!dir.path().join("data").join("db.json").exists());
  }
}
