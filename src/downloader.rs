use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;

use anyhow::{anyhow, bail, Error, Result};
use reqwest::Url;

use crate::data::HttpClient;
use crate::gallery::WallpaperRecord;

pub const DEFAULT_WORKERS: usize = 4;

/// Image URLs carry their file name in the `id` query parameter, e.g. `/th?id=OHR.Owl_UHD.jpg&rf=...`.
pub fn file_name_from_url(url: &str) -> Result<String> {
  let parsed = Url::parse(url).map_err(|e| anyhow!("invalid image URL {}: {}", url, e))?;
  let id = parsed.query_pairs()
    .find(|(key, _)| key == "id")
    .map(|(_, value)| value.into_owned())
    .filter(|value| !value.is_empty())
    .ok_or_else(|| anyhow!("no id parameter in image URL {}", url))?;
  if id == "." || id == ".." || id.contains('/') || id.contains('\\') {
    bail!("refusing file name {} from image URL {}", id, url);
  }
  Ok(id)
}

#[derive(Debug)]
pub struct DownloadFailure {
  pub url: String,
  pub error: Error,
}

#[derive(Debug, Default)]
pub struct DownloadReport {
  pub saved: Vec<PathBuf>,
  pub failures: Vec<DownloadFailure>,
}

impl DownloadReport {
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }
}

/// Saves wallpapers into `target_dir` with at most `workers` downloads in flight.
pub struct Downloader<'a> {
  client: &'a HttpClient,
  target_dir: PathBuf,
  workers: usize,
}

impl<'a> Downloader<'a> {
  pub fn new(client: &'a HttpClient, target_dir: &Path, workers: usize) -> Self {
    Self { client, target_dir: target_dir.to_path_buf(), workers: workers.max(1) }
  }

  pub fn download_one(&self, record: &WallpaperRecord) -> Result<PathBuf> {
    let name = file_name_from_url(&record.url)?;
    let bytes = self.client.get_bytes(&record.url)?;
    let path = self.target_dir.join(name);
    fs::write(&path, &bytes).map_err(|e| anyhow!("could not write image {}: {}", path.display(), e))?;
    log::debug!("saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
  }

  /// Downloads every record. Failures are collected per record and never stop the other downloads;
  /// only a missing and uncreatable target directory fails the whole batch.
  pub fn download_all(&self, records: &[WallpaperRecord]) -> Result<DownloadReport> {
    let mut report = DownloadReport::default();
    if records.is_empty() {
      return Ok(report);
    }
    fs::create_dir_all(&self.target_dir)
      .map_err(|e| anyhow!("could not create directory {}: {}", self.target_dir.display(), e))?;

    // two workers must never write the same file
    let mut names = HashSet::new();
    let queued: Vec<&WallpaperRecord> = records.iter()
      .filter(|record| match file_name_from_url(&record.url) {
        Ok(name) if !names.insert(name.clone()) => {
          log::debug!("{} saves to an already queued file, skipping it", record.url);
          false
        },
        _ => true,
      })
      .collect();

    let workers = self.workers.min(queued.len());
    log::info!("downloading {} wallpapers to {} with {} workers", queued.len(), self.target_dir.display(), workers);

    let queue = Mutex::new(queued.into_iter());
    let (done, outcomes) = mpsc::channel();
    thread::scope(|scope| {
      for _ in 0..workers {
        let done = done.clone();
        let queue = &queue;
        scope.spawn(move || loop {
          let next = match queue.lock() {
            Ok(mut pending) => pending.next(),
            Err(_) => None,
          };
          let Some(record) = next else { break };
          let _ = done.send((record, self.download_one(record)));
        });
      }
    });
    drop(done);

    for (record, outcome) in outcomes {
      match outcome {
        Ok(path) => report.saved.push(path),
        Err(error) => report.failures.push(DownloadFailure { url: record.url.clone(), error }),
      }
    }
    log::info!("download complete: {} saved, {} failed", report.saved.len(), report.failures.len());
    Ok(report)
  }
}
