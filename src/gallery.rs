use serde::{Deserialize, Serialize};
use anyhow::Result;

use crate::data::HttpClient;

pub const DEFAULT_DOMAIN: &str = "https://cn.bing.com";
pub const GALLERY_PATH: &str = "/hp/api/v1/imagegallery?format=json";

/// One wallpaper as kept in the local history. Missing fields decode as empty strings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallpaperRecord {
  pub title: String,
  pub caption: String,
  pub description: String,
  /// ISO date of the wallpaper, e.g. `2024-01-03`
  pub date: String,
  pub url: String,
}

/// Newest-first list of wallpapers.
pub type History = Vec<WallpaperRecord>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Gallery {
  data: GalleryData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GalleryData {
  images: Vec<GalleryImage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GalleryImage {
  caption: String,
  title: String,
  description: String,
  iso_date: String,
  image_urls: ImageUrls,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ImageUrls {
  landscape: ImageUrl,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ImageUrl {
  ultra_high_def: String,
}

impl Gallery {
  fn into_records(self, domain: &str) -> History {
    self.data.images.into_iter()
      .filter_map(|image| {
        let path = image.image_urls.landscape.ultra_high_def;
        if path.is_empty() {
          log::warn!("skipping gallery image of {} without an UHD url", image.iso_date);
          return None;
        }
        let url = if path.starts_with("http://") || path.starts_with("https://") { path }
          else { format!("{}{}", domain, path) };
        Some(WallpaperRecord {
          title: image.title,
          caption: image.caption,
          description: image.description,
          date: image.iso_date,
          url,
        })
      })
      .collect()
  }
}

pub fn gallery_url(domain: &str) -> String {
  format!("{}{}", domain.trim_end_matches('/'), GALLERY_PATH)
}

/// Fetches the image gallery of `domain` and flattens it into records, newest first as served.
pub fn fetch(client: &HttpClient, domain: &str) -> Result<History> {
  let domain = domain.trim_end_matches('/');
  let gallery: Gallery = client.get_json(&gallery_url(domain))?;
  let records = gallery.into_records(domain);
  log::info!("fetched {} wallpapers from {}", records.len(), domain);
  Ok(records)
}
