use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

const BODY_EXCERPT_CHARS: usize = 200;

/// Runs `closure`, and on error runs it again up to `retries` more times, sleeping `interval` in between.
pub fn handle_retry<T,F>(retries: u8, interval: Duration, closure: F)
-> Result<T>
where F: Fn() -> Result<T> {
  match (closure(), retries) {
    (Ok(r),_) => Ok(r),
    (Err(e),0) => Err(e),
    (Err(e),_) => {
      log::debug!("{}, but {} {} left, will retry in {} seconds",
        e,
        retries,
        if retries == 1 {"retry"} else { "retries" },
        interval.as_secs_f64());
      std::thread::sleep(interval);
      handle_retry(retries - 1, interval, closure)
    }
  }
}

/// The one HTTP client of the process, shared by the gallery fetch and every download worker.
#[derive(Debug, Clone)]
pub struct HttpClient {
  client: Client,
  retries: u8,
  retry_interval: Duration,
}

impl HttpClient {
  pub fn new(timeout: Duration, retries: u8, retry_interval: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| anyhow!("could not build HTTP client: {}", e))?;
    Ok(Self { client, retries, retry_interval })
  }

  fn get_response(&self, url: &str) -> Result<Response> {
    handle_retry(self.retries, self.retry_interval, || {
      log::debug!("GET {}", url);
      let res = self.client.get(url).send()
        .map_err(|e| anyhow!("couldn't get URL via reqwest: {} ({})", url, e))?;
      if !res.status().is_success() {
        bail!("error code on GET to URL {}: {}", url, res.status());
      }
      Ok(res)
    })
  }

  pub fn get_body(&self, url: &str) -> Result<String> {
    let res = self.get_response(url)?;
    res.text().map_err(|_| anyhow!("reqwest body error getting {}", url))
  }

  pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
    let res = self.get_response(url)?;
    res.bytes()
      .map(|b| b.to_vec())
      .map_err(|_| anyhow!("reqwest body error getting {}", url))
  }

  pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
    let body = self.get_body(url)?;
    serde_json::from_str(&body).map_err(|e| anyhow!("couldn't parse response body of {}: {}. Body was: {}",
      url,
      e,
      excerpt(&body)))
  }
}

fn excerpt(body: &str) -> String {
  if body.chars().count() <= BODY_EXCERPT_CHARS { body.to_string() }
  else { format!("{}...", body.chars().take(BODY_EXCERPT_CHARS).collect::<String>()) }
}
