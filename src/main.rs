mod config;
mod data;
mod downloader;
mod files;
mod gallery;
mod merge;
mod pipeline;
mod triggers;
#[cfg(test)]
mod testserver;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{anyhow, bail, Result};

use config::Settings;
use triggers::{IntervalTrigger, OnceTrigger, Trigger};

#[derive(Debug, Default, PartialEq)]
struct CLIConfig {
  config_file: Option<String>,
  data_path: Option<PathBuf>,
  save_dir: Option<PathBuf>,
  domain: Option<String>,
  workers: Option<usize>,
  interval: Option<Duration>,
  help: bool,
}

impl CLIConfig {
  /// Flags given on the command line win over the config file.
  fn apply(self, mut settings: Settings) -> Settings {
    if let Some(path) = self.data_path { settings.data_path = path; }
    if let Some(dir) = self.save_dir { settings.save_dir = dir; }
    if let Some(domain) = self.domain { settings.domain = domain; }
    if let Some(workers) = self.workers { settings.workers = workers; }
    if self.interval.is_some() { settings.interval = self.interval; }
    settings
  }
}

fn show_usage_and_quit() -> ! {
  println!(r#"
Usage:
  bingpaper [options]

Whereby options can be:
  -f path       history file, or directory holding db.json (default ./)
  -s dir        directory the wallpapers are saved to (default ./)
  -d domain     gallery domain (default https://cn.bing.com)
  -c file.yml   read settings from a YAML file, flags still take precedence
  -w workers    number of parallel downloads (default 4)
  -i interval   keep running and fetch again every interval, e.g. 1d or 12h
  -h            show this help

  "#);
  std::process::exit(1);
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
  args.next().ok_or_else(|| anyhow!("missing value for {}", flag))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CLIConfig> {
  let mut config = CLIConfig::default();

  while let Some(arg) = args.next() {
    match arg.as_str() {
      "-h" | "--help" => config.help = true,
      "-c" => config.config_file = Some(flag_value(&mut args, &arg)?),
      "-f" => config.data_path = Some(PathBuf::from(flag_value(&mut args, &arg)?)),
      "-s" => config.save_dir = Some(PathBuf::from(flag_value(&mut args, &arg)?)),
      "-d" => config.domain = Some(flag_value(&mut args, &arg)?),
      "-w" => {
        let value = flag_value(&mut args, &arg)?;
        let workers = value.parse().map_err(|_| anyhow!("invalid worker count: {}", value))?;
        config.workers = Some(workers);
      },
      "-i" => {
        let value = flag_value(&mut args, &arg)?;
        let interval = parse_duration::parse(&value).map_err(|e| anyhow!("invalid interval {}: {}", value, e))?;
        config.interval = Some(interval);
      },
      _ => bail!("unknown argument: {}", arg),
    }
  }

  Ok(config)
}

fn parse_cli() -> CLIConfig {
  match parse_args(env::args().skip(1)) {
    Ok(config) if !config.help => config,
    Ok(_) => show_usage_and_quit(),
    Err(e) => {
      eprintln!("{}", e);
      show_usage_and_quit()
    }
  }
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).format_target(false).init();
  let cli = parse_cli();

  let settings = match &cli.config_file {
    Some(path) => {
      log::debug!("loading config file {}", path);
      Settings::from_file(path)?
    },
    None => Settings::default(),
  };
  let settings = cli.apply(settings);
  log::debug!("settings: {:?}", settings);

  let client = data::HttpClient::new(settings.timeout, settings.retries, settings.retry_interval)?;
  let interval = settings.interval;
  let action = move || -> Result<()> {
    let summary = pipeline::run(&settings, &client)?;
    log::info!("run completed: {} fetched, {} new, {} in history, {} downloaded",
      summary.fetched, summary.new_records, summary.history_len, summary.downloaded);
    Ok(())
  };

  let trigger: Box<dyn Trigger> = match interval {
    Some(duration) => Box::new(IntervalTrigger::duration(duration, action)),
    None => Box::new(OnceTrigger::new(action)),
  };
  trigger.join()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split_whitespace().map(|s| s.to_string())
  }

  #[test]
  fn test_no_arguments() {
    assert_eq!(parse_args(args("")).unwrap(), CLIConfig::default());
  }

  #[test]
  fn test_all_flags() {
    let cli = parse_args(args("-f data/ -s pics -d https://www.bing.com -c conf.yml -w 3 -i 12h")).unwrap();
    assert_eq!(cli.data_path, Some(PathBuf::from("data/")));
    assert_eq!(cli.save_dir, Some(PathBuf::from("pics")));
    assert_eq!(cli.domain.as_deref(), Some("https://www.bing.com"));
    assert_eq!(cli.config_file.as_deref(), Some("conf.yml"));
    assert_eq!(cli.workers, Some(3));
    assert_eq!(cli.interval, Some(Duration::new(12 * 3600, 0)));
  }

  #[test]
  fn test_bad_arguments() {
    assert!(parse_args(args("-f")).unwrap_err().to_string().contains("missing value for -f"));
    assert!(parse_args(args("-w many")).is_err());
    assert!(parse_args(args("-i whenever")).is_err());
    assert!(parse_args(args("--verbose")).unwrap_err().to_string().contains("unknown argument"));
    assert!(parse_args(args("-h")).unwrap().help);
  }

  #[test]
  fn test_flags_override_config() {
    let from_file = Settings::from_yaml("save_dir: from_file\nworkers: 9\ninterval: 1h\n").unwrap();
    let cli = parse_args(args("-s from_flag")).unwrap();
    let settings = cli.apply(from_file);
    assert_eq!(settings.save_dir, PathBuf::from("from_flag"));
    assert_eq!(settings.workers, 9);
    assert_eq!(settings.interval, Some(Duration::new(3600, 0)));
  }
}
