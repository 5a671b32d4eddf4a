use std::time::Duration;
use std::thread;
use anyhow::{anyhow,Error};

pub type Thread = thread::JoinHandle<Result<(),Error>>;
pub trait Trigger {
  fn join(self: Box<Self>) -> Result<(),Error>;
}

/// Runs an action over and over, sleeping `duration` between the end of one run and the start of the next.
pub struct IntervalTrigger {
  pub thread: Thread
}

impl IntervalTrigger {
  pub fn duration<F>(duration: Duration, action: F) -> Self
    where F: Fn() ->  Result<(),Error> + Send + 'static
  {
    let thread = thread::spawn(move || -> Result<(),Error> {
      loop {
        run_logged(&action);
        log::info!("Next run will start in {} seconds", duration.as_secs());
        thread::sleep(duration);
      }
    });
    Self {thread}
  }
}

/// Runs `action` once. A failure is logged and swallowed so the interval loop keeps going.
fn run_logged<F>(action: &F) -> bool
  where F: Fn() -> Result<(),Error>
{
  match action() {
    Ok(()) => true,
    Err(e) => {
      log::error!("run failed: {:#}", e);
      false
    }
  }
}

impl Trigger for IntervalTrigger {
  fn join(self: Box<Self>) -> Result<(),Error> {
    self.thread.join()
    .unwrap_or(Err(anyhow!("join error")))
  }
}

/// Runs an action a single time and hands back its outcome.
pub struct OnceTrigger {
  pub thread: Thread
}
impl Trigger for OnceTrigger {
  fn join(self: Box<Self>) -> Result<(),Error> {
    self.thread.join()
    .unwrap_or(Err(anyhow!("join error")))
  }
}
impl OnceTrigger {
  pub fn new<F>(action: F) -> Self
    where F: FnOnce() ->  Result<(),Error> + Send + 'static
  {
    let thread = thread::spawn(action);
    Self { thread }
  }
}
