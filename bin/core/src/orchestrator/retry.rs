//! Bounded retry for transient gateway failures. Strictly an
//! orchestrator policy: the gateways themselves never retry,
//! and only idempotent calls (reads, deletes, start / stop /
//! restart, env writes, app updates) go through here.

use std::time::Duration;

use forge_client::ForgeError;
use platform_client::PlatformError;
use rand::Rng;

pub const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(500);

pub trait Transient {
  fn is_transient(&self) -> bool;
  fn retry_after(&self) -> Option<Duration>;
}

impl Transient for ForgeError {
  fn is_transient(&self) -> bool {
    ForgeError::is_transient(self)
  }
  fn retry_after(&self) -> Option<Duration> {
    ForgeError::retry_after(self)
  }
}

impl Transient for PlatformError {
  fn is_transient(&self) -> bool {
    PlatformError::is_transient(self)
  }
  fn retry_after(&self) -> Option<Duration> {
    PlatformError::retry_after(self)
  }
}

/// Runs `call` up to [MAX_ATTEMPTS] times with exponential
/// backoff and jitter, honoring upstream retry-after. Anything
/// non-transient propagates immediately.
pub async fn with_retry<T, E, F, Fut>(
  label: &str,
  call: F,
) -> Result<T, E>
where
  E: Transient + std::fmt::Display,
  F: Fn() -> Fut,
  Fut: Future<Output = Result<T, E>>,
{
  let mut attempt = 1;
  loop {
    match call().await {
      Ok(res) => return Ok(res),
      Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
        let backoff = e.retry_after().unwrap_or_else(|| {
          let exp = BASE_BACKOFF * 2u32.pow(attempt - 1);
          exp
            + Duration::from_millis(
              rand::rng().random_range(0..250),
            )
        });
        warn!(
          "{label} attempt {attempt}/{MAX_ATTEMPTS} failed, retrying in {backoff:?} | {e}"
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
  };

  use super::*;

  #[tokio::test(start_paused = true)]
  async fn transient_errors_retry_up_to_three_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();
    let res = with_retry("test", move || {
      let calls = calls_clone.clone();
      async move {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
          Err(PlatformError::Transport {
            message: String::from("refused"),
          })
        } else {
          Ok(7u32)
        }
      }
    })
    .await;
    assert_eq!(res.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn transient_errors_eventually_propagate() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();
    let res: Result<(), _> = with_retry("test", move || {
      let calls = calls_clone.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(PlatformError::Transport {
          message: String::from("refused"),
        })
      }
    })
    .await;
    assert!(res.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
  }

  #[tokio::test]
  async fn non_transient_errors_fail_fast() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();
    let res: Result<(), _> = with_retry("test", move || {
      let calls = calls_clone.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(ForgeError::Conflict {
          message: String::from("exists"),
        })
      }
    })
    .await;
    assert!(matches!(
      res.unwrap_err(),
      ForgeError::Conflict { .. }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
