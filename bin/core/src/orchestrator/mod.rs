//! The conductor. Drives the create / lifecycle / credential /
//! delete sagas across the forge, the platform, the vault, and
//! the store, owns rollback, and serializes everything
//! per-project.

use std::{pin::Pin, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::state::project_locks;

pub mod create;
pub mod credentials;
pub mod delete;
pub mod environment;
pub mod lifecycle;
pub mod retry;

/// All orchestrator operations on one project run mutually
/// exclusively. Operations on distinct projects run freely.
pub async fn lock_project(
  project_id: &str,
) -> OwnedMutexGuard<()> {
  let lock = project_locks()
    .entry(project_id.to_string())
    .or_insert_with(|| Arc::new(Mutex::new(())))
    .clone();
  lock.lock_owned().await
}

type CompensationFuture =
  Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Compensating actions of the saga steps that already took
/// remote effect. Ran in reverse order, best-effort: a failing
/// compensator is logged and never aborts the rest, and never
/// replaces the causing error.
#[derive(Default)]
pub struct Compensations {
  steps: Vec<(&'static str, CompensationFuture)>,
}

impl std::fmt::Debug for Compensations {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Compensations")
      .field(
        "steps",
        &self.steps.iter().map(|(name, _)| name).collect::<Vec<_>>(),
      )
      .finish()
  }
}

impl Compensations {
  pub fn push(
    &mut self,
    label: &'static str,
    compensate: impl Future<Output = anyhow::Result<()>>
    + Send
    + 'static,
  ) {
    self.steps.push((label, Box::pin(compensate)));
  }

  pub fn clear(&mut self) {
    self.steps.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  async fn run(self) {
    for (label, compensate) in self.steps.into_iter().rev() {
      match compensate.await {
        Ok(()) => debug!("compensated: {label}"),
        Err(e) => {
          warn!("compensation '{label}' failed | {e:#}")
        }
      }
    }
  }
}

/// Runs the compensations to completion even if the calling
/// request has been cancelled, so remote resources never leak
/// on client disconnect.
pub async fn run_compensations(compensations: Compensations) {
  if compensations.is_empty() {
    return;
  }
  if let Err(e) = tokio::spawn(compensations.run()).await {
    warn!("compensation task panicked | {e:?}");
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex as StdMutex;

  use super::*;

  #[tokio::test]
  async fn compensations_run_in_reverse_and_survive_failures() {
    let order: Arc<StdMutex<Vec<&'static str>>> =
      Default::default();
    let mut comps = Compensations::default();

    for (label, fails) in [
      ("delete repo", false),
      ("delete app", true),
      ("unset env", false),
    ] {
      let order = order.clone();
      comps.push(label, async move {
        order.lock().unwrap().push(label);
        if fails {
          Err(anyhow::anyhow!("boom"))
        } else {
          Ok(())
        }
      });
    }

    run_compensations(comps).await;

    assert_eq!(
      order.lock().unwrap().as_slice(),
      ["unset env", "delete app", "delete repo"]
    );
  }

  #[tokio::test]
  async fn cleared_compensations_do_nothing() {
    let order: Arc<StdMutex<Vec<&'static str>>> =
      Default::default();
    let mut comps = Compensations::default();
    let order_clone = order.clone();
    comps.push("never", async move {
      order_clone.lock().unwrap().push("never");
      Ok(())
    });
    comps.clear();
    run_compensations(comps).await;
    assert!(order.lock().unwrap().is_empty());
  }
}
