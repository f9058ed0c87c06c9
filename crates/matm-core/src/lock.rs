//! Per-key async serialization.
//!
//! Submissions that share an email address or phone number must not
//! interleave, or two of them can both observe "no match" and create twin
//! contacts. [`KeyedLocks`] hands out one async mutex per key; a
//! [`KeyGuard`] holds every mutex for a submission's keys until dropped.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLocks {
  slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
  pub fn new() -> Self { Self::default() }

  /// Lock every key in `keys`. Keys are locked in sorted order, so two
  /// callers with overlapping key sets cannot deadlock.
  pub async fn acquire(&self, mut keys: Vec<String>) -> KeyGuard<'_> {
    keys.sort();
    keys.dedup();

    // Built up front so a cancelled acquire still releases what it holds.
    let mut guard = KeyGuard {
      locks:   self,
      held:    Vec::with_capacity(keys.len()),
      pending: None,
    };
    for key in keys {
      let slot = {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
      };
      guard.pending = Some(key);
      let locked = slot.lock_owned().await;
      if let Some(key) = guard.pending.take() {
        guard.held.push((key, locked));
      }
    }

    guard
  }

  /// Number of keys currently tracked.
  pub fn len(&self) -> usize {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Releases its keys on drop and forgets slots nobody else is waiting on.
#[must_use = "keys are released as soon as the guard is dropped"]
pub struct KeyGuard<'a> {
  locks:   &'a KeyedLocks,
  held:    Vec<(String, OwnedMutexGuard<()>)>,
  /// Key whose slot is being waited on, if any.
  pending: Option<String>,
}

impl Drop for KeyGuard<'_> {
  fn drop(&mut self) {
    let mut keys: Vec<String> = std::mem::take(&mut self.held)
      .into_iter()
      .map(|(key, guard)| {
        drop(guard);
        key
      })
      .collect();
    keys.extend(self.pending.take());

    let mut slots = self.locks.slots.lock().unwrap_or_else(PoisonError::into_inner);
    for key in keys {
      // One reference means only the map holds it: no holder, no waiter.
      if slots.get(&key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
        slots.remove(&key);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn slots_are_released_after_drop() {
    let locks = KeyedLocks::new();
    {
      let _g = locks.acquire(vec!["email:a@x.com".into(), "phone:5551234567".into()]).await;
      assert_eq!(locks.len(), 2);
    }
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn duplicate_keys_lock_once() {
    let locks = KeyedLocks::new();
    let _g = locks.acquire(vec!["k".into(), "k".into()]).await;
    assert_eq!(locks.len(), 1);
  }

  #[tokio::test]
  async fn overlapping_keys_wait_for_release() {
    let locks = Arc::new(KeyedLocks::new());
    let guard = locks.acquire(vec!["a".into(), "b".into()]).await;

    let waiter = {
      let locks = Arc::clone(&locks);
      tokio::spawn(async move {
        let _g = locks.acquire(vec!["b".into(), "c".into()]).await;
      })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    tokio::time::timeout(Duration::from_secs(1), waiter)
      .await
      .expect("waiter should proceed once the key is free")
      .unwrap();
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn cancelled_acquire_releases_its_slots() {
    let locks = KeyedLocks::new();
    let holder = locks.acquire(vec!["b".into()]).await;

    // Takes "a", then waits on "b" until the timeout drops it.
    let cancelled = tokio::time::timeout(
      Duration::from_millis(50),
      locks.acquire(vec!["a".into(), "b".into()]),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(locks.len(), 1, "only the holder's key should remain");

    drop(holder);
    assert!(locks.is_empty());

    let again =
      tokio::time::timeout(Duration::from_millis(100), locks.acquire(vec!["a".into()])).await;
    assert!(again.is_ok());
  }

  #[tokio::test]
  async fn disjoint_keys_do_not_block() {
    let locks = KeyedLocks::new();
    let _a = locks.acquire(vec!["a".into()]).await;
    let acquired =
      tokio::time::timeout(Duration::from_millis(100), locks.acquire(vec!["z".into()])).await;
    assert!(acquired.is_ok());
  }
}
