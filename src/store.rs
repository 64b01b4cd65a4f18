//! Username store
//!
//! The one piece of shared mutable state: an ordered list of usernames,
//! append-only except for explicit removal. Held behind a mutex so concurrent
//! requests never lose updates. Not persisted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found in list")]
    NotPresent(String),
}

/// Cloneable handle to the shared list
#[derive(Debug, Clone, Default)]
pub struct UsernameStore {
    inner: Arc<Mutex<Vec<String>>>,
}

impl UsernameStore {
    /// Append a username, returning the list after the append
    pub fn append(&self, username: &str) -> Vec<String> {
        let mut list = self.lock();
        list.push(username.to_string());
        list.clone()
    }

    /// Remove the first occurrence of a username, returning the list after removal
    pub fn remove(&self, username: &str) -> Result<Vec<String>, StoreError> {
        let mut list = self.lock();
        let index = list
            .iter()
            .position(|u| u == username)
            .ok_or_else(|| StoreError::NotPresent(username.to_string()))?;
        list.remove(index);
        Ok(list.clone())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    // Every critical section leaves the list consistent, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
impl UsernameStore {
    /// Occurrences of a username
    pub fn count(&self, username: &str) -> usize {
        self.lock().iter().filter(|u| *u == username).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
