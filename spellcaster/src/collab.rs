//! Lazily initialised handle to an external collaborator (pose model,
//! detector backend).
//!
//! ```text
//!  Uninitialized ──first get()──▶ Ready(T)
//!                      │
//!                      └─ init error ──▶ Failed   (warn! once, never retried)
//! ```

use std::fmt;

use tracing::{info, warn};

type Init<T> = Box<dyn FnOnce() -> anyhow::Result<T> + Send>;

enum Slot<T> {
    Uninitialized(Init<T>),
    Ready(T),
    Failed,
}

/// Observable state of a [`Collaborator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollabStatus {
    Uninitialized,
    Ready,
    Failed,
}

pub struct Collaborator<T> {
    name: &'static str,
    slot: Slot<T>,
}

impl<T> Collaborator<T> {
    /// Defer `init` until the first [`Collaborator::get`].
    pub fn lazy<F>(name: &'static str, init: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        Self { name, slot: Slot::Uninitialized(Box::new(init)) }
    }

    /// Already initialised.
    pub fn ready(name: &'static str, value: T) -> Self {
        Self { name, slot: Slot::Ready(value) }
    }

    /// Permanently unavailable, e.g. switched off on the command line.
    pub fn disabled(name: &'static str) -> Self {
        Self { name, slot: Slot::Failed }
    }

    pub fn name(&self) -> &'static str { self.name }

    pub fn status(&self) -> CollabStatus {
        match self.slot {
            Slot::Uninitialized(_) => CollabStatus::Uninitialized,
            Slot::Ready(_)         => CollabStatus::Ready,
            Slot::Failed           => CollabStatus::Failed,
        }
    }

    /// The collaborator, initialising it on first use.  `None` once failed.
    pub fn get(&mut self) -> Option<&mut T> {
        if matches!(self.slot, Slot::Uninitialized(_)) {
            let Slot::Uninitialized(init) = std::mem::replace(&mut self.slot, Slot::Failed) else {
                return None;
            };
            match init() {
                Ok(value) => {
                    info!(collaborator = self.name, "initialised");
                    self.slot = Slot::Ready(value);
                }
                Err(e) => {
                    warn!(collaborator = self.name, error = %format!("{:#}", e), "unavailable, continuing without it");
                }
            }
        }
        match &mut self.slot {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for Collaborator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborator")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
