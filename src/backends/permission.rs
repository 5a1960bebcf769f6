// SPDX-License-Identifier: GPL-3.0-only

//! Permission capability
//!
//! The scanner may only open when the camera capability is granted. The
//! host decides how a request is answered: a fixed answer, or a prompt
//! resolved later by the UI.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Capabilities gated by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Camera,
}

/// How camera permission requests are answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    /// Always granted
    Granted,
    /// Always refused
    Denied,
    /// Ask the user on first use
    #[default]
    Ask,
}

/// Capability check and request, as provided by the host
pub trait PermissionProvider: Send + Sync {
    /// Whether the capability is already granted (no prompting)
    fn check_granted(&self, capability: Capability) -> bool;

    /// Ask for the capability; resolves to the user's answer
    fn request(&self, capability: Capability) -> BoxFuture<'_, bool>;
}

/// Fixed answer for every check and request
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    granted: bool,
}

impl StaticPermission {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl PermissionProvider for StaticPermission {
    fn check_granted(&self, _capability: Capability) -> bool {
        self.granted
    }

    fn request(&self, _capability: Capability) -> BoxFuture<'_, bool> {
        futures::future::ready(self.granted).boxed()
    }
}

/// Permission answered per [`PermissionPolicy`]
///
/// With `Ask`, a request stays pending until the UI calls [`answer`].
/// A grant is remembered for the rest of the process.
///
/// [`answer`]: PromptPermission::answer
pub struct PromptPermission {
    policy: PermissionPolicy,
    granted: AtomicBool,
    pending: Mutex<Option<oneshot::Sender<bool>>>,
}

impl PromptPermission {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            policy,
            granted: AtomicBool::new(policy == PermissionPolicy::Granted),
            pending: Mutex::new(None),
        }
    }

    /// Whether a request is waiting for the user's answer
    pub fn is_prompting(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Resolve the pending prompt. Returns `false` if nothing was pending.
    pub fn answer(&self, granted: bool) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        match pending {
            Some(tx) => {
                info!(granted, "Permission prompt answered");
                tx.send(granted).is_ok()
            }
            None => false,
        }
    }
}

impl PermissionProvider for PromptPermission {
    fn check_granted(&self, _capability: Capability) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request(&self, capability: Capability) -> BoxFuture<'_, bool> {
        async move {
            match self.policy {
                PermissionPolicy::Granted => true,
                PermissionPolicy::Denied => false,
                PermissionPolicy::Ask => {
                    if self.check_granted(capability) {
                        return true;
                    }
                    let (tx, rx) = oneshot::channel();
                    *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
                    debug!(?capability, "Waiting for permission answer");

                    // Prompt abandoned counts as a refusal
                    let granted = rx.await.unwrap_or(false);
                    if granted {
                        self.granted.store(true, Ordering::SeqCst);
                    }
                    granted
                }
            }
        }
        .boxed()
    }
}
