//! Connectivity signal.
//!
//! A cloneable handle around a watch channel holding the online flag.
//! Whatever observes the network (an OS hook, a failed request, a UI toggle)
//! calls [`Connectivity::set_online`]; the sync manager subscribes to it.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared online/offline state. Starts online, since an unknown state is
/// treated as connected.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update the state. Subscribers are only woken when it changes.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            tracing::info!(online, "connectivity changed");
        }
    }

    /// Receive every change from now on.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
