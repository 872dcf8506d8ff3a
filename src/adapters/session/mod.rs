//! Session provider. Implements SessionPort.
//!
//! Identity comes from configuration or an explicit sign-in in the UI;
//! nothing here authenticates.

use crate::domain::Identity;
use crate::ports::SessionPort;
use std::sync::RwLock;
use tracing::info;

/// Mutable in-process session. `None` means signed out.
#[derive(Debug, Default)]
pub struct LocalSession {
    identity: RwLock<Option<Identity>>,
}

impl LocalSession {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            identity: RwLock::new(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self::new(None)
    }

    /// Blank names are treated as signed out.
    pub fn sign_in(&self, name: &str) {
        let name = name.trim();
        let identity = (!name.is_empty()).then(|| Identity::new(name));
        info!(signed_in = identity.is_some(), "session identity changed");
        if let Ok(mut slot) = self.identity.write() {
            *slot = identity;
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut slot) = self.identity.write() {
            *slot = None;
        }
        info!("signed out");
    }
}

impl SessionPort for LocalSession {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.read().ok().and_then(|slot| slot.clone())
    }
}
