//! Holder for the process-lifetime [`SettoConfig`].

use setto_types::config::SettoConfig;
use std::sync::{Arc, RwLock};

use crate::error::SettoError;

/// Stores the SDK configuration.
///
/// Every entry point reads it through [`ConfigStore::current`], which fails fast with
/// [`SettoError::NotInitialized`] instead of assuming a value is present.
#[derive(Debug, Default)]
pub struct ConfigStore {
    config: RwLock<Option<Arc<SettoConfig>>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `config`, fully replacing any previous value.
    pub fn initialize(&self, config: SettoConfig) {
        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(config));
    }

    pub fn is_initialized(&self) -> bool {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// A snapshot of the current configuration.
    pub fn current(&self) -> Result<Arc<SettoConfig>, SettoError> {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(SettoError::NotInitialized)
    }
}
