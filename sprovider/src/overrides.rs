//! Session-scoped model overrides consulted by adapters once per call.
//!
//! ```rust
//! use sprovider::{InMemoryModelOverrides, ModelOverrides, SELECTED_MODEL_KEY};
//!
//! let overrides = InMemoryModelOverrides::new();
//! overrides.set(SELECTED_MODEL_KEY, "claude-opus-4");
//! overrides.set(SELECTED_MODEL_KEY, "claude-sonnet-4-5");
//! assert_eq!(overrides.get(SELECTED_MODEL_KEY).as_deref(), Some("claude-sonnet-4-5"));
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ProviderId;

/// Key under which the model explicitly picked by the user is stored.
pub const SELECTED_MODEL_KEY: &str = "selected_model";

/// Provider-scoped variant of [`SELECTED_MODEL_KEY`], e.g. `selected_model.claude`.
pub fn selected_model_key(provider: ProviderId) -> String {
    format!("{SELECTED_MODEL_KEY}.{provider}")
}

/// Process-wide, last-write-wins key/value store owned outside the core.
pub trait ModelOverrides: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn clear(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct InMemoryModelOverrides {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryModelOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ModelOverrides for InMemoryModelOverrides {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values().insert(key.to_string(), value.to_string());
    }

    fn clear(&self, key: &str) {
        self.values().remove(key);
    }
}
