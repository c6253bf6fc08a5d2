//! Timing thresholds and per-kind generation settings.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use scall::{CallKind, CallSettings};
//!
//! let settings = CallSettings::default().with_debounce(Duration::from_millis(250));
//! assert_eq!(settings.debounce, Duration::from_millis(250));
//! assert_eq!(settings.stale_after, Duration::from_secs(30));
//! assert_eq!(settings.kind(CallKind::FullReport).max_tokens, 4096);
//! ```

use std::time::Duration;

use crate::CallKind;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);
pub const DEFAULT_DUPLICATE_WINDOW: Duration = Duration::from_secs(2);
pub const DEFAULT_HISTORY_RETENTION: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindSettings {
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl KindSettings {
    pub fn new(timeout: Duration, max_tokens: u32, temperature: f32) -> Self {
        Self {
            timeout,
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallSettings {
    pub debounce: Duration,
    /// Age after which an active call is treated as abandoned.
    pub stale_after: Duration,
    /// Window in which a just-completed identical call is suppressed.
    pub duplicate_window: Duration,
    pub history_retention: Duration,
    pub impression: KindSettings,
    pub full_report: KindSettings,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            stale_after: DEFAULT_STALE_AFTER,
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            history_retention: DEFAULT_HISTORY_RETENTION,
            impression: KindSettings::new(Duration::from_secs(30), 2048, 0.2),
            full_report: KindSettings::new(Duration::from_secs(60), 4096, 0.2),
        }
    }
}

impl CallSettings {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_duplicate_window(mut self, duplicate_window: Duration) -> Self {
        self.duplicate_window = duplicate_window;
        self
    }

    pub fn with_history_retention(mut self, history_retention: Duration) -> Self {
        self.history_retention = history_retention;
        self
    }

    pub fn with_kind(mut self, kind: CallKind, settings: KindSettings) -> Self {
        match kind {
            CallKind::Impression => self.impression = settings,
            CallKind::FullReport => self.full_report = settings,
        }
        self
    }

    pub fn kind(&self, kind: CallKind) -> &KindSettings {
        match kind {
            CallKind::Impression => &self.impression,
            CallKind::FullReport => &self.full_report,
        }
    }
}
