use std::fmt::{Display, Formatter};

use sprovider::ProviderId;

use crate::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    Impression,
    FullReport,
}

impl CallKind {
    pub const ALL: [CallKind; 2] = [CallKind::Impression, CallKind::FullReport];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::FullReport => "report",
        }
    }
}

impl Display for CallKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one logical call: what the registry deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey {
    pub fingerprint: Fingerprint,
    pub kind: CallKind,
    pub provider: ProviderId,
}

impl CallKey {
    pub fn new(fingerprint: Fingerprint, kind: CallKind, provider: ProviderId) -> Self {
        Self {
            fingerprint,
            kind,
            provider,
        }
    }
}

impl Display for CallKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.fingerprint.as_str())
    }
}
