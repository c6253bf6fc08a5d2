//! Deterministic call identity derived from a payload's clinical content.
//!
//! The payload is reduced to a canonical JSON form (unordered collections
//! sorted, display labels and UI ids dropped, values trimmed) and hashed with
//! a 64-bit polynomial rolling hash.
//!
//! ```rust
//! use scall::{CallKind, ClinicalPayload, fingerprint};
//! use sprovider::ProviderId;
//!
//! let a = ClinicalPayload::new("thyroid")
//!     .with_normal_structure("left lobe")
//!     .with_normal_structure("isthmus");
//! let b = ClinicalPayload::new("thyroid")
//!     .with_normal_structure("isthmus")
//!     .with_normal_structure("left lobe");
//!
//! let key = fingerprint(CallKind::Impression, ProviderId::Claude, &a);
//! assert_eq!(key, fingerprint(CallKind::Impression, ProviderId::Claude, &b));
//! assert!(key.as_str().starts_with("impression-claude-"));
//! ```

use std::fmt::{Display, Formatter};

use serde_json::{Value, json};
use sprovider::ProviderId;

use crate::{CallKind, ClinicalPayload, SelectedFinding};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

pub fn fingerprint(kind: CallKind, provider: ProviderId, payload: &ClinicalPayload) -> Fingerprint {
    let canonical = canonical_form(payload).to_string();
    Fingerprint(format!(
        "{kind}-{provider}-{}",
        to_base36(rolling_hash(&canonical))
    ))
}

fn canonical_form(payload: &ClinicalPayload) -> Value {
    let mut findings = payload
        .findings
        .iter()
        .map(canonical_finding)
        .collect::<Vec<_>>();
    findings.sort_by_cached_key(Value::to_string);

    let mut normal = payload
        .normal_structures
        .iter()
        .map(|structure| structure.trim().to_string())
        .filter(|structure| !structure.is_empty())
        .collect::<Vec<_>>();
    normal.sort();
    normal.dedup();

    json!({
        "exam": payload.exam_type.trim(),
        "findings": findings,
        "normal": normal,
    })
}

fn canonical_finding(finding: &SelectedFinding) -> Value {
    let mut instances = finding
        .instances
        .iter()
        .map(|instance| {
            instance
                .measurements
                .iter()
                .map(|(name, value)| (name.trim().to_string(), Value::from(value.trim())))
                .filter(|(_, value)| value.as_str().is_some_and(|value| !value.is_empty()))
                .collect::<serde_json::Map<_, _>>()
        })
        .map(Value::Object)
        .collect::<Vec<_>>();
    instances.sort_by_cached_key(Value::to_string);

    json!({
        "organ": finding.organ_id.trim(),
        "finding": finding.finding_id.trim(),
        "severity": finding.severity.as_deref().map(str::trim),
        "instances": instances,
    })
}

fn rolling_hash(text: &str) -> u64 {
    text.bytes()
        .fold(0_u64, |hash, byte| hash.wrapping_mul(31).wrapping_add(u64::from(byte)))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
