//! Clinical data a generation call is derived from.
//!
//! ```rust
//! use scall::{ClinicalPayload, FindingInstance, SelectedFinding};
//!
//! let payload = ClinicalPayload::new("abdomen-total")
//!     .with_finding(
//!         SelectedFinding::new("liver", "steatosis", "Hepatic steatosis")
//!             .with_severity("moderate")
//!             .with_instance(FindingInstance::new("i-1").with_measurement("size", "16 cm")),
//!     )
//!     .with_normal_structure("gallbladder");
//!
//! assert_eq!(payload.findings.len(), 1);
//! assert!(!payload.is_empty());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClinicalPayload {
    pub exam_type: String,
    pub findings: Vec<SelectedFinding>,
    pub normal_structures: Vec<String>,
}

impl ClinicalPayload {
    pub fn new(exam_type: impl Into<String>) -> Self {
        Self {
            exam_type: exam_type.into(),
            findings: Vec::new(),
            normal_structures: Vec::new(),
        }
    }

    pub fn with_finding(mut self, finding: SelectedFinding) -> Self {
        self.findings.push(finding);
        self
    }

    pub fn with_normal_structure(mut self, structure: impl Into<String>) -> Self {
        self.normal_structures.push(structure.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty() && self.normal_structures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectedFinding {
    pub organ_id: String,
    pub finding_id: String,
    /// Display label; derived from `finding_id` and not part of call identity.
    pub finding_name: String,
    pub severity: Option<String>,
    pub instances: Vec<FindingInstance>,
}

impl SelectedFinding {
    pub fn new(
        organ_id: impl Into<String>,
        finding_id: impl Into<String>,
        finding_name: impl Into<String>,
    ) -> Self {
        Self {
            organ_id: organ_id.into(),
            finding_id: finding_id.into(),
            finding_name: finding_name.into(),
            severity: None,
            instances: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_instance(mut self, instance: FindingInstance) -> Self {
        self.instances.push(instance);
        self
    }
}

/// One measured occurrence of a finding (e.g. one nodule of several).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindingInstance {
    /// UI-assigned id; regenerated freely by forms.
    pub id: String,
    pub measurements: BTreeMap<String, String>,
}

impl FindingInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            measurements: BTreeMap::new(),
        }
    }

    pub fn with_measurement(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.measurements.insert(name.into(), value.into());
        self
    }

    pub fn with_measurements(mut self, measurements: BTreeMap<String, String>) -> Self {
        self.measurements.extend(measurements);
        self
    }
}
