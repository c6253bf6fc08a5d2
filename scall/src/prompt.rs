//! Prompt assembly seam between clinical payloads and provider requests.
//!
//! ```rust
//! use scall::{CallKind, ClinicalPayload, FindingsPromptBuilder, PromptBuilder};
//!
//! let builder = FindingsPromptBuilder::new().with_language("pt-BR");
//! let prompt = builder.build(
//!     CallKind::Impression,
//!     &ClinicalPayload::new("Abdomen total").with_normal_structure("pancreas"),
//! );
//!
//! assert!(prompt.prompt.contains("Normal structures: pancreas"));
//! assert!(prompt.system_instruction.is_some());
//! ```

use std::fmt::Write as _;

use crate::{CallKind, ClinicalPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub system_instruction: Option<String>,
    pub prompt: String,
}

pub trait PromptBuilder: Send + Sync {
    fn build(&self, kind: CallKind, payload: &ClinicalPayload) -> GenerationPrompt;
}

const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an experienced radiologist drafting ultrasound \
reports. Use objective, standard medical terminology and never invent findings that were not \
provided.";

/// Renders exam, findings with severity and measurements, and normal structures.
#[derive(Debug, Clone)]
pub struct FindingsPromptBuilder {
    system_instruction: String,
    language: Option<String>,
}

impl Default for FindingsPromptBuilder {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            language: None,
        }
    }
}

impl FindingsPromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn task(kind: CallKind) -> &'static str {
        match kind {
            CallKind::Impression => {
                "Write a concise diagnostic impression summarising the findings above."
            }
            CallKind::FullReport => {
                "Write the complete report: a findings section followed by an impression. \
                 Make sure every listed finding and normal structure is covered."
            }
        }
    }
}

impl PromptBuilder for FindingsPromptBuilder {
    fn build(&self, kind: CallKind, payload: &ClinicalPayload) -> GenerationPrompt {
        let mut prompt = String::new();
        let _ = writeln!(prompt, "Exam: {}", payload.exam_type);
        prompt.push('\n');

        if payload.findings.is_empty() {
            prompt.push_str("Findings: none selected.\n");
        } else {
            prompt.push_str("Findings:\n");
            for finding in &payload.findings {
                let _ = write!(prompt, "- {} ({})", finding.finding_name, finding.organ_id);
                if let Some(severity) = &finding.severity {
                    let _ = write!(prompt, ", severity: {severity}");
                }
                prompt.push('\n');

                for (index, instance) in finding.instances.iter().enumerate() {
                    if instance.measurements.is_empty() {
                        continue;
                    }
                    let measurements = instance
                        .measurements
                        .iter()
                        .map(|(name, value)| format!("{name}: {value}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    let _ = writeln!(prompt, "  - #{}: {measurements}", index + 1);
                }
            }
        }

        if !payload.normal_structures.is_empty() {
            let _ = writeln!(
                prompt,
                "Normal structures: {}",
                payload.normal_structures.join(", ")
            );
        }

        prompt.push('\n');
        prompt.push_str(Self::task(kind));

        let mut system_instruction = self.system_instruction.clone();
        if let Some(language) = &self.language {
            let _ = write!(system_instruction, " Respond in {language}.");
        }

        GenerationPrompt {
            system_instruction: Some(system_instruction),
            prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FindingInstance, SelectedFinding};

    #[test]
    fn renders_findings_with_severity_and_measurements() {
        let payload = ClinicalPayload::new("Thyroid")
            .with_finding(
                SelectedFinding::new("left-lobe", "nodule", "Solid nodule")
                    .with_severity("TR4")
                    .with_instance(
                        FindingInstance::new("a")
                            .with_measurement("size", "12 mm")
                            .with_measurement("margins", "smooth"),
                    ),
            )
            .with_normal_structure("isthmus");

        let prompt = FindingsPromptBuilder::new().build(CallKind::Impression, &payload);

        assert!(prompt.prompt.starts_with("Exam: Thyroid\n"));
        assert!(prompt.prompt.contains("- Solid nodule (left-lobe), severity: TR4\n"));
        assert!(prompt.prompt.contains("  - #1: margins: smooth; size: 12 mm\n"));
        assert!(prompt.prompt.contains("Normal structures: isthmus\n"));
        assert!(prompt.prompt.ends_with("summarising the findings above."));
    }

    #[test]
    fn full_report_asks_for_completeness() {
        let prompt = FindingsPromptBuilder::new()
            .with_system_instruction("custom")
            .with_language("pt-BR")
            .build(CallKind::FullReport, &ClinicalPayload::new("Renal"));

        assert!(prompt.prompt.contains("Findings: none selected."));
        assert!(prompt.prompt.contains("every listed finding"));
        assert_eq!(
            prompt.system_instruction.as_deref(),
            Some("custom Respond in pt-BR.")
        );
    }
}
