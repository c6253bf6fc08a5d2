//! Progressive extraction of one string field from a streamed JSON object.
//!
//! Partial bodies are repaired by closing any open string, array or object;
//! the named field is surfaced only once the repaired text parses.

use serde_json::Value;

use crate::ProviderError;

#[derive(Debug)]
pub(crate) struct StructuredFieldDecoder {
    field: String,
    raw: String,
    last: Option<String>,
}

impl StructuredFieldDecoder {
    pub(crate) fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            raw: String::new(),
            last: None,
        }
    }

    /// Appends a fragment and returns the field value when it changed.
    pub(crate) fn push(&mut self, fragment: &str) -> Option<String> {
        self.raw.push_str(fragment);
        let value = self.partial_value()?;
        if self.last.as_deref() == Some(value.as_str()) {
            return None;
        }
        self.last = Some(value.clone());
        Some(value)
    }

    pub(crate) fn finish(self) -> Result<String, ProviderError> {
        let body = strip_code_fence(&self.raw);
        if body.is_empty() {
            return Err(ProviderError::decode("structured response body was empty"));
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|err| ProviderError::decode(format!("structured response: {err}")))?;
        value
            .get(&self.field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::decode(format!(
                    "structured response is missing string field '{}'",
                    self.field
                ))
            })
    }

    fn partial_value(&self) -> Option<String> {
        let body = strip_code_fence(&self.raw);
        repair_candidates(body)
            .into_iter()
            .filter_map(|candidate| serde_json::from_str::<Value>(&candidate).ok())
            .find_map(|value| {
                value
                    .get(&self.field)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn repair_candidates(body: &str) -> Vec<String> {
    let scan = Scan::of(body);
    let mut candidates = vec![scan.close(body)];

    let without_dangling = body.trim_end().trim_end_matches([',', ':']).trim_end();
    if without_dangling.len() != body.len() {
        candidates.push(Scan::of(without_dangling).close(without_dangling));
    }

    if let Some(comma) = scan.last_comma {
        let head = &body[..comma];
        candidates.push(Scan::of(head).close(head));
    }
    candidates
}

/// Bracket/string state at the end of a JSON prefix.
struct Scan {
    closers: Vec<char>,
    in_string: bool,
    dangling_escape: bool,
    last_comma: Option<usize>,
}

impl Scan {
    fn of(body: &str) -> Self {
        let mut scan = Self {
            closers: Vec::new(),
            in_string: false,
            dangling_escape: false,
            last_comma: None,
        };

        let mut escaped = false;
        for (index, ch) in body.char_indices() {
            if scan.in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    scan.in_string = false;
                }
                continue;
            }

            match ch {
                '"' => scan.in_string = true,
                '{' => scan.closers.push('}'),
                '[' => scan.closers.push(']'),
                '}' | ']' => {
                    scan.closers.pop();
                }
                ',' => scan.last_comma = Some(index),
                _ => {}
            }
        }
        scan.dangling_escape = escaped;
        scan
    }

    fn close(&self, body: &str) -> String {
        let mut repaired = if self.dangling_escape {
            body[..body.len() - 1].to_string()
        } else {
            body.to_string()
        };
        if self.in_string {
            repaired.push('"');
        }
        repaired.extend(self.closers.iter().rev());
        repaired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaces_the_field_as_soon_as_it_parses() {
        let mut decoder = StructuredFieldDecoder::new("report");

        assert_eq!(decoder.push("{\"rep"), None);
        assert_eq!(decoder.push("ort\": \"Fí"), Some("Fí".to_string()));
        assert_eq!(decoder.push("gado\\"), Some("Fígado".to_string()));
        assert_eq!(
            decoder.push("n normal\", \"sev"),
            Some("Fígado\n normal".to_string())
        );
        assert_eq!(decoder.push("erity\": \"mild\"}"), None);
        assert_eq!(decoder.finish().expect("final"), "Fígado\n normal");
    }

    #[test]
    fn tolerates_markdown_code_fences() {
        let mut decoder = StructuredFieldDecoder::new("report");
        assert_eq!(
            decoder.push("```json\n{\"report\": \"ok\"}\n```"),
            Some("ok".to_string())
        );
        assert_eq!(decoder.finish().expect("final"), "ok");
    }

    #[test]
    fn unparseable_final_body_is_a_decode_error() {
        let mut decoder = StructuredFieldDecoder::new("report");
        decoder.push("not json at all");
        let error = decoder.finish().expect_err("decode failure");
        assert_eq!(error.kind, crate::ProviderErrorKind::Decode);
    }
}
