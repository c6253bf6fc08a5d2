//! Incremental body decoding for event-stream, JSON-lines and plain text bodies.
//!
//! JSON objects are mined for their text delta; anything else is forwarded
//! as received, whitespace included.

use serde_json::Value;

use super::serde_api::extract_text;
use super::types::BodyFormat;

#[derive(Debug)]
pub(crate) struct StreamDecoder {
    format: BodyFormat,
    pending_bytes: Vec<u8>,
    buffer: String,
}

impl StreamDecoder {
    pub(crate) fn new(format: BodyFormat) -> Self {
        Self {
            format,
            pending_bytes: Vec::new(),
            buffer: String::new(),
        }
    }

    /// Feeds raw body bytes and returns the text fragments they completed.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.decode_utf8(bytes);
        match self.format {
            BodyFormat::PlainText => {
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
            BodyFormat::EventStream => {
                self.buffer.push_str(&text);
                if self.buffer.contains('\r') {
                    self.buffer = self.buffer.replace("\r\n", "\n");
                }

                let mut fragments = Vec::new();
                while let Some(index) = self.buffer.find("\n\n") {
                    let block = self.buffer.drain(..index + 2).collect::<String>();
                    fragments.extend(parse_event_block(&block));
                }
                fragments
            }
            BodyFormat::JsonLines => {
                self.buffer.push_str(&text);

                let mut fragments = Vec::new();
                while let Some(index) = self.buffer.find('\n') {
                    let line = self.buffer.drain(..=index).collect::<String>();
                    fragments.extend(parse_json_line(&line));
                }
                fragments
            }
        }
    }

    /// Flushes whatever the body left behind once it ends.
    pub(crate) fn finish(&mut self) -> Vec<String> {
        let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
        self.pending_bytes.clear();

        match self.format {
            BodyFormat::PlainText => {
                if tail.is_empty() {
                    Vec::new()
                } else {
                    vec![tail]
                }
            }
            BodyFormat::EventStream => {
                self.buffer.push_str(&tail);
                let block = std::mem::take(&mut self.buffer);
                parse_event_block(&block).into_iter().collect()
            }
            BodyFormat::JsonLines => {
                self.buffer.push_str(&tail);
                let line = std::mem::take(&mut self.buffer);
                parse_json_line(&line).into_iter().collect()
            }
        }
    }

    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        self.pending_bytes.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending_bytes) {
            Ok(text) => {
                let text = text.to_string();
                self.pending_bytes.clear();
                text
            }
            // Incomplete multi-byte sequence at the end: hold it back for the next push.
            Err(err) if err.error_len().is_none() => {
                let valid = err.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending_bytes[..valid]).into_owned();
                self.pending_bytes.drain(..valid);
                text
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending_bytes).into_owned();
                self.pending_bytes.clear();
                text
            }
        }
    }
}

/// Joins the event's `data:` lines, dropping only the one space that may
/// follow the colon.
fn parse_event_block(block: &str) -> Option<String> {
    let lines = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect::<Vec<_>>();
    let data = lines.join("\n");
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let fragment = json_text(&data)
        .or_else(|| {
            // Several JSON events packed into one block.
            (lines.len() > 1)
                .then(|| lines.iter().map(|line| json_text(line)).collect::<Option<String>>())
                .flatten()
        })
        .unwrap_or(data);
    (!fragment.is_empty()).then_some(fragment)
}

fn parse_json_line(line: &str) -> Option<String> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return None;
    }

    let fragment = json_text(line).unwrap_or_else(|| line.to_string());
    (!fragment.is_empty()).then_some(fragment)
}

fn json_text(data: &str) -> Option<String> {
    serde_json::from_str::<Value>(data)
        .ok()
        .filter(Value::is_object)
        .map(|value| extract_text(&value))
}
