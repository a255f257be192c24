//! Server-sent events framing.
//!
//! Bytes are buffered until a full line is available, so a multi-byte UTF-8
//! sequence split across network chunks is never decoded in halves.

use std::collections::VecDeque;

use crate::client::snippet;
use crate::wire::ChatCompletionChunk;
use crate::{BifrostError, Result};

/// Longest line accepted before the stream is treated as broken (4 MiB).
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Incremental SSE decoder yielding the `data` payload of each record.
///
/// Blank lines dispatch a record; `:` comment lines, `event:`, `id:`,
/// `retry:` and unknown fields carry nothing and are skipped. Several
/// `data:` lines in one record are joined with `\n`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, appending completed payloads to `out`.
    ///
    /// Payloads completed before an invalid or oversized line are still
    /// appended.
    pub fn feed(&mut self, bytes: &[u8], out: &mut VecDeque<String>) -> Result<()> {
        let mut rest = bytes;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.buffer(&rest[..pos])?;
            rest = &rest[pos + 1..];
            let line = std::mem::take(&mut self.line);
            if let Some(payload) = self.process_line(&line)? {
                out.push_back(payload);
            }
        }
        self.buffer(rest)
    }

    fn buffer(&mut self, bytes: &[u8]) -> Result<()> {
        if self.line.len() + bytes.len() > MAX_LINE_BYTES {
            self.line.clear();
            return Err(BifrostError::Protocol(format!(
                "stream line exceeds {MAX_LINE_BYTES} bytes without a newline"
            )));
        }
        self.line.extend_from_slice(bytes);
        Ok(())
    }

    /// End of input: an unterminated final record still counts.
    pub fn finish(&mut self) -> Result<Option<String>> {
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.process_line(&line)?;
        }
        Ok(self.data.take())
    }

    fn process_line(&mut self, raw: &[u8]) -> Result<Option<String>> {
        let line = std::str::from_utf8(raw).map_err(|e| {
            BifrostError::Protocol(format!("stream line is not valid UTF-8: {e}"))
        })?;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return Ok(self.data.take());
        }
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            }
        }
        Ok(None)
    }
}

/// Parse one record payload. `[DONE]` and empty payloads yield `None`.
pub fn parse_record(payload: &str) -> Result<Option<ChatCompletionChunk>> {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }
    serde_json::from_str(payload).map(Some).map_err(|e| {
        BifrostError::Protocol(format!(
            "malformed stream record: {e}; record: {}",
            snippet(payload)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(chunks: &[&[u8]]) -> Vec<String> {
        let mut decoder = SseDecoder::new();
        let mut out = VecDeque::new();
        for chunk in chunks {
            decoder.feed(chunk, &mut out).unwrap();
        }
        out.extend(decoder.finish().unwrap());
        out.into()
    }

    #[test]
    fn splits_records_on_blank_lines() {
        let records = decode(&[b"data: a\n\ndata: b\n\n"]);
        assert_eq!(records, vec!["a", "b"]);
    }

    #[test]
    fn skips_comments_and_other_fields() {
        let records = decode(&[b": keep-alive\nevent: message\nid: 7\nretry: 10\ndata: x\n\n"]);
        assert_eq!(records, vec!["x"]);
    }

    #[test]
    fn joins_multi_line_data_and_handles_crlf() {
        let records = decode(&[b"data: one\r\ndata: two\r\n\r\n"]);
        assert_eq!(records, vec!["one\ntwo"]);
    }

    #[test]
    fn utf8_split_across_chunks() {
        let bytes = "data: héllo\n\n".as_bytes();
        // Split inside the two-byte 'é'
        let split = 8;
        let records = decode(&[&bytes[..split], &bytes[split..]]);
        assert_eq!(records, vec!["héllo"]);
    }

    #[test]
    fn unterminated_final_record_is_flushed() {
        assert_eq!(decode(&[b"data: tail"]), vec!["tail"]);
    }

    #[test]
    fn invalid_utf8_line_is_protocol_error() {
        let mut decoder = SseDecoder::new();
        let mut out = VecDeque::new();
        let err = decoder.feed(b"data: ok\n\ndata: \xff\n", &mut out).unwrap_err();
        assert!(matches!(err, BifrostError::Protocol(_)));
        assert_eq!(out, vec!["ok".to_string()]);
    }

    #[test]
    fn endless_line_is_protocol_error() {
        let mut decoder = SseDecoder::new();
        let mut out = VecDeque::new();
        let block = vec![b'a'; 1024 * 1024];

        decoder.feed(b"data: ok\n\ndata: ", &mut out).unwrap();
        let mut result = Ok(());
        for _ in 0..5 {
            result = decoder.feed(&block, &mut out);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(BifrostError::Protocol(_))));
        assert_eq!(out, vec!["ok".to_string()]);
    }

    #[test]
    fn done_marker_and_bad_json() {
        assert!(parse_record("[DONE]").unwrap().is_none());
        assert!(matches!(
            parse_record("{not json"),
            Err(BifrostError::Protocol(_))
        ));
    }
}
