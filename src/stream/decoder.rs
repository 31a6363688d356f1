use log::{ debug, warn };

use crate::models::stream::{ StreamEvent, StreamRecord };

pub const DATA_PREFIX: &str = "data: ";

/// Reassembles newline-delimited lines from arbitrarily split reads.
///
/// Bytes are buffered raw and only decoded once a full line is available, so a
/// multi-byte character split across two reads comes out intact.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one read and returns every line it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.buf[start..end]));
            start = end + 1;
        }
        self.buf.drain(..start);
        lines
    }

    /// Hands back the unterminated tail, leaving the decoder empty.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let tail = decode_line(&self.buf);
        self.buf.clear();
        Some(tail)
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Parses one SSE line. Anything but a well-formed `data: {json}` line yields `None`;
/// malformed payloads are logged and skipped.
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<StreamRecord>(payload) {
        Ok(record) => record.into_event(),
        Err(e) => {
            warn!("Skipping malformed stream record: {} (data: {})", e, payload);
            None
        }
    }
}

/// Line-level view used by the ingestion loop.
pub fn events_from_lines(lines: Vec<String>) -> impl Iterator<Item = StreamEvent> {
    lines.into_iter().filter_map(|line| {
        if !line.is_empty() {
            debug!("SSE line: {}", line);
        }
        parse_line(&line)
    })
}
