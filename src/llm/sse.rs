//! Incremental decoder for `text/event-stream` response bodies.

/// Buffers raw bytes and yields complete `data:` payloads.
///
/// Lines are only decoded once complete, so a multi-byte character split
/// across network chunks is reassembled before UTF-8 decoding.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push incoming bytes and extract complete `data:` payloads.
    ///
    /// Incomplete lines stay buffered for the next `push()` or `finish()`.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(payload) = data_payload(&String::from_utf8_lossy(&line)) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.buffer);
        String::from_utf8_lossy(&rest)
            .lines()
            .filter_map(data_payload)
            .collect()
    }
}

fn data_payload(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("data:")
        .map(|payload| payload.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_payloads_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        let payloads = decoder.push(b"1}\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn reassembles_multibyte_chars_split_across_chunks() {
        let frame = "data: {\"choices\":[{\"delta\":{\"content\":\"café 🔎\"}}]}\n\n".as_bytes();
        // Split right after the first byte of 'é' (0xC3 0xA9).
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&frame[..split]).is_empty());
        let payloads = decoder.push(&frame[split..]);

        assert_eq!(
            payloads,
            vec!["{\"choices\":[{\"delta\":{\"content\":\"café 🔎\"}}]}".to_string()]
        );
    }

    #[test]
    fn ignores_comments_and_event_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\nevent: chunk\ndata: x\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec!["tail".to_string()]);
        assert!(decoder.finish().is_empty());
    }
}
