//! `text/event-stream` framing and decoding of job status payloads.

use bookgen_core::JobEvent;
use serde::Deserialize;
use url::Url;

/// Incremental SSE frame decoder. Feed raw body chunks in; get the joined
/// `data:` payload of every completed event out.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines may end in `\n`, `\r\n` or a lone `\r`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(payload) = self.process_line(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flushes a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(payload) = self.process_line(line.trim_end_matches('\r')) {
                return Some(payload);
            }
        }
        self.dispatch()
    }

    /// A `\r` at the end of the buffer is held back until the next chunk
    /// shows whether a `\n` follows it.
    fn next_line(&mut self) -> Option<String> {
        let pos = self
            .buffer
            .iter()
            .position(|byte| *byte == b'\n' || *byte == b'\r')?;
        let terminator = match (self.buffer[pos], self.buffer.get(pos + 1)) {
            (b'\r', Some(b'\n')) => 2,
            (b'\r', None) => return None,
            _ => 1,
        };
        let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
        self.buffer.drain(..pos + terminator);
        Some(line)
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    progress: Option<f64>,
    message: Option<String>,
    status: Option<String>,
    result_url: Option<String>,
    book_title: Option<String>,
    error: Option<String>,
}

/// Joins a backend-relative path onto the configured origin.
pub fn resolve_against_origin(origin: &Url, path: &str) -> Result<Url, url::ParseError> {
    if path.starts_with('/') {
        Url::parse(&format!("{}{}", origin.as_str().trim_end_matches('/'), path))
    } else {
        origin.join(path)
    }
}

/// Maps one `data:` payload to a typed event.
pub fn decode_event(payload: &str, origin: &Url) -> JobEvent {
    let wire: WireEvent = match serde_json::from_str(payload) {
        Ok(wire) => wire,
        Err(err) => {
            return JobEvent::StreamError {
                detail: format!("undecodable event: {err}"),
            }
        }
    };

    if let Some(error) = wire.error {
        return JobEvent::Failed {
            message: format!("Error: {error}"),
        };
    }

    let percent = wire
        .progress
        .filter(|value| value.is_finite())
        .map(|value| value.round().clamp(0.0, 100.0) as u8);

    match wire.status.as_deref() {
        Some("completed") => {
            let Some(result_url) = wire.result_url else {
                return JobEvent::StreamError {
                    detail: "completed event without result_url".to_string(),
                };
            };
            match resolve_against_origin(origin, &result_url) {
                Ok(result_location) => JobEvent::Completed {
                    result_location,
                    title: wire.book_title,
                    percent,
                    message: wire.message,
                },
                Err(err) => JobEvent::StreamError {
                    detail: format!("bad result_url {result_url:?}: {err}"),
                },
            }
        }
        Some("failed") => JobEvent::Failed {
            message: format!(
                "Generation failed: {}",
                wire.message.as_deref().unwrap_or("unknown error")
            ),
        },
        _ => JobEvent::Progress {
            percent,
            message: wire.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_multiline_data_and_skips_comments() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\ndata: {\"a\":\ndata: 1}\n\n");
        assert_eq!(payloads, vec!["{\"a\":\n1}".to_string()]);
    }

    #[test]
    fn frames_split_across_chunks_and_crlf() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"progress\"").is_empty());
        assert!(decoder.push(b": 20}\r\n").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec!["{\"progress\": 20}".to_string()]);
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let mut decoder = SseDecoder::new();
        assert_eq!(
            decoder.push(b"data: a\r\rdata: b\r"),
            vec!["a".to_string()]
        );
        assert_eq!(decoder.push(b"\rdata: c\r"), vec!["b".to_string()]);
        assert_eq!(decoder.finish(), Some("c".to_string()));
    }

    #[test]
    fn carriage_return_split_from_its_line_feed() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: x\r").is_empty());
        assert!(decoder.push(b"\ndata: y\r\n\r").is_empty());
        assert_eq!(decoder.push(b"\n"), vec!["x\ny".to_string()]);
    }

    #[test]
    fn finish_dispatches_after_trailing_carriage_return() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: z\r\r").is_empty());
        assert_eq!(decoder.finish(), Some("z".to_string()));
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: status\ndata: x").is_empty());
        assert_eq!(decoder.finish(), Some("x".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn origin_with_path_prefix_is_kept() {
        let origin = Url::parse("https://books.example.com/api").unwrap();
        let url = resolve_against_origin(&origin, "/files/abc.pdf").unwrap();
        assert_eq!(url.as_str(), "https://books.example.com/api/files/abc.pdf");
    }
}
