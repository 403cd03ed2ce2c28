//! Frame splitter for the backend's `multipart/x-mixed-replace` live
//! feed. The wire format is `--frame\r\n` followed by part headers, a
//! blank line, the JPEG bytes, and `\r\n` before the next boundary.

use futures::{stream, Stream, StreamExt};

/// Boundary token the backend declares in its stream content type.
pub const FRAME_BOUNDARY: &str = "frame";

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Incremental splitter: feed it raw chunks in arrival order and it
/// emits every complete frame body. Holds back partial frames until the
/// next boundary arrives, so chunk boundaries can land anywhere.
#[derive(Debug)]
pub struct FrameSplitter {
    buf: Vec<u8>,
    delimiter: Vec<u8>,
}

impl FrameSplitter {
    pub fn new(boundary: &str) -> Self {
        Self {
            buf: Vec::new(),
            delimiter: format!("--{boundary}").into_bytes(),
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        loop {
            let Some(start) = find(&self.buf, &self.delimiter) else {
                break;
            };
            let part_start = start + self.delimiter.len();
            let Some(part_len) = find(&self.buf[part_start..], &self.delimiter) else {
                break;
            };
            if let Some(body) = part_body(&self.buf[part_start..part_start + part_len]) {
                frames.push(body);
            }
            // Keep the trailing delimiter: it opens the next part.
            self.buf.drain(..part_start + part_len);
        }
        frames
    }
}

/// Strips the part headers and the trailing CRLF, leaving the JPEG body.
fn part_body(part: &[u8]) -> Option<Vec<u8>> {
    let headers_end = find(part, HEADER_TERMINATOR)?;
    let body = &part[headers_end + HEADER_TERMINATOR.len()..];
    let body = body.strip_suffix(b"\r\n").unwrap_or(body);
    (!body.is_empty()).then(|| body.to_vec())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Adapts a raw byte-chunk stream into a stream of JPEG frames. Errors
/// from the underlying transport pass through unchanged.
pub fn frames<S, B, E>(chunks: S) -> impl Stream<Item = Result<Vec<u8>, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut splitter = FrameSplitter::new(FRAME_BOUNDARY);
    chunks.flat_map(move |chunk| match chunk {
        Ok(bytes) => {
            let complete: Vec<Result<Vec<u8>, E>> =
                splitter.push(bytes.as_ref()).into_iter().map(Ok).collect();
            stream::iter(complete)
        }
        Err(err) => stream::iter(vec![Err(err)]),
    })
}
