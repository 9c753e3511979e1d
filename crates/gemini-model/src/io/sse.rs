use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field carries payload; `event`, `id`, `retry` and
/// comment lines are accepted and dropped.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Bytes are buffered undecoded, since a chunk may end in the
            // middle of a multi-byte character.
            let mut has_more_data = false;
            if let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            {
                self.buf.extend_from_slice(&bytes);
                has_more_data = true;
            }

            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            // Abort if no more data available.
            if !has_more_data {
                return Ok(None);
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // event         = *( comment / field ) end-of-line
            // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
            // end-of-line   = ( cr lf / lf )
            let Some((end, sep_len)) = find_event_end(&self.buf) else {
                return Ok(None);
            };
            let Ok(block) = str::from_utf8(&self.buf[..end]) else {
                return Err(Error::InvalidPayload);
            };

            let mut data: Option<String> = None;
            for line in block.split('\n') {
                let line = line.strip_suffix('\r').unwrap_or(line);
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => {
                        (name, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match name {
                    "data" => {
                        let data = data.get_or_insert_default();
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    "event" | "id" | "retry" => {}
                    _ => return Err(Error::InvalidPayload),
                }
            }

            // Consume the bytes from the buffer.
            self.buf.drain(..end + sep_len);

            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}

/// Finds the blank line that terminates the first event in `buf`.
///
/// Returns where the blank line starts and its length. Lines may end in
/// either LF or CRLF, independently of each other.
fn find_event_end(buf: &[u8]) -> Option<(usize, usize)> {
    let mut line_start = 0;
    for (idx, byte) in buf.iter().enumerate() {
        if *byte != b'\n' {
            continue;
        }
        let line = &buf[line_start..idx];
        if line.is_empty() || line == b"\r" {
            return Some((line_start, idx + 1 - line_start));
        }
        line_start = idx + 1;
    }
    None
}
