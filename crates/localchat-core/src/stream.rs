//! Incremental decoding of the streaming chat endpoint.
//!
//! The backend answers `POST /chat/stream` either with server-sent events
//! (`data: <fragment>` lines terminated by `data: [DONE]`) or with raw
//! chunked text. Network chunks can split both UTF-8 sequences and SSE
//! lines, so decoding is stateful across calls to [`FragmentDecoder::push`].

const SSE_PREFIX: &str = "data:";
const SSE_DONE: &str = "[DONE]";

/// Stateful UTF-8 decoder that tolerates sequences split across chunks.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` as possible.
    ///
    /// An incomplete sequence at the end is held back until the next call.
    /// Invalid sequences decode to U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut input: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&input[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &input[valid + len..];
                        }
                        None => {
                            input = &input[valid..];
                            break;
                        }
                    }
                }
            }
        }

        let rest = input.to_vec();
        self.pending = rest;
        out
    }

    /// Flush whatever is held back, replacing a truncated sequence.
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

/// How the response body is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `data:` lines, terminated by `[DONE]`.
    Sse,
    /// Plain chunked text; every piece is a fragment.
    Raw,
}

/// Fragments produced by one decoding step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub fragments: Vec<String>,
    /// The `[DONE]` terminator has been seen. Nothing after it is yielded.
    pub done: bool,
}

/// Turns response body chunks into text fragments.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    utf8: Utf8Decoder,
    framing: Option<Framing>,
    buffer: String,
    done: bool,
}

impl FragmentDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Framing detected so far, if enough text has arrived.
    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk of the response body.
    pub fn push(&mut self, bytes: &[u8]) -> Decoded {
        if self.done {
            return self.decoded(Vec::new());
        }
        let text = self.utf8.decode(bytes);
        let mut fragments = Vec::new();
        self.feed(text, &mut fragments);
        self.decoded(fragments)
    }

    /// Signal end of body and flush anything still buffered.
    pub fn finish(&mut self) -> Decoded {
        if self.done {
            return self.decoded(Vec::new());
        }
        let mut fragments = Vec::new();
        let tail = self.utf8.finish();
        self.feed(tail, &mut fragments);

        let rest = std::mem::take(&mut self.buffer);
        match self.framing {
            Some(Framing::Sse) => {
                let line = rest.strip_suffix('\r').unwrap_or(&rest);
                self.handle_line(line, &mut fragments);
            }
            // Undecided text at end of body is too short to be an SSE line.
            Some(Framing::Raw) | None => {
                if !rest.is_empty() {
                    fragments.push(rest);
                }
            }
        }
        self.done = true;
        self.decoded(fragments)
    }

    fn decoded(&self, fragments: Vec<String>) -> Decoded {
        Decoded {
            fragments,
            done: self.done,
        }
    }

    fn feed(&mut self, text: String, fragments: &mut Vec<String>) {
        if text.is_empty() {
            return;
        }
        match self.framing {
            Some(Framing::Raw) => fragments.push(text),
            Some(Framing::Sse) => {
                self.buffer.push_str(&text);
                self.drain_lines(fragments);
            }
            None => {
                self.buffer.push_str(&text);
                if self.buffer.len() < SSE_PREFIX.len() && SSE_PREFIX.starts_with(&self.buffer) {
                    return;
                }
                if self.buffer.starts_with(SSE_PREFIX) {
                    self.framing = Some(Framing::Sse);
                    self.drain_lines(fragments);
                } else {
                    self.framing = Some(Framing::Raw);
                    fragments.push(std::mem::take(&mut self.buffer));
                }
            }
        }
    }

    fn drain_lines(&mut self, fragments: &mut Vec<String>) {
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches('\n');
            let line = line.strip_suffix('\r').unwrap_or(line);
            self.handle_line(line, fragments);
            if self.done {
                self.buffer.clear();
                return;
            }
        }
    }

    fn handle_line(&mut self, line: &str, fragments: &mut Vec<String>) {
        let Some(payload) = sse_payload(line) else {
            return;
        };
        if payload == SSE_DONE {
            self.done = true;
        } else if !payload.is_empty() {
            fragments.push(payload.to_string());
        }
    }
}

/// Payload of a `data:` line, without the prefix and one optional space.
fn sse_payload(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(SSE_PREFIX)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(decoder: &mut FragmentDecoder, chunks: &[&[u8]]) -> (Vec<String>, bool) {
        let mut out = Vec::new();
        for chunk in chunks {
            let decoded = decoder.push(chunk);
            out.extend(decoded.fragments);
            if decoded.done {
                return (out, true);
            }
        }
        let decoded = decoder.finish();
        out.extend(decoded.fragments);
        (out, false)
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut decoder = Utf8Decoder::new();
        let bytes = "héllo".as_bytes();
        assert_eq!(decoder.decode(&bytes[..2]), "h");
        assert_eq!(decoder.decode(&bytes[2..]), "éllo");
    }

    #[test]
    fn test_utf8_invalid_bytes_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_utf8_truncated_tail_flushed_on_finish() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_sse_fragments_until_done() {
        let mut decoder = FragmentDecoder::new();
        let (fragments, done) = collect(
            &mut decoder,
            &[b"data: Hel", b"lo\n\ndata: wor", b"ld\n\ndata: [DONE]\n\ndata: late\n\n"],
        );
        assert_eq!(fragments, ["Hello", "world"]);
        assert!(done);
        assert_eq!(decoder.framing(), Some(Framing::Sse));
        assert!(decoder.push(b"data: more\n").fragments.is_empty());
    }

    #[test]
    fn test_sse_ignores_other_lines_and_crlf() {
        let mut decoder = FragmentDecoder::new();
        let (fragments, _) = collect(
            &mut decoder,
            &[b"data:a\r\n: comment\r\nevent: x\r\ndata: b\r\n\r\n"],
        );
        assert_eq!(fragments, ["a", "b"]);
    }

    #[test]
    fn test_sse_keeps_inner_spaces() {
        let mut decoder = FragmentDecoder::new();
        let (fragments, _) = collect(&mut decoder, &[b"data:  two spaces\n"]);
        assert_eq!(fragments, [" two spaces"]);
    }

    #[test]
    fn test_sse_prefix_split_waits_for_decision() {
        let mut decoder = FragmentDecoder::new();
        assert!(decoder.push(b"da").fragments.is_empty());
        assert_eq!(decoder.framing(), None);
        let decoded = decoder.push(b"ta: x\n");
        assert_eq!(decoded.fragments, ["x"]);
        assert_eq!(decoder.framing(), Some(Framing::Sse));
    }

    #[test]
    fn test_sse_partial_line_flushed_on_finish() {
        let mut decoder = FragmentDecoder::new();
        let (fragments, done) = collect(&mut decoder, &[b"data: a\ndata: tail"]);
        assert_eq!(fragments, ["a", "tail"]);
        assert!(!done);
    }

    #[test]
    fn test_raw_text_yields_chunks_verbatim() {
        let mut decoder = FragmentDecoder::new();
        let (fragments, done) = collect(&mut decoder, &[b"Hello", b", ", b"world\n"]);
        assert_eq!(fragments, ["Hello", ", ", "world\n"]);
        assert!(!done);
        assert_eq!(decoder.framing(), Some(Framing::Raw));
    }

    #[test]
    fn test_raw_text_that_starts_like_prefix() {
        let mut decoder = FragmentDecoder::new();
        let (fragments, _) = collect(&mut decoder, &[b"d", b"og"]);
        assert_eq!(fragments.concat(), "dog");
        assert_eq!(decoder.framing(), Some(Framing::Raw));
    }

    #[test]
    fn test_raw_multibyte_split() {
        let mut decoder = FragmentDecoder::new();
        let bytes = "¡hola!".as_bytes();
        let (fragments, _) = collect(&mut decoder, &[&bytes[..1], &bytes[1..]]);
        assert_eq!(fragments.concat(), "¡hola!");
    }

    #[test]
    fn test_short_undecided_body_flushed() {
        let mut decoder = FragmentDecoder::new();
        let (fragments, _) = collect(&mut decoder, &[b"da"]);
        assert_eq!(fragments, ["da"]);
    }
}
