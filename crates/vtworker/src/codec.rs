//! Streaming UTF-8 transcoding between bytes and code points.
//!
//! The input task decodes bytes read from a session into `char`s
//! before handing them to the terminal; the output task encodes the
//! terminal's type-ahead `char`s back into bytes before writing them
//! to the session. Both directions can see a multi-byte sequence
//! split across two read calls, so the decoder keeps a small pending
//! buffer between calls rather than requiring a full sequence in one
//! shot.

/// Decodes a byte stream into `char`s, carrying an incomplete
/// trailing sequence across calls.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    #[must_use]
    pub fn new() -> Self {
        Utf8Decoder::default()
    }

    /// Decode as many complete code points out of `input` as
    /// possible, appending them to `out`. A trailing partial sequence
    /// is retained and completed on the next call. An invalid lead or
    /// continuation byte is skipped, advancing by one byte, matching
    /// any conformant UTF-8 decoder's recovery behavior.
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<char>) {
        self.pending.extend_from_slice(input);
        let mut i = 0;
        let buf = &self.pending;
        while i < buf.len() {
            let b0 = buf[i];
            let len = utf8_len(b0);
            let Some(len) = len else {
                i += 1;
                continue;
            };
            if i + len > buf.len() {
                // Incomplete trailing sequence; wait for more bytes.
                break;
            }
            match decode_one(&buf[i..i + len]) {
                Some(ch) => {
                    out.push(ch);
                    i += len;
                }
                None => i += 1,
            }
        }
        self.pending.drain(..i);
    }
}

fn utf8_len(b0: u8) -> Option<usize> {
    if b0 & 0x80 == 0 {
        Some(1)
    } else if b0 & 0xe0 == 0xc0 {
        Some(2)
    } else if b0 & 0xf0 == 0xe0 {
        Some(3)
    } else if b0 & 0xf8 == 0xf0 {
        Some(4)
    } else {
        None
    }
}

fn decode_one(bytes: &[u8]) -> Option<char> {
    std::str::from_utf8(bytes).ok()?.chars().next()
}

/// Encode `chars` as UTF-8 bytes, appending to `out`.
pub fn encode(chars: &[char], out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    for &ch in chars {
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_ascii_in_one_call() {
        let mut d = Utf8Decoder::new();
        let mut out = Vec::new();
        d.decode(b"hello", &mut out);
        assert_eq!(out, vec!['h', 'e', 'l', 'l', 'o']);
    }

    #[test]
    fn resumes_a_sequence_split_across_calls() {
        let bytes = "\u{3042}".as_bytes().to_vec();
        let mut d = Utf8Decoder::new();
        let mut out = Vec::new();
        d.decode(&bytes[..1], &mut out);
        assert!(out.is_empty());
        d.decode(&bytes[1..], &mut out);
        assert_eq!(out, vec!['\u{3042}']);
    }

    #[test]
    fn skips_an_invalid_lead_byte() {
        let mut d = Utf8Decoder::new();
        let mut out = Vec::new();
        d.decode(&[0xff, b'a'], &mut out);
        assert_eq!(out, vec!['a']);
    }

    #[test]
    fn round_trips_through_encode() {
        let chars = vec!['a', '\u{3042}', '\u{1f600}'];
        let mut bytes = Vec::new();
        encode(&chars, &mut bytes);
        let mut d = Utf8Decoder::new();
        let mut out = Vec::new();
        d.decode(&bytes, &mut out);
        assert_eq!(out, chars);
    }
}
