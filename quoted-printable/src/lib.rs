//! Quoted-printable byte-stream transform.
//!
//! An [`Encoding`] carries the current output line column across calls,
//! so a stream can be transformed through a fixed-size buffer: each step
//! reports how much was written and consumed, and a capacity shortage is
//! resumable from the reported source position.

use thiserror::Error;

/// Highest column a line may reach before a soft break is forced.
const LINE_LIMIT: usize = 75;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// Destination ran out of room; the value is the number of source
    /// bytes consumed so far, so the caller can resume from there.
    #[error("lack of capacity error at {0}")]
    CapacityShortage(usize),

    /// Source ends in the middle of an escape sequence.
    #[error("incomplete input error at {0}")]
    IncompleteInput(usize),

    /// Invalid escape digits, an illegal byte, or an overlong line.
    #[error("corrupt input error at {0}")]
    CorruptInput(usize),
}

enum Step {
    Done,
    Capacity,
    Incomplete,
    Corrupt,
}

/// Transform state: the column position inside the current line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Encoding {
    column: usize,
}

impl Encoding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `src` into `dst`, resetting the line state first. Returns
    /// the number of bytes written.
    pub fn encode(&mut self, dst: &mut [u8], src: &[u8]) -> Result<usize, TransformError> {
        self.column = 0;
        let (step, written, consumed) = self.encode_step(dst, src);
        match step {
            Step::Done => Ok(written),
            Step::Capacity => Err(TransformError::CapacityShortage(consumed)),
            Step::Incomplete => Err(TransformError::IncompleteInput(consumed)),
            Step::Corrupt => Err(TransformError::CorruptInput(consumed)),
        }
    }

    /// Decode `src` into `dst`, resetting the line state first. Returns
    /// the number of bytes written.
    pub fn decode(&mut self, dst: &mut [u8], src: &[u8]) -> Result<usize, TransformError> {
        self.column = 0;
        let (step, written, consumed) = self.decode_step(dst, src);
        match step {
            Step::Done => Ok(written),
            Step::Capacity => Err(TransformError::CapacityShortage(consumed)),
            Step::Incomplete => Err(TransformError::IncompleteInput(consumed)),
            Step::Corrupt => Err(TransformError::CorruptInput(consumed)),
        }
    }

    /// One pass over `src`; line state persists so the next call resumes
    /// mid-line. Returns (status, written, consumed).
    fn encode_step(&mut self, dst: &mut [u8], src: &[u8]) -> (Step, usize, usize) {
        let mut written = 0;
        let mut consumed = 0;
        while consumed < src.len() {
            let byte = src[consumed];
            if printable(byte) {
                if self.column >= LINE_LIMIT {
                    if written + 2 >= dst.len() {
                        return (Step::Capacity, written, consumed);
                    }
                    dst[written..written + 3].copy_from_slice(b"=\r\n");
                    written += 3;
                    self.column = 0;
                }
                if written >= dst.len() {
                    return (Step::Capacity, written, consumed);
                }
                dst[written] = byte;
                written += 1;
                self.column += 1;
            } else {
                // An escape is three columns wide; break two columns
                // earlier than for a literal.
                if self.column >= LINE_LIMIT - 2 {
                    if written + 2 >= dst.len() {
                        return (Step::Capacity, written, consumed);
                    }
                    dst[written..written + 3].copy_from_slice(b"=\r\n");
                    written += 3;
                    self.column = 0;
                }
                if written + 2 >= dst.len() {
                    return (Step::Capacity, written, consumed);
                }
                dst[written] = b'=';
                dst[written + 1] = hex_digit(byte >> 4);
                dst[written + 2] = hex_digit(byte & 15);
                written += 3;
                self.column += 3;
            }
            consumed += 1;
        }
        (Step::Done, written, consumed)
    }

    fn decode_step(&mut self, dst: &mut [u8], src: &[u8]) -> (Step, usize, usize) {
        let mut written = 0;
        let mut consumed = 0;
        while consumed < src.len() {
            let byte = src[consumed];
            let decoded;
            let width;
            if byte == b'=' {
                if consumed + 2 >= src.len() {
                    return (Step::Incomplete, written, consumed);
                }
                let (hi, lo) = (src[consumed + 1], src[consumed + 2]);
                if hi == b'\r' && lo == b'\n' {
                    consumed += 3;
                    self.column = 0;
                    continue;
                }
                if self.column + 3 > LINE_LIMIT {
                    return (Step::Corrupt, written, consumed);
                }
                let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) else {
                    return (Step::Corrupt, written, consumed);
                };
                decoded = (hi << 4) | lo;
                width = 3;
            } else if matches!(byte, 9..=60 | 62..=126) {
                if self.column + 1 > LINE_LIMIT {
                    return (Step::Corrupt, written, consumed);
                }
                decoded = byte;
                width = 1;
            } else {
                return (Step::Corrupt, written, consumed);
            }
            if written >= dst.len() {
                return (Step::Capacity, written, consumed);
            }
            dst[written] = decoded;
            written += 1;
            self.column += width;
            consumed += width;
        }
        (Step::Done, written, consumed)
    }
}

fn printable(byte: u8) -> bool {
    matches!(byte, 33..=60 | 62..=126)
}

fn hex_digit(nibble: u8) -> u8 {
    if nibble < 10 {
        nibble + b'0'
    } else {
        nibble + (b'A' - 10)
    }
}

/// Uppercase hex only; lowercase digits are corrupt input.
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - (b'A' - 10)),
        _ => None,
    }
}

/// Encode into a fresh buffer.
pub fn encode_to_vec(src: &[u8]) -> Vec<u8> {
    // Worst case is an escape plus a soft break per input byte.
    let mut dst = vec![0; src.len() * 6 + 3];
    let mut encoding = Encoding::new();
    let written = encoding
        .encode(&mut dst, src)
        .expect("sized for the worst case");
    dst.truncate(written);
    dst
}

/// Decode into a fresh buffer.
pub fn decode_to_vec(src: &[u8]) -> Result<Vec<u8>, TransformError> {
    let mut dst = vec![0; src.len()];
    let mut encoding = Encoding::new();
    let written = encoding.decode(&mut dst, src)?;
    dst.truncate(written);
    Ok(dst)
}

#[cfg(test)]
mod qp_tests {
    use super::*;

    #[test]
    fn printable_bytes_pass_through() {
        assert_eq!(encode_to_vec(b"hello"), b"hello");
        assert_eq!(decode_to_vec(b"hello").unwrap(), b"hello");
    }

    #[test]
    fn reserved_and_control_bytes_are_escaped() {
        assert_eq!(encode_to_vec(b"a=b\x00 "), b"a=3Db=00=20");
        assert_eq!(decode_to_vec(b"a=3Db=00=20").unwrap(), b"a=b\x00 ");
    }

    #[test]
    fn soft_break_keeps_lines_within_the_limit() {
        let long = vec![b'a'; 80];
        let encoded = encode_to_vec(&long);
        let mut expected = vec![b'a'; 75];
        expected.extend_from_slice(b"=\r\n");
        expected.extend_from_slice(&[b'a'; 5]);
        assert_eq!(encoded, expected);
        assert_eq!(decode_to_vec(&encoded).unwrap(), long);
    }

    #[test]
    fn escapes_break_earlier_than_literals() {
        // 74 literals leave no room for a three-column escape.
        let mut src = vec![b'a'; 74];
        src.push(0x01);
        let encoded = encode_to_vec(&src);
        let mut expected = vec![b'a'; 74];
        expected.extend_from_slice(b"=\r\n=01");
        assert_eq!(encoded, expected);
        assert_eq!(decode_to_vec(&encoded).unwrap(), src);
    }

    #[test]
    fn lowercase_hex_is_corrupt() {
        assert_eq!(
            decode_to_vec(b"=3d"),
            Err(TransformError::CorruptInput(0))
        );
    }

    #[test]
    fn truncated_escape_is_incomplete() {
        assert_eq!(
            decode_to_vec(b"ab=4"),
            Err(TransformError::IncompleteInput(2))
        );
    }

    #[test]
    fn capacity_shortage_reports_resume_position() {
        let mut encoding = Encoding::new();
        let mut small = [0u8; 4];
        let err = encoding.encode(&mut small, b"abcdefgh").unwrap_err();
        assert_eq!(err, TransformError::CapacityShortage(4));

        // The step form resumes where the first pass stopped.
        let mut rest = [0u8; 8];
        let (_, written, consumed) = encoding.encode_step(&mut rest, &b"abcdefgh"[4..]);
        assert_eq!(&rest[..written], b"efgh");
        assert_eq!(consumed, 4);
    }

    #[test]
    fn overlong_decoded_line_is_corrupt() {
        let long = vec![b'x'; 77];
        assert_eq!(
            decode_to_vec(&long),
            Err(TransformError::CorruptInput(75))
        );
    }
}
