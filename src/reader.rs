use std::io::Read;

use bytes::Bytes;

use crate::error::CodecError;

const BUF_SIZE: usize = 4096;

/// Blocking, buffered sequential byte source with one-level push-back.
///
/// Reading past end-of-data fails with [`CodecError::InsufficientData`];
/// decoders treat that as a syntax failure when it happens mid-structure.
pub struct ByteReader<R> {
    source: R,
    buf: Box<[u8]>,
    start: usize,
    end: usize,
}

impl<R: Read> ByteReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buf: vec![0; BUF_SIZE].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    fn refill(&mut self) -> Result<(), CodecError> {
        let read = self.source.read(&mut self.buf)?;
        if read == 0 {
            return Err(CodecError::InsufficientData);
        }
        self.start = 0;
        self.end = read;
        Ok(())
    }

    /// Next byte from the source.
    pub fn read_byte(&mut self) -> Result<u8, CodecError> {
        if self.start >= self.end {
            self.refill()?;
        }
        let byte = self.buf[self.start];
        self.start += 1;
        Ok(byte)
    }

    /// Push back the byte just read.
    ///
    /// Only one byte of push-back is held; calling this twice without an
    /// intervening read leaves the position unspecified.
    pub fn unread_byte(&mut self) {
        if self.start > 0 {
            self.start -= 1;
        }
    }

    /// Exactly `len` bytes; fails when fewer remain before end-of-data.
    pub fn read_exact(&mut self, len: usize) -> Result<Bytes, CodecError> {
        let mut out = Vec::with_capacity(len.min(BUF_SIZE));
        while out.len() < len {
            if self.start >= self.end {
                self.refill()?;
            }
            let take = (len - out.len()).min(self.end - self.start);
            out.extend_from_slice(&self.buf[self.start..self.start + take]);
            self.start += take;
        }
        Ok(Bytes::from(out))
    }
}

#[cfg(test)]
mod reader_tests {
    use super::*;

    #[test]
    fn reads_and_unreads_single_bytes() {
        let data = [1u8, 2, 3];
        let mut reader = ByteReader::new(&data[..]);
        assert_eq!(reader.read_byte().unwrap(), 1);
        assert_eq!(reader.read_byte().unwrap(), 2);
        reader.unread_byte();
        assert_eq!(reader.read_byte().unwrap(), 2);
        assert_eq!(reader.read_byte().unwrap(), 3);
        assert!(matches!(
            reader.read_byte(),
            Err(CodecError::InsufficientData)
        ));
    }

    #[test]
    fn exact_reads_cross_refills() {
        let data: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        let mut reader = ByteReader::new(&data[..]);
        assert_eq!(reader.read_byte().unwrap(), 0);
        let rest = reader.read_exact(9_999).unwrap();
        assert_eq!(rest.len(), 9_999);
        assert_eq!(rest[0], 1);
        assert_eq!(rest[9_998], (9_999u32) as u8);
    }

    #[test]
    fn exact_read_past_end_fails() {
        let data = [1u8, 2, 3];
        let mut reader = ByteReader::new(&data[..]);
        assert!(matches!(
            reader.read_exact(4),
            Err(CodecError::InsufficientData)
        ));
    }

    #[test]
    fn empty_exact_read_succeeds_at_end() {
        let mut reader = ByteReader::new(std::io::empty());
        assert_eq!(reader.read_exact(0).unwrap().len(), 0);
    }
}
